//! Normalizes raw playground name input.
//!
//! Users type things like "בגן השקד" or "לגינה הגדולה"; the leading Hebrew
//! preposition says where they are going, not what the place is called, so
//! it is stripped before any matching happens.

/// Leading prepositions/determiners to strip, longest first. Only the
/// full "in/to the garden" words and the bare clitics are listed: a name
/// that itself starts with "גן" or "גינה" must survive normalization
/// untouched, otherwise "גן השקד" and "השקד" would drift apart.
const PREFIXES: [&str; 5] = ["בגינה", "לגינה", "הגינה", "ב", "ל"];

/// Strip at most one leading preposition from a raw playground name.
///
/// Idempotent for expected inputs: the stripped result never starts with
/// another strippable prefix in practice.
pub fn normalize(raw: &str) -> String {
    let mut name = raw.trim();

    for prefix in PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            name = rest.trim_start();
            break;
        }
    }

    name.trim().to_string()
}
