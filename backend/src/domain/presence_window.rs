//! Time-decay classification of presence signals.
//!
//! Pure and stateless: the state of a visit is re-derived from its
//! immutable `signal_time` against wall-clock time on every read, and is
//! never persisted.

use chrono::{DateTime, Utc};
use shared::PresenceState;

/// Visits this old (in whole minutes) are expired and excluded from every
/// active view, regardless of the `ended` flag.
pub const EXPIRY_MINUTES: i64 = 60;

/// Visits at least this old are flagged as about to expire.
pub const EXPIRING_MINUTES: i64 = 45;

/// Whole minutes elapsed between the signal and `now`.
pub fn age_minutes(signal_time: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - signal_time).num_minutes()
}

/// Classify a visit's age into Active / Expiring / Expired.
pub fn classify(signal_time: DateTime<Utc>, now: DateTime<Utc>) -> PresenceState {
    let age = age_minutes(signal_time, now);
    if age >= EXPIRY_MINUTES {
        PresenceState::Expired
    } else if age >= EXPIRING_MINUTES {
        PresenceState::Expiring
    } else {
        PresenceState::Active
    }
}
