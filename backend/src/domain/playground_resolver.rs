//! Resolves free-text playground names to canonical per-group identities.
//!
//! Canonicalization happens at write time only: a visit records the
//! canonical string this resolver returns, and the presence view later
//! groups by that literal string without re-resolving.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::error::ServiceResult;
use crate::domain::normalizer::normalize;
use crate::domain::similarity::similarity;
use crate::storage::traits::PlaygroundStore;
use shared::Playground;

/// Minimum bigram similarity for an existing canonical name to absorb a
/// newly typed variant.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Maps raw text to a canonical playground name within a group, creating
/// a new canonical record on first sight.
#[derive(Clone)]
pub struct PlaygroundResolver {
    playgrounds: Arc<dyn PlaygroundStore>,
    clock: Arc<dyn Clock>,
}

impl PlaygroundResolver {
    pub fn new(playgrounds: Arc<dyn PlaygroundStore>, clock: Arc<dyn Clock>) -> Self {
        Self { playgrounds, clock }
    }

    /// Find or create the canonical playground record for `raw_text` and
    /// return the canonical name to use.
    ///
    /// Matching is case-insensitive; below the exact tier, the *first*
    /// record at or above the similarity threshold in fetch order wins,
    /// not the best-scoring one. Two concurrent calls for near-duplicate
    /// new names can each create a record; that duplication degrades
    /// grouping quality but never corrupts data, so it is accepted here
    /// rather than closed with locking.
    pub async fn resolve(&self, raw_text: &str, group_id: &str) -> ServiceResult<String> {
        let cleaned = normalize(raw_text);
        if cleaned.is_empty() {
            // Nothing usable to match on; hand the raw text back without
            // touching storage
            return Ok(raw_text.to_string());
        }

        let existing = self.playgrounds.list_playgrounds_for_group(group_id).await?;
        let cleaned_lower = cleaned.to_lowercase();

        if let Some(exact) = existing
            .iter()
            .find(|p| p.canonical_name.to_lowercase() == cleaned_lower)
        {
            return Ok(exact.canonical_name.clone());
        }

        if let Some(similar) = existing.iter().find(|p| {
            similarity(&p.canonical_name.to_lowercase(), &cleaned_lower) >= SIMILARITY_THRESHOLD
        }) {
            return Ok(similar.canonical_name.clone());
        }

        let playground = Playground {
            id: format!("playground::{}", Uuid::new_v4()),
            group_id: group_id.to_string(),
            canonical_name: cleaned.clone(),
            raw_text: raw_text.to_string(),
            created_at: self.clock.now(),
        };
        self.playgrounds.store_playground(&playground).await?;

        info!(
            "Created canonical playground {:?} in group {}",
            cleaned, group_id
        );

        Ok(cleaned)
    }
}
