//! The group-wide "who's here now" view.
//!
//! Recomputed fresh from the persisted visit set on every poll; nothing
//! here is cached or pushed. Grouping is by the literal canonical string
//! each visit carries - two differently-spelled visits stay separate at
//! display time even if the resolver would canonicalize them together
//! today, because canonicalization only happens at write time.

use std::sync::Arc;

use crate::domain::clock::Clock;
use crate::domain::error::{ServiceError, ServiceResult};
use crate::domain::presence_window::{age_minutes, classify};
use shared::{PlaygroundPresence, PresenceState, PresenceViewResponse, RecentPlaygroundsResponse, VisitView};
use crate::storage::traits::{MembershipStore, VisitStore};

/// Computes presence views over the persisted visit set.
#[derive(Clone)]
pub struct PresenceService {
    visits: Arc<dyn VisitStore>,
    memberships: Arc<dyn MembershipStore>,
    clock: Arc<dyn Clock>,
}

impl PresenceService {
    pub fn new(
        visits: Arc<dyn VisitStore>,
        memberships: Arc<dyn MembershipStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            visits,
            memberships,
            clock,
        }
    }

    /// The current view for a group: non-ended, non-expired visits
    /// grouped by playground name, most recently signalled playground
    /// first. Always produces a view - stale or duplicated data renders,
    /// it never fails the whole read.
    pub async fn compute_view(
        &self,
        group_id: &str,
        handle: &str,
    ) -> ServiceResult<PresenceViewResponse> {
        self.require_membership(group_id, handle).await?;

        let all_visits = self.visits.list_visits_for_group(group_id).await?;
        let now = self.clock.now();

        let mut playgrounds: Vec<PlaygroundPresence> = Vec::new();
        let mut total_active = 0;

        for visit in all_visits {
            if visit.ended {
                continue;
            }
            let state = classify(visit.signal_time, now);
            if state == PresenceState::Expired {
                continue;
            }

            total_active += 1;
            let view = VisitView {
                minutes_ago: age_minutes(visit.signal_time, now),
                state,
                visit,
            };

            // Group by the literal playground_name string, preserving
            // fetch order within each group
            match playgrounds
                .iter_mut()
                .find(|p| p.playground_name == view.visit.playground_name)
            {
                Some(group) => {
                    if view.visit.signal_time > group.last_signal_time {
                        group.last_signal_time = view.visit.signal_time;
                    }
                    group.visits.push(view);
                }
                None => playgrounds.push(PlaygroundPresence {
                    playground_name: view.visit.playground_name.clone(),
                    last_signal_time: view.visit.signal_time,
                    visits: vec![view],
                }),
            }
        }

        // Most recently signalled playground first; the sort is stable so
        // equal timestamps keep their fetch order
        playgrounds.sort_by(|a, b| b.last_signal_time.cmp(&a.last_signal_time));

        Ok(PresenceViewResponse {
            playgrounds,
            total_active,
        })
    }

    /// Every playground name ever recorded in the group, ended and
    /// expired visits included, deduplicated in first-seen order. For
    /// autocomplete only - this is not an input to canonicalization.
    pub async fn recent_names(
        &self,
        group_id: &str,
        handle: &str,
    ) -> ServiceResult<RecentPlaygroundsResponse> {
        self.require_membership(group_id, handle).await?;

        let all_visits = self.visits.list_visits_for_group(group_id).await?;

        let mut names: Vec<String> = Vec::new();
        for visit in all_visits {
            if !names.contains(&visit.playground_name) {
                names.push(visit.playground_name);
            }
        }

        Ok(RecentPlaygroundsResponse { names })
    }

    async fn require_membership(&self, group_id: &str, handle: &str) -> ServiceResult<()> {
        match self.memberships.get_membership(group_id, handle).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotMember),
        }
    }
}
