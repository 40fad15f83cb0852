//! Visit lifecycle: signalling presence, changing playground, ending a
//! visit.
//!
//! Per (group, user) the conceptual state machine is None -> Active ->
//! None. Ending the prior visit and creating the next one are two
//! independent writes with no transaction around them; a failure in
//! between surfaces as [`ServiceError::PartialWrite`] and the read paths
//! tolerate the resulting duplicate-active state.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::error::{ServiceError, ServiceResult};
use crate::domain::playground_resolver::PlaygroundResolver;
use crate::domain::presence_window::{age_minutes, classify};
use shared::{
    PlaygroundVisit, PresenceState, SignalPresenceRequest, UserIdentity, VisitResponse, VisitView,
};
use crate::storage::traits::{ChildStore, MembershipStore, VisitStore};

/// Service owning the per-user visit lifecycle within a group.
#[derive(Clone)]
pub struct VisitService {
    visits: Arc<dyn VisitStore>,
    children: Arc<dyn ChildStore>,
    memberships: Arc<dyn MembershipStore>,
    resolver: PlaygroundResolver,
    clock: Arc<dyn Clock>,
}

impl VisitService {
    pub fn new(
        visits: Arc<dyn VisitStore>,
        children: Arc<dyn ChildStore>,
        memberships: Arc<dyn MembershipStore>,
        resolver: PlaygroundResolver,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            visits,
            children,
            memberships,
            resolver,
            clock,
        }
    }

    /// Report presence at a playground.
    ///
    /// Ends any currently active visit of the caller first (a separate
    /// write), then creates the new visit with the canonical playground
    /// name and a frozen snapshot of the selected children.
    pub async fn signal(
        &self,
        group_id: &str,
        identity: &UserIdentity,
        request: SignalPresenceRequest,
    ) -> ServiceResult<VisitResponse> {
        if request.playground_name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Playground name cannot be empty".to_string(),
            ));
        }

        self.require_membership(group_id, &identity.handle).await?;

        // End the prior active visit first. If anything after this write
        // fails we report a partial write and leave the end in place.
        let mut ended_prior = false;
        if let Some(active) = self.find_active_visit(group_id, &identity.handle).await? {
            self.visits.mark_visit_ended(&active.id).await?;
            ended_prior = true;
            info!(
                "Ended prior visit {} at {:?} for {}",
                active.id, active.playground_name, identity.handle
            );
        }

        let canonical_name = match self
            .resolver
            .resolve(&request.playground_name, group_id)
            .await
        {
            Ok(name) => name,
            Err(e) if ended_prior => {
                return Err(ServiceError::PartialWrite {
                    source: anyhow::Error::new(e),
                })
            }
            Err(e) => return Err(e),
        };

        let visit = PlaygroundVisit {
            id: format!("visit::{}", Uuid::new_v4()),
            group_id: group_id.to_string(),
            parent_handle: identity.handle.clone(),
            parent_name: identity.display_name.clone(),
            playground_name: canonical_name,
            children_names: Vec::new(),
            children_ages: Vec::new(),
            signal_time: self.clock.now(),
            ended: false,
        };
        let visit = self
            .snapshot_children(visit, &identity.handle, &request.child_ids)
            .await
            .map_err(|e| {
                if ended_prior {
                    ServiceError::PartialWrite { source: e }
                } else {
                    ServiceError::Storage(e)
                }
            })?;

        if let Err(e) = self.visits.store_visit(&visit).await {
            if ended_prior {
                return Err(ServiceError::PartialWrite { source: e });
            }
            return Err(e.into());
        }

        info!(
            "Created visit {} at {:?} for {} with {} children",
            visit.id,
            visit.playground_name,
            identity.handle,
            visit.children_names.len()
        );

        Ok(VisitResponse {
            visit,
            success_message: "Presence signalled".to_string(),
        })
    }

    /// User-facing alias for switching playgrounds: equivalent to ending
    /// the current visit and signalling the new one, which is exactly
    /// what `signal` does.
    pub async fn change_playground(
        &self,
        group_id: &str,
        identity: &UserIdentity,
        request: SignalPresenceRequest,
    ) -> ServiceResult<VisitResponse> {
        self.signal(group_id, identity, request).await
    }

    /// End the caller's current active visit. No-op when there is none.
    pub async fn end_visit(
        &self,
        group_id: &str,
        handle: &str,
    ) -> ServiceResult<Option<PlaygroundVisit>> {
        let Some(active) = self.find_active_visit(group_id, handle).await? else {
            return Ok(None);
        };

        self.visits.mark_visit_ended(&active.id).await?;
        info!(
            "Ended visit {} at {:?} for {}",
            active.id, active.playground_name, handle
        );

        Ok(Some(active))
    }

    /// The caller's current active visit, decorated with its time-decay
    /// state, or None.
    pub async fn my_active_visit(
        &self,
        group_id: &str,
        handle: &str,
    ) -> ServiceResult<Option<VisitView>> {
        let now = self.clock.now();
        Ok(self.find_active_visit(group_id, handle).await?.map(|visit| {
            let state = classify(visit.signal_time, now);
            let minutes_ago = age_minutes(visit.signal_time, now);
            VisitView {
                visit,
                state,
                minutes_ago,
            }
        }))
    }

    /// First non-ended, non-expired visit of this user in fetch order.
    ///
    /// More than one such visit can exist when a prior end-then-create
    /// sequence was interrupted; picking the first is the documented
    /// defensive behavior, not an invariant.
    async fn find_active_visit(
        &self,
        group_id: &str,
        handle: &str,
    ) -> ServiceResult<Option<PlaygroundVisit>> {
        let now = self.clock.now();
        let mine = self.visits.list_visits_for_parent(group_id, handle).await?;

        let active: Vec<PlaygroundVisit> = mine
            .into_iter()
            .filter(|v| !v.ended && classify(v.signal_time, now) != PresenceState::Expired)
            .collect();

        if active.len() > 1 {
            warn!(
                "{} has {} concurrently active visits in group {}; using the first",
                handle,
                active.len(),
                group_id
            );
        }

        Ok(active.into_iter().next())
    }

    async fn require_membership(&self, group_id: &str, handle: &str) -> ServiceResult<()> {
        match self.memberships.get_membership(group_id, handle).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotMember),
        }
    }

    /// Freeze the names and ages of the caller's selected children onto
    /// the visit. IDs that don't belong to the caller are ignored.
    async fn snapshot_children(
        &self,
        mut visit: PlaygroundVisit,
        handle: &str,
        child_ids: &[String],
    ) -> anyhow::Result<PlaygroundVisit> {
        let mine = self.children.list_children_for_parent(handle).await?;
        for child in mine.iter().filter(|c| child_ids.contains(&c.id)) {
            visit.children_names.push(child.name.clone());
            visit.children_ages.push(child.age);
        }
        Ok(visit)
    }
}
