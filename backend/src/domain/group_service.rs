//! Group lifecycle: creation with a shareable join code, joining by
//! code, leaving, and membership-gated lookups.

use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::error::{ServiceError, ServiceResult};
use shared::{
    CreateGroupRequest, Group, GroupListResponse, GroupMembership, GroupResponse,
    JoinGroupResponse, UserIdentity,
};
use crate::storage::traits::{GroupStore, MembershipStore};

const JOIN_CODE_LENGTH: usize = 6;
const JOIN_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// How many collision retries before giving up on code generation.
const JOIN_CODE_ATTEMPTS: usize = 5;

/// Service for managing groups and memberships.
#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn GroupStore>,
    memberships: Arc<dyn MembershipStore>,
    clock: Arc<dyn Clock>,
}

impl GroupService {
    pub fn new(
        groups: Arc<dyn GroupStore>,
        memberships: Arc<dyn MembershipStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            groups,
            memberships,
            clock,
        }
    }

    /// Create a group and auto-join the creator as its first member.
    pub async fn create_group(
        &self,
        identity: &UserIdentity,
        request: CreateGroupRequest,
    ) -> ServiceResult<GroupResponse> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation(
                "Group name cannot be empty".to_string(),
            ));
        }
        if name.len() > 100 {
            return Err(ServiceError::Validation(
                "Group name cannot exceed 100 characters".to_string(),
            ));
        }

        let join_code = self.unique_join_code().await?;
        let group = Group {
            id: format!("group::{}", Uuid::new_v4()),
            name: name.to_string(),
            description: request
                .description
                .map(|d| d.trim().to_string())
                .unwrap_or_default(),
            join_code,
            created_at: self.clock.now(),
        };
        self.groups.store_group(&group).await?;

        self.store_membership(&group.id, identity).await?;

        info!(
            "Created group {} ({:?}) with join code {}",
            group.id, group.name, group.join_code
        );

        Ok(GroupResponse {
            group,
            success_message: "Group created successfully".to_string(),
        })
    }

    /// Join a group by its shareable code. Joining a group the caller is
    /// already a member of succeeds without creating anything.
    pub async fn join_group(
        &self,
        identity: &UserIdentity,
        join_code: &str,
    ) -> ServiceResult<JoinGroupResponse> {
        let code = join_code.trim().to_uppercase();
        if code.is_empty() {
            return Err(ServiceError::Validation(
                "Join code cannot be empty".to_string(),
            ));
        }

        let group = self
            .groups
            .find_group_by_join_code(&code)
            .await?
            .ok_or(ServiceError::NotFound("group"))?;

        if self
            .memberships
            .get_membership(&group.id, &identity.handle)
            .await?
            .is_some()
        {
            return Ok(JoinGroupResponse {
                group,
                already_member: true,
                success_message: "Already a member".to_string(),
            });
        }

        self.store_membership(&group.id, identity).await?;
        info!("{} joined group {}", identity.handle, group.id);

        Ok(JoinGroupResponse {
            group,
            already_member: false,
            success_message: "Joined group successfully".to_string(),
        })
    }

    /// Leave a group. No-op when the caller is not a member.
    pub async fn leave_group(&self, group_id: &str, handle: &str) -> ServiceResult<bool> {
        let Some(membership) = self.memberships.get_membership(group_id, handle).await? else {
            return Ok(false);
        };

        let deleted = self.memberships.delete_membership(&membership.id).await?;
        info!("{} left group {}", handle, group_id);
        Ok(deleted)
    }

    /// All groups the caller has joined.
    pub async fn my_groups(&self, handle: &str) -> ServiceResult<GroupListResponse> {
        let memberships = self.memberships.list_memberships_for_user(handle).await?;

        let mut groups = Vec::with_capacity(memberships.len());
        for membership in memberships {
            match self.groups.get_group(&membership.group_id).await? {
                Some(group) => groups.push(group),
                // A membership can outlive its group; skip rather than fail
                None => warn!(
                    "Membership {} points at missing group {}",
                    membership.id, membership.group_id
                ),
            }
        }

        Ok(GroupListResponse { groups })
    }

    /// Membership-gated group lookup.
    pub async fn get_group(&self, group_id: &str, handle: &str) -> ServiceResult<Group> {
        if self
            .memberships
            .get_membership(group_id, handle)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotMember);
        }

        self.groups
            .get_group(group_id)
            .await?
            .ok_or(ServiceError::NotFound("group"))
    }

    async fn store_membership(
        &self,
        group_id: &str,
        identity: &UserIdentity,
    ) -> ServiceResult<()> {
        self.memberships
            .store_membership(&GroupMembership {
                id: format!("membership::{}", Uuid::new_v4()),
                group_id: group_id.to_string(),
                member_handle: identity.handle.clone(),
                member_name: identity.display_name.clone(),
                created_at: self.clock.now(),
            })
            .await?;
        Ok(())
    }

    /// Generate a join code that is not already taken. Collisions are
    /// rare enough that a handful of attempts suffices.
    async fn unique_join_code(&self) -> ServiceResult<String> {
        for _ in 0..JOIN_CODE_ATTEMPTS {
            let code = generate_join_code();
            if self.groups.find_group_by_join_code(&code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(ServiceError::Storage(anyhow::anyhow!(
            "could not generate a unique join code"
        )))
    }
}

fn generate_join_code() -> String {
    let mut rng = rand::thread_rng();
    (0..JOIN_CODE_LENGTH)
        .map(|_| JOIN_CODE_CHARSET[rng.gen_range(0..JOIN_CODE_CHARSET.len())] as char)
        .collect()
}
