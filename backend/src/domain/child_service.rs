//! Per-parent child management. Children exist so that a presence signal
//! can snapshot who came along; they are owned by exactly one parent and
//! invisible to everyone else.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::error::{ServiceError, ServiceResult};
use shared::{Child, ChildListResponse, ChildResponse, CreateChildRequest, UserIdentity};
use crate::storage::traits::ChildStore;

const MAX_CHILD_AGE: u32 = 18;

/// Service for managing a parent's children.
#[derive(Clone)]
pub struct ChildService {
    children: Arc<dyn ChildStore>,
    clock: Arc<dyn Clock>,
}

impl ChildService {
    pub fn new(children: Arc<dyn ChildStore>, clock: Arc<dyn Clock>) -> Self {
        Self { children, clock }
    }

    /// Add a child for the calling parent.
    pub async fn add_child(
        &self,
        identity: &UserIdentity,
        request: CreateChildRequest,
    ) -> ServiceResult<ChildResponse> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation(
                "Child name cannot be empty".to_string(),
            ));
        }
        if request.age > MAX_CHILD_AGE {
            return Err(ServiceError::Validation(format!(
                "Child age must be between 0 and {}",
                MAX_CHILD_AGE
            )));
        }

        let child = Child {
            id: format!("child::{}", Uuid::new_v4()),
            parent_handle: identity.handle.clone(),
            name: name.to_string(),
            age: request.age,
            created_at: self.clock.now(),
        };
        self.children.store_child(&child).await?;

        info!("Added child {} for {}", child.id, identity.handle);

        Ok(ChildResponse {
            child,
            success_message: "Child added successfully".to_string(),
        })
    }

    /// List the calling parent's children, ordered by name.
    pub async fn list_children(&self, handle: &str) -> ServiceResult<ChildListResponse> {
        let children = self.children.list_children_for_parent(handle).await?;
        Ok(ChildListResponse { children })
    }

    /// Remove one of the caller's own children. Removing someone else's
    /// child is refused, and the record stays put.
    pub async fn remove_child(&self, handle: &str, child_id: &str) -> ServiceResult<()> {
        let child = self
            .children
            .get_child(child_id)
            .await?
            .ok_or(ServiceError::NotFound("child"))?;

        if child.parent_handle != handle {
            return Err(ServiceError::NotFound("child"));
        }

        self.children.delete_child(child_id).await?;
        info!("Removed child {} for {}", child_id, handle);
        Ok(())
    }
}
