//! # Storage Traits
//!
//! Typed per-entity repository traits. The domain layer only ever talks to
//! these, so storage backends can be swapped without touching business
//! logic. The contract is deliberately narrow: equality filters on named
//! fields plus explicit sort keys, no transactions.

use anyhow::Result;
use async_trait::async_trait;
use shared::{Child, Group, GroupMembership, Playground, PlaygroundVisit};

/// Storage operations for groups.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Store a new group
    async fn store_group(&self, group: &Group) -> Result<()>;

    /// Retrieve a group by ID
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>>;

    /// Look up a group by its shareable join code
    async fn find_group_by_join_code(&self, join_code: &str) -> Result<Option<Group>>;
}

/// Storage operations for group memberships.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Store a new membership
    async fn store_membership(&self, membership: &GroupMembership) -> Result<()>;

    /// Find the membership of one user in one group
    async fn get_membership(
        &self,
        group_id: &str,
        member_handle: &str,
    ) -> Result<Option<GroupMembership>>;

    /// List every membership held by a user
    async fn list_memberships_for_user(
        &self,
        member_handle: &str,
    ) -> Result<Vec<GroupMembership>>;

    /// Delete a membership by ID
    /// Returns true if a membership was found and deleted
    async fn delete_membership(&self, membership_id: &str) -> Result<bool>;
}

/// Storage operations for children.
#[async_trait]
pub trait ChildStore: Send + Sync {
    /// Store a new child
    async fn store_child(&self, child: &Child) -> Result<()>;

    /// Retrieve a child by ID
    async fn get_child(&self, child_id: &str) -> Result<Option<Child>>;

    /// List all children owned by a parent, ordered by name
    async fn list_children_for_parent(&self, parent_handle: &str) -> Result<Vec<Child>>;

    /// Delete a child by ID
    /// Returns true if a child was found and deleted
    async fn delete_child(&self, child_id: &str) -> Result<bool>;
}

/// Storage operations for canonical playground records.
///
/// Playgrounds are create-only: they are never updated or deleted.
#[async_trait]
pub trait PlaygroundStore: Send + Sync {
    /// Store a new playground record
    async fn store_playground(&self, playground: &Playground) -> Result<()>;

    /// List all playgrounds of a group in insertion order.
    /// Name resolution tie-breaks on this order, so it must be stable.
    async fn list_playgrounds_for_group(&self, group_id: &str) -> Result<Vec<Playground>>;
}

/// Storage operations for visits.
///
/// Visits are never deleted; the only permitted mutation is flipping the
/// `ended` flag.
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Store a new visit
    async fn store_visit(&self, visit: &PlaygroundVisit) -> Result<()>;

    /// List all visits of a group in insertion order, ended and expired
    /// ones included
    async fn list_visits_for_group(&self, group_id: &str) -> Result<Vec<PlaygroundVisit>>;

    /// List all visits of one parent within a group, in insertion order
    async fn list_visits_for_parent(
        &self,
        group_id: &str,
        parent_handle: &str,
    ) -> Result<Vec<PlaygroundVisit>>;

    /// Mark a visit as ended
    /// Returns true if a visit was found and updated
    async fn mark_visit_ended(&self, visit_id: &str) -> Result<bool>;
}
