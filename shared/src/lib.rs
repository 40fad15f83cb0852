//! Shared data types for the playground tracker.
//!
//! These types cross the boundary between the backend services and any
//! consumer of the REST API, so everything here is serde-serializable and
//! free of business logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A neighborhood group that parents join with a shareable code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Shareable join code (6 uppercase characters, unique across groups)
    pub join_code: String,
    pub created_at: DateTime<Utc>,
}

/// Membership of one user in one group. Gates visibility of everything
/// inside the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub id: String,
    pub group_id: String,
    /// Contact handle of the member - the de facto unique user key
    pub member_handle: String,
    pub member_name: String,
    pub created_at: DateTime<Utc>,
}

/// A child belonging to one parent, selectable when signalling presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub parent_handle: String,
    pub name: String,
    /// Age in years (0-18)
    pub age: u32,
    pub created_at: DateTime<Utc>,
}

/// Canonical playground record, created lazily the first time an
/// unmatched name is seen. Scoped per group - identical text in two
/// groups resolves independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playground {
    pub id: String,
    pub group_id: String,
    /// Deduplicated name used to group visits at one location
    pub canonical_name: String,
    /// The raw text as first typed by a user, kept for reference
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

/// A single presence signal: one parent (plus selected children) at one
/// playground. Never deleted; only `ended` is ever mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaygroundVisit {
    pub id: String,
    pub group_id: String,
    pub parent_handle: String,
    pub parent_name: String,
    /// Canonical playground name, denormalized at write time (not a
    /// foreign key - display-time grouping is by this literal string)
    pub playground_name: String,
    /// Snapshot of the selected children's names at signal time
    pub children_names: Vec<String>,
    /// Snapshot of the selected children's ages at signal time
    pub children_ages: Vec<u32>,
    /// Immutable creation timestamp; visit age is always computed from
    /// this against wall-clock time
    pub signal_time: DateTime<Utc>,
    pub ended: bool,
}

/// Time-decay state of a visit, re-derived on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceState {
    /// Under 45 minutes old
    Active,
    /// 45-59 minutes old, about to expire
    Expiring,
    /// 60 minutes or older - excluded from every active view
    Expired,
}

/// Self-asserted identity of the calling user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Contact handle used as the unique key for membership and visit
    /// attribution
    pub handle: String,
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Group requests/responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinGroupRequest {
    pub join_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupResponse {
    pub group: Group,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinGroupResponse {
    pub group: Group,
    /// True when the caller was already a member (joining is idempotent)
    pub already_member: bool,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupListResponse {
    pub groups: Vec<Group>,
}

// ---------------------------------------------------------------------------
// Child requests/responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChildRequest {
    pub name: String,
    pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildResponse {
    pub child: Child,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildListResponse {
    pub children: Vec<Child>,
}

// ---------------------------------------------------------------------------
// Presence requests/responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPresenceRequest {
    /// Free-text playground name as typed by the user
    pub playground_name: String,
    /// IDs of the caller's children who are along for this visit
    pub child_ids: Vec<String>,
}

/// A visit decorated with its current time-decay state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitView {
    pub visit: PlaygroundVisit,
    pub state: PresenceState,
    /// Whole minutes elapsed since the signal
    pub minutes_ago: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitResponse {
    pub visit: PlaygroundVisit,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveVisitResponse {
    /// The caller's current active visit, if any
    pub visit: Option<VisitView>,
}

/// All current visits at one playground, grouped by the literal
/// playground name string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaygroundPresence {
    pub playground_name: String,
    pub visits: Vec<VisitView>,
    /// Most recent signal time within this playground, used for ordering
    pub last_signal_time: DateTime<Utc>,
}

/// The group-wide "who's here now" view, recomputed fresh on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceViewResponse {
    /// Playground groups ordered by most recent signal, descending
    pub playgrounds: Vec<PlaygroundPresence>,
    /// Total number of non-ended, non-expired visits in the group
    pub total_active: usize,
}

/// Every playground name ever seen in the group, for autocomplete only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentPlaygroundsResponse {
    pub names: Vec<String>,
}
