//! # Domain Module
//!
//! Business logic for the playground tracker. Everything here is storage-
//! and UI-agnostic: services talk to the typed repository traits in
//! [`crate::storage`] and take an injected [`clock::Clock`] so that
//! time-dependent behavior is deterministic under test.
//!
//! ## Module Organization
//!
//! - **normalizer** / **similarity**: pure text functions feeding name
//!   resolution
//! - **playground_resolver**: maps raw playground text to a canonical
//!   per-group identity, creating records on first sight
//! - **presence_window**: pure time-decay classification of a visit
//!   (Active / Expiring / Expired)
//! - **visit_service**: the per-user visit lifecycle (signal, change
//!   playground, end)
//! - **presence_service**: the group-wide "who's here now" view and the
//!   autocomplete name list
//! - **group_service** / **child_service**: group membership and
//!   per-parent child management
//!
//! ## Concurrency model
//!
//! There are no internal locks or transactions. The end-then-create
//! sequence in `visit_service` is two independent writes, and the one
//! non-serialized write path in `playground_resolver` can duplicate
//! canonical records under concurrency; both are rendered defensively by
//! the read paths instead of being prevented.

pub mod child_service;
pub mod clock;
pub mod error;
pub mod group_service;
pub mod normalizer;
pub mod playground_resolver;
pub mod presence_service;
pub mod presence_window;
pub mod similarity;
pub mod visit_service;

pub use child_service::ChildService;
pub use clock::{system_clock, Clock, SystemClock};
pub use error::{ServiceError, ServiceResult};
pub use group_service::GroupService;
pub use playground_resolver::PlaygroundResolver;
pub use presence_service::PresenceService;
pub use visit_service::VisitService;
