//! # Storage Module
//!
//! Handles all data persistence for the playground tracker.
//!
//! The domain layer depends only on the typed per-entity traits defined in
//! [`traits`]; the SQLite implementation in [`db`] is the one concrete
//! backend and can be swapped without touching business logic.
//!
//! ## Guarantees (and non-guarantees)
//!
//! - Equality filters on named fields, plus the explicit sort keys each
//!   trait method documents
//! - No cross-entity transactions: multi-write sequences in the domain
//!   layer are at-least-once and readers must tolerate the gaps
//! - Insertion order is preserved where a trait method says so (name
//!   resolution and the presence view both depend on it)

pub mod db;
pub mod traits;

pub use db::DbConnection;
pub use traits::*;
