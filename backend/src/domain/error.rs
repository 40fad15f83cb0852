//! Domain error type shared by all services.
//!
//! The REST layer translates these into HTTP status codes; nothing in the
//! domain layer ever panics on bad input or storage failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input refused before anything was persisted
    #[error("validation failed: {0}")]
    Validation(String),

    /// The caller is not a member of the group they are addressing
    #[error("not a member of this group")]
    NotMember,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// A multi-write sequence failed partway through. The completed half
    /// is not rolled back; callers should retry and readers must tolerate
    /// the intermediate state (e.g. a second conceptually-active visit).
    #[error("presence update partially applied: {source}")]
    PartialWrite {
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
