//! Error types shared across crate boundaries.

use crate::llm::BackendError;

/// Errors from persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from driving a generation session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The requested operation is not valid in the session's current
    /// state, e.g. submitting while a generation is in flight.
    #[error("invalid session state: {0}")]
    InvalidState(String),

    /// The stream finished but the accumulated output is not a
    /// plausible artifact.
    #[error("incomplete artifact: {0}")]
    IncompleteArtifact(String),

    /// The generation backend failed mid-stream.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
