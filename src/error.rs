use thiserror::Error;

/// Error taxonomy for every lifecycle operation. The core never maps these to
/// transport status codes; that happens at the HTTP boundary in `web`.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input. Never retried.
    #[error("{0}")]
    Validation(String),

    /// State-guard violation: the slot is not in the status the requested
    /// transition expects. Caller must re-fetch before retrying.
    #[error("{0}")]
    Conflict(String),

    /// Referenced slot or user does not exist (possibly already swept).
    #[error("{0}")]
    NotFound(String),

    /// Caller role or identity does not match the required relationship to
    /// the slot. Checked before any state guard.
    #[error("{0}")]
    Authorization(String),

    /// Persistence layer failure. The only class where retrying later makes
    /// sense.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Storage(err.to_string())
    }
}

impl From<csv::Error> for ServiceError {
    fn from(err: csv::Error) -> Self {
        ServiceError::Storage(err.to_string())
    }
}
