use thiserror::Error;

/// Engine-level failure taxonomy. All three business variants are
/// recoverable by the caller (retry with corrected input or `force = true`);
/// the surrounding HTTP layer maps them to 404/400/409.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// A contending value is already recorded and `force` was not set.
    /// Carries both values so the caller can present a diff.
    #[error("conflict: {message}")]
    Conflict {
        message: String,
        existing: serde_json::Value,
        submitted: serde_json::Value,
    },

    #[error("database error")]
    Db(#[from] sqlx::Error),
}

impl EngineError {
    pub fn conflict(
        message: impl Into<String>,
        existing: serde_json::Value,
        submitted: serde_json::Value,
    ) -> Self {
        EngineError::Conflict {
            message: message.into(),
            existing,
            submitted,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
