use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Aggregate query '{query}' failed: {reason}")]
    Provider { query: &'static str, reason: String },

    #[error("Payment store unavailable: lock poisoned by an earlier query")]
    StoreUnavailable,

    #[error("Background query task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
