//! Unified Error Model
use thiserror::Error;

#[derive(Error, Debug)]
pub enum YokeError {
    /// Command matched a blocklist rule. Never executed, never retried.
    #[error("POLICY/{0}")]
    PolicyViolation(String),

    /// Sandbox backend selected but no live handle for it.
    #[error("ROUTE/{0}")]
    RoutingUnavailable(String),

    /// A hook faulted; the invocation was denied.
    #[error("HOOK/{0}")]
    HookFault(String),

    /// Scoring input log missing or truncated.
    #[error("LOG/{0}")]
    LogIncomplete(String),

    /// Metrics upsert raced with another writer.
    #[error("STORE/{0}")]
    StorageConflict(String),

    #[error("CONFIG/{0}")]
    Config(String),

    #[error("IO/{0}")]
    Io(#[from] std::io::Error),
}

impl YokeError {
    /// Whether the failure is safe to retry as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, YokeError::StorageConflict(_))
    }
}
