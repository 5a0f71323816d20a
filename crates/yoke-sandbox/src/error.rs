use thiserror::Error;
use yoke_core::{SandboxBackend, YokeError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("{backend} sandbox selected but no live backend handle exists")]
    BackendUnavailable { backend: SandboxBackend },

    #[error("invalid container identifier '{0}'")]
    InvalidContainerId(String),
}

impl From<RoutingError> for YokeError {
    fn from(err: RoutingError) -> Self {
        YokeError::RoutingUnavailable(err.to_string())
    }
}
