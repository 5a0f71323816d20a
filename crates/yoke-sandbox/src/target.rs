//! Sandbox targets
//!
//! A session resolves exactly one `SandboxTarget` at start. The backend
//! handle inside it (container name, remote sandbox id) is created and torn
//! down elsewhere; the router only reads it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use yoke_core::{GovernanceConfig, SandboxBackend};

use crate::error::RoutingError;

/// A validated container name or id.
///
/// Only `[A-Za-z0-9][A-Za-z0-9_.-]*` is accepted, so the identifier can be
/// placed in an exec wrapper without quoting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Result<Self, RoutingError> {
        let id = id.into();
        let mut chars = id.chars();
        let valid = match chars.next() {
            Some(first) if first.is_ascii_alphanumeric() => {
                chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
            }
            _ => false,
        };
        if valid {
            Ok(Self(id))
        } else {
            Err(RoutingError::InvalidContainerId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContainerId {
    type Error = RoutingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContainerId> for String {
    fn from(id: ContainerId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pre-established remote sandbox session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteWorkspace {
    pub sandbox_id: String,
    pub workdir: String,
}

impl RemoteWorkspace {
    pub fn new(sandbox_id: impl Into<String>, workdir: impl Into<String>) -> Self {
        Self {
            sandbox_id: sandbox_id.into(),
            workdir: workdir.into(),
        }
    }
}

/// Where a session's commands execute. One variant per backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum SandboxTarget {
    /// Agent's own working directory
    None { workdir: PathBuf },
    Container {
        container: Option<ContainerId>,
        workdir: String,
    },
    Remote { workspace: Option<RemoteWorkspace> },
}

impl SandboxTarget {
    pub fn local(workdir: impl Into<PathBuf>) -> Self {
        SandboxTarget::None {
            workdir: workdir.into(),
        }
    }

    pub fn container(container: ContainerId, workdir: impl Into<String>) -> Self {
        SandboxTarget::Container {
            container: Some(container),
            workdir: workdir.into(),
        }
    }

    pub fn remote(workspace: RemoteWorkspace) -> Self {
        SandboxTarget::Remote {
            workspace: Some(workspace),
        }
    }

    /// Resolve the session target from configuration and whatever backend
    /// handles the session bootstrap managed to create.
    ///
    /// A missing handle is kept as `None` inside the selected variant; it is
    /// reported when a command is routed, never downgraded to local.
    pub fn resolve(
        config: &GovernanceConfig,
        workspace_dir: impl Into<PathBuf>,
        container: Option<ContainerId>,
        remote: Option<RemoteWorkspace>,
    ) -> Self {
        match config.sandbox_backend {
            SandboxBackend::None => SandboxTarget::local(workspace_dir),
            SandboxBackend::Container => SandboxTarget::Container {
                container,
                workdir: config.container_workdir.clone(),
            },
            SandboxBackend::Remote => SandboxTarget::Remote { workspace: remote },
        }
    }

    pub fn backend(&self) -> SandboxBackend {
        match self {
            SandboxTarget::None { .. } => SandboxBackend::None,
            SandboxTarget::Container { .. } => SandboxBackend::Container,
            SandboxTarget::Remote { .. } => SandboxBackend::Remote,
        }
    }

    /// Whether the selected backend has a live handle.
    pub fn is_ready(&self) -> bool {
        match self {
            SandboxTarget::None { .. } => true,
            SandboxTarget::Container { container, .. } => container.is_some(),
            SandboxTarget::Remote { workspace } => workspace.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_id_validation() {
        assert!(ContainerId::new("yokeflow-claude_ai").is_ok());
        assert!(ContainerId::new("abc123.def").is_ok());
        assert!(ContainerId::new("").is_err());
        assert!(ContainerId::new("-rm").is_err());
        assert!(ContainerId::new("box; rm -rf /").is_err());
        assert!(ContainerId::new("a b").is_err());
    }

    #[test]
    fn test_container_id_deserialize_validates() {
        let ok: Result<ContainerId, _> = serde_json::from_str("\"sandbox-1\"");
        assert!(ok.is_ok());
        let bad: Result<ContainerId, _> = serde_json::from_str("\"$(whoami)\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_resolve_from_config() {
        let mut config = GovernanceConfig::default();
        let id = ContainerId::new("box").unwrap();

        let target = SandboxTarget::resolve(&config, "/tmp/p", Some(id.clone()), None);
        assert_eq!(target, SandboxTarget::local("/tmp/p"));

        config.sandbox_backend = SandboxBackend::Container;
        let target = SandboxTarget::resolve(&config, "/tmp/p", Some(id), None);
        assert_eq!(target.backend(), SandboxBackend::Container);
        assert!(target.is_ready());

        config.sandbox_backend = SandboxBackend::Remote;
        let target = SandboxTarget::resolve(&config, "/tmp/p", None, None);
        assert_eq!(target.backend(), SandboxBackend::Remote);
        assert!(!target.is_ready());
    }
}
