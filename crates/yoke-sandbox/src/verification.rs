//! Where browser verification runs
//!
//! When commands execute inside a sandbox, verification runs there too so
//! that "build" and "verify" see the same filesystem and network. Without
//! a sandbox, a separately launched browser-automation server is used.

use serde::{Deserialize, Serialize};
use yoke_core::SandboxBackend;

use crate::error::RoutingError;
use crate::target::SandboxTarget;

/// Launch parameters for the stand-alone verification server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationServer {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
}

impl Default for VerificationServer {
    fn default() -> Self {
        Self {
            name: "playwright".to_string(),
            command: "npx".to_string(),
            args: [
                "@playwright/mcp@latest",
                "--browser",
                "chrome",
                "--headless",
                "--snapshot-mode",
                "incremental",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum VerificationRoute {
    /// Run through the same backend as shell commands
    InBackend { backend: SandboxBackend },
    /// Register an independently launched verification server
    External { server: VerificationServer },
}

/// Decide how verification is wired for a session.
///
/// `in_container` disables the in-container path for container targets
/// (useful for manual debugging with forwarded ports).
pub fn verification_route(
    target: &SandboxTarget,
    in_container: bool,
) -> Result<VerificationRoute, RoutingError> {
    match target {
        SandboxTarget::None { .. } => Ok(VerificationRoute::External {
            server: VerificationServer::default(),
        }),
        SandboxTarget::Container { .. } if !in_container => Ok(VerificationRoute::External {
            server: VerificationServer::default(),
        }),
        SandboxTarget::Container { .. } | SandboxTarget::Remote { .. } => {
            if !target.is_ready() {
                return Err(RoutingError::BackendUnavailable {
                    backend: target.backend(),
                });
            }
            Ok(VerificationRoute::InBackend {
                backend: target.backend(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{ContainerId, RemoteWorkspace};

    #[test]
    fn test_no_sandbox_uses_external_server() {
        let route = verification_route(&SandboxTarget::local("/tmp/p"), true).unwrap();
        match route {
            VerificationRoute::External { server } => {
                assert_eq!(server.command, "npx");
                assert!(server.args.contains(&"--headless".to_string()));
            }
            other => panic!("unexpected route {:?}", other),
        }
    }

    #[test]
    fn test_container_runs_verification_inside() {
        let target = SandboxTarget::container(ContainerId::new("box").unwrap(), "/workspace");
        assert_eq!(
            verification_route(&target, true).unwrap(),
            VerificationRoute::InBackend {
                backend: SandboxBackend::Container
            }
        );
        assert!(matches!(
            verification_route(&target, false).unwrap(),
            VerificationRoute::External { .. }
        ));
    }

    #[test]
    fn test_remote_runs_verification_inside() {
        let target = SandboxTarget::remote(RemoteWorkspace::new("sbx", "/app"));
        assert_eq!(
            verification_route(&target, true).unwrap(),
            VerificationRoute::InBackend {
                backend: SandboxBackend::Remote
            }
        );
    }

    #[test]
    fn test_missing_handle_is_not_downgraded() {
        let target = SandboxTarget::Container {
            container: None,
            workdir: "/workspace".to_string(),
        };
        assert!(verification_route(&target, true).is_err());
    }
}
