//! Sandbox Router: picks and parameterizes the destination of a command
use std::borrow::Cow;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shell_escape::unix::escape;
use tracing::debug;

use crate::error::RoutingError;
use crate::target::{ContainerId, SandboxTarget};

/// Program used to exec into the container backend
pub const CONTAINER_RUNTIME: &str = "docker";

/// Shell the command text is handed to inside every backend
pub const SHELL: &str = "bash";

/// A command bound to the backend that must run it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum ExecutableCommand {
    Local {
        command: String,
        workdir: PathBuf,
    },
    ContainerExec {
        container: ContainerId,
        workdir: String,
        command: String,
    },
    Remote {
        sandbox_id: String,
        workdir: String,
        command: String,
    },
}

impl ExecutableCommand {
    /// The agent's command text, untouched by any wrapper.
    pub fn inner_command(&self) -> &str {
        match self {
            ExecutableCommand::Local { command, .. }
            | ExecutableCommand::ContainerExec { command, .. }
            | ExecutableCommand::Remote { command, .. } => command,
        }
    }

    /// argv form for process spawning. Remote commands have no local argv.
    pub fn argv(&self) -> Option<Vec<String>> {
        match self {
            ExecutableCommand::Local { command, .. } => {
                Some(vec![SHELL.to_string(), "-c".to_string(), command.clone()])
            }
            ExecutableCommand::ContainerExec {
                container,
                workdir,
                command,
            } => Some(vec![
                CONTAINER_RUNTIME.to_string(),
                "exec".to_string(),
                "-w".to_string(),
                workdir.clone(),
                container.as_str().to_string(),
                SHELL.to_string(),
                "-c".to_string(),
                command.clone(),
            ]),
            ExecutableCommand::Remote { .. } => None,
        }
    }

    /// The command as a single shell line, suitable for replacing the
    /// `command` argument of a `Bash` invocation.
    pub fn shell_line(&self) -> String {
        match self {
            ExecutableCommand::Local { command, .. } | ExecutableCommand::Remote { command, .. } => {
                command.clone()
            }
            ExecutableCommand::ContainerExec {
                container,
                workdir,
                command,
            } => format!(
                "{} exec -w {} {} {} -c {}",
                CONTAINER_RUNTIME,
                escape(Cow::Borrowed(workdir.as_str())),
                container,
                SHELL,
                escape(Cow::Borrowed(command.as_str())),
            ),
        }
    }
}

/// Route `command` to the session's backend.
///
/// Never falls back to local execution: a container or remote target
/// without a live handle is a `RoutingError`.
pub fn route(command: &str, target: &SandboxTarget) -> Result<ExecutableCommand, RoutingError> {
    let routed = match target {
        SandboxTarget::None { workdir } => ExecutableCommand::Local {
            command: command.to_string(),
            workdir: workdir.clone(),
        },
        SandboxTarget::Container { container, workdir } => {
            let container = container.clone().ok_or(RoutingError::BackendUnavailable {
                backend: target.backend(),
            })?;
            ExecutableCommand::ContainerExec {
                container,
                workdir: workdir.clone(),
                command: command.to_string(),
            }
        }
        SandboxTarget::Remote { workspace } => {
            let workspace = workspace.as_ref().ok_or(RoutingError::BackendUnavailable {
                backend: target.backend(),
            })?;
            ExecutableCommand::Remote {
                sandbox_id: workspace.sandbox_id.clone(),
                workdir: workspace.workdir.clone(),
                command: command.to_string(),
            }
        }
    };

    debug!(backend = %target.backend(), "command routed");
    Ok(routed)
}
