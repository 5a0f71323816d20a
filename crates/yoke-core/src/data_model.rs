//! Data Model: ToolInvocation, ToolResult, SessionLogEntry
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool name used by the agent runtime for shell command execution.
pub const BASH_TOOL: &str = "Bash";

/// Suffix of the task-manager tool that runs commands inside the container.
pub const BASH_DOCKER_SUFFIX: &str = "bash_docker";

/// Prefix shared by every browser-automation tool exposed to the agent.
pub const PLAYWRIGHT_PREFIX: &str = "mcp__playwright__";

/// Coarse classification of a tool by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Shell command execution (the only kind the security and sandbox hooks inspect)
    Command,
    /// Interactive browser verification
    Verification,
    Other,
}

impl ToolKind {
    pub fn from_name(name: &str) -> Self {
        if name == BASH_TOOL || name.ends_with(BASH_DOCKER_SUFFIX) {
            ToolKind::Command
        } else if name.starts_with(PLAYWRIGHT_PREFIX) {
            ToolKind::Verification
        } else {
            ToolKind::Other
        }
    }
}

/// A single action requested by the agent.
///
/// Hooks never mutate an invocation in place: rewriting produces a new
/// value that is handed to the next hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    #[serde(default)]
    pub raw_arguments: Map<String, Value>,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
}

impl ToolInvocation {
    pub fn new(tool_name: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            raw_arguments: Map::new(),
            session_id: session_id.into(),
            timestamp: Utc::now(),
            tool_use_id: None,
        }
    }

    /// Shorthand for a `Bash` invocation carrying `command`.
    pub fn bash(session_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(BASH_TOOL, session_id).with_argument("command", Value::String(command.into()))
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: Value) -> Self {
        self.raw_arguments.insert(key.into(), value);
        self
    }

    pub fn with_arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.raw_arguments = arguments;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_tool_use_id(mut self, id: impl Into<String>) -> Self {
        self.tool_use_id = Some(id.into());
        self
    }

    pub fn kind(&self) -> ToolKind {
        ToolKind::from_name(&self.tool_name)
    }

    pub fn argument_str(&self, key: &str) -> Option<&str> {
        self.raw_arguments.get(key).and_then(|v| v.as_str())
    }

    /// The shell command text, when this is a command invocation.
    pub fn command(&self) -> Option<&str> {
        self.argument_str("command")
    }

    /// Canonical byte form used for trace hashing.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Outcome of executing a tool, as recorded in the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ToolResult {
    pub fn ok(timestamp: DateTime<Utc>) -> Self {
        Self {
            is_error: false,
            exit_code: None,
            content: None,
            timestamp,
        }
    }

    pub fn failed(timestamp: DateTime<Utc>) -> Self {
        Self {
            is_error: true,
            ..Self::ok(timestamp)
        }
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Explicit failure marker or a non-zero exit status.
    pub fn indicates_error(&self) -> bool {
        self.is_error || self.exit_code.is_some_and(|code| code != 0)
    }
}

/// One tool invocation paired with its result, if the result was logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    pub invocation: ToolInvocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ToolResult>,
}

impl SessionLogEntry {
    pub fn new(invocation: ToolInvocation, result: Option<ToolResult>) -> Self {
        Self { invocation, result }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.invocation.timestamp
    }

    pub fn is_error(&self) -> bool {
        self.result.as_ref().is_some_and(ToolResult::indicates_error)
    }
}
