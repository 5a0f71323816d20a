//! Hook Trait: the single contract every interceptor implements
use crate::context::SessionContext;
use crate::data_model::{ToolInvocation, ToolKind};
use crate::decision::Denial;

/// Which invocations a hook wants to see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMatcher {
    /// Every tool (`*`)
    Any,
    /// Only tools of the given kind
    Kind(ToolKind),
    /// Exactly one tool name
    Name(&'static str),
}

impl ToolMatcher {
    pub fn matches(&self, invocation: &ToolInvocation) -> bool {
        match self {
            ToolMatcher::Any => true,
            ToolMatcher::Kind(kind) => invocation.kind() == *kind,
            ToolMatcher::Name(name) => invocation.tool_name == *name,
        }
    }
}

/// What a hook did with an invocation
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// Hand this (possibly rewritten) invocation to the next hook
    Continue(ToolInvocation),
    /// Stop the chain
    Deny(Denial),
}

/// An interceptor run before a tool invocation executes
pub trait Hook: Send + Sync {
    /// Unique hook ID (ex: "security.blocklist.v1")
    fn id(&self) -> &'static str;

    fn matcher(&self) -> ToolMatcher {
        ToolMatcher::Any
    }

    /// Inspect and optionally rewrite the invocation.
    ///
    /// An `Err` is an unexpected fault; the pipeline treats it as a denial.
    fn run(
        &self,
        invocation: ToolInvocation,
        ctx: &SessionContext,
    ) -> Result<HookOutcome, HookError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HookError {
    #[error("HOOK/INVALID: {0}")]
    InvalidInvocation(String),

    #[error("HOOK/EXEC: {0}")]
    ExecutionFailed(String),
}
