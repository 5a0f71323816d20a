//! Decision types for the governance gate
//!
//! Every invocation ends in exactly one `PolicyDecision`. Decisions are
//! never persisted; they only gate execution.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::YokeError;

/// Why an invocation was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyCause {
    /// Matched a blocklist rule
    PolicyViolation,
    /// Sandbox selected but its backend handle is missing
    RoutingUnavailable,
    /// A hook failed unexpectedly (fail-closed)
    HookFault,
}

/// A denial, with the explanation surfaced to the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denial {
    pub reason: String,
    /// Identifier of the rule that matched, when a rule did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    pub cause: DenyCause,
}

impl Denial {
    pub fn policy(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            rule: Some(rule.into()),
            cause: DenyCause::PolicyViolation,
        }
    }

    pub fn routing(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            rule: None,
            cause: DenyCause::RoutingUnavailable,
        }
    }

    pub fn fault(hook_id: &str) -> Self {
        Self {
            reason: format!("Invocation blocked: hook '{}' failed to evaluate it", hook_id),
            rule: None,
            cause: DenyCause::HookFault,
        }
    }
}

impl From<Denial> for YokeError {
    fn from(denial: Denial) -> Self {
        match denial.cause {
            DenyCause::PolicyViolation => YokeError::PolicyViolation(denial.reason),
            DenyCause::RoutingUnavailable => YokeError::RoutingUnavailable(denial.reason),
            DenyCause::HookFault => YokeError::HookFault(denial.reason),
        }
    }
}

/// Outcome of evaluating one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum PolicyDecision {
    Allow,
    Deny(Denial),
}

impl PolicyDecision {
    pub fn allow() -> Self {
        PolicyDecision::Allow
    }

    pub fn deny(denial: Denial) -> Self {
        PolicyDecision::Deny(denial)
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, PolicyDecision::Deny(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            PolicyDecision::Allow => None,
            PolicyDecision::Deny(denial) => Some(&denial.reason),
        }
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            PolicyDecision::Allow => None,
            PolicyDecision::Deny(denial) => Some(denial),
        }
    }
}

impl fmt::Display for PolicyDecision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PolicyDecision::Allow => write!(f, "ALLOW"),
            PolicyDecision::Deny(denial) => {
                write!(f, "DENY: {}", denial.reason)?;
                if let Some(rule) = &denial.rule {
                    write!(f, " [{}]", rule)?;
                }
                Ok(())
            }
        }
    }
}
