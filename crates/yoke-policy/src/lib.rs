//! YokeFlow Policy: command blocklist evaluation
//!
//! Maps a proposed shell command to `allow` or `deny(reason)`.
//!
//! ```text
//! command ─▶ built-in rules ─▶ configured patterns ─▶ PolicyDecision
//!                 │ first match         │ first match
//!                 └────────────┬────────┘
//!                           DENY(rule)
//! ```
//!
//! # Example
//!
//! ```
//! use yoke_policy::CommandPolicy;
//!
//! let policy = CommandPolicy::with_blocked(["git push --force"]);
//!
//! assert!(policy.evaluate("npm test").is_allowed());
//! assert!(policy.evaluate("rm -rf /").is_denied());
//! assert!(policy.evaluate("git push --force origin main").is_denied());
//! ```

pub mod evaluator;
pub mod rule;

pub use evaluator::{evaluate, CommandPolicy};
pub use rule::{BlockRule, RuleCategory, BUILTIN_RULES};

/// Quick check: would `command` run under the built-in blocklist?
pub fn would_allow(command: &str) -> bool {
    CommandPolicy::new().evaluate(command).is_allowed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_would_allow() {
        assert!(would_allow("npm test"));
        assert!(!would_allow("rm -rf /"));
    }
}
