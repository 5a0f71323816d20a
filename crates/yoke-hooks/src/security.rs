use tracing::info;
use yoke_core::{
    Denial, GovernanceConfig, Hook, HookError, HookOutcome, PolicyDecision, SessionContext,
    ToolInvocation, ToolKind, ToolMatcher,
};
use yoke_policy::CommandPolicy;

/// Rule id reported when a command tool arrives without command text.
pub const MISSING_COMMAND_RULE: &str = "missing-command";

/// Blocks shell commands that match the blocklist.
pub struct SecurityHook {
    policy: CommandPolicy,
}

impl SecurityHook {
    pub fn new(policy: CommandPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &GovernanceConfig) -> Self {
        Self::new(CommandPolicy::from_config(config))
    }

    pub fn policy(&self) -> &CommandPolicy {
        &self.policy
    }
}

impl Default for SecurityHook {
    fn default() -> Self {
        Self::new(CommandPolicy::new())
    }
}

impl Hook for SecurityHook {
    fn id(&self) -> &'static str {
        "security.blocklist.v1"
    }

    fn matcher(&self) -> ToolMatcher {
        ToolMatcher::Kind(ToolKind::Command)
    }

    fn run(
        &self,
        invocation: ToolInvocation,
        ctx: &SessionContext,
    ) -> Result<HookOutcome, HookError> {
        let Some(command) = invocation.command() else {
            return Ok(HookOutcome::Deny(Denial::policy(
                MISSING_COMMAND_RULE,
                format!(
                    "'{}' invocation has no command to check. Provide the command text.",
                    invocation.tool_name
                ),
            )));
        };

        match self.policy.evaluate(command) {
            PolicyDecision::Allow => Ok(HookOutcome::Continue(invocation)),
            PolicyDecision::Deny(denial) => {
                info!(
                    session_id = %ctx.session_id,
                    rule = denial.rule.as_deref().unwrap_or("-"),
                    "blocked command"
                );
                Ok(HookOutcome::Deny(denial))
            }
        }
    }
}
