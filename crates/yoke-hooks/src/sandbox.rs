use serde_json::Value;
use tracing::{debug, warn};
use yoke_core::{
    data_model::BASH_TOOL, Denial, Hook, HookError, HookOutcome, SessionContext, ToolInvocation,
    ToolMatcher,
};
use yoke_sandbox::{route, ExecutableCommand, SandboxTarget};

/// Argument key carrying the routed command for backends the agent runtime
/// cannot reach through a shell line.
pub const ROUTE_ARGUMENT: &str = "sandbox_route";

/// Rewrites `Bash` invocations so they execute in the session's backend.
///
/// Only the plain `Bash` tool is routed; the task-manager's container tool
/// already runs inside the container.
pub struct SandboxHook {
    target: SandboxTarget,
}

impl SandboxHook {
    pub fn new(target: SandboxTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &SandboxTarget {
        &self.target
    }
}

impl Hook for SandboxHook {
    fn id(&self) -> &'static str {
        "sandbox.route.v1"
    }

    fn matcher(&self) -> ToolMatcher {
        ToolMatcher::Name(BASH_TOOL)
    }

    fn run(
        &self,
        mut invocation: ToolInvocation,
        ctx: &SessionContext,
    ) -> Result<HookOutcome, HookError> {
        // Only the router sets the route argument.
        if invocation.raw_arguments.remove(ROUTE_ARGUMENT).is_some() {
            warn!(session_id = %ctx.session_id, "dropped caller-supplied sandbox route");
        }

        let command = invocation
            .command()
            .ok_or_else(|| HookError::InvalidInvocation("Bash invocation without command".into()))?;

        let routed = match route(command, &self.target) {
            Ok(routed) => routed,
            Err(e) => {
                warn!(session_id = %ctx.session_id, error = %e, "sandbox routing failed");
                return Ok(HookOutcome::Deny(Denial::routing(format!(
                    "Command not executed: {}",
                    e
                ))));
            }
        };

        let rewritten = match &routed {
            ExecutableCommand::Local { .. } => invocation,
            ExecutableCommand::ContainerExec { .. } => {
                let line = routed.shell_line();
                debug!(session_id = %ctx.session_id, "command wrapped for container");
                invocation.with_argument("command", Value::String(line))
            }
            ExecutableCommand::Remote { .. } => {
                let value = serde_json::to_value(&routed)
                    .map_err(|e| HookError::ExecutionFailed(e.to_string()))?;
                debug!(session_id = %ctx.session_id, "command bound to remote sandbox");
                invocation.with_argument(ROUTE_ARGUMENT, value)
            }
        };

        Ok(HookOutcome::Continue(rewritten))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yoke_core::DenyCause;
    use yoke_sandbox::{ContainerId, RemoteWorkspace};

    fn ctx() -> SessionContext {
        SessionContext::new("s1", "/tmp/p")
    }

    fn continued(outcome: HookOutcome) -> ToolInvocation {
        match outcome {
            HookOutcome::Continue(inv) => inv,
            HookOutcome::Deny(d) => panic!("unexpected deny: {}", d.reason),
        }
    }

    #[test]
    fn test_no_sandbox_leaves_invocation_alone() {
        let hook = SandboxHook::new(SandboxTarget::local("/tmp/p"));
        let inv = ToolInvocation::bash("s1", "npm test");
        assert_eq!(continued(hook.run(inv.clone(), &ctx()).unwrap()), inv);
    }

    #[test]
    fn test_container_rewrites_command() {
        let target = SandboxTarget::container(ContainerId::new("yokeflow-app").unwrap(), "/workspace");
        let hook = SandboxHook::new(target);
        let out = continued(hook.run(ToolInvocation::bash("s1", "npm test"), &ctx()).unwrap());
        assert_eq!(
            out.command(),
            Some("docker exec -w /workspace yokeflow-app bash -c 'npm test'")
        );
    }

    #[test]
    fn test_remote_attaches_route() {
        let target = SandboxTarget::remote(RemoteWorkspace::new("sbx-1", "/home/user/app"));
        let hook = SandboxHook::new(target);
        let out = continued(hook.run(ToolInvocation::bash("s1", "ls"), &ctx()).unwrap());

        assert_eq!(out.command(), Some("ls"));
        let route = out.raw_arguments.get(ROUTE_ARGUMENT).unwrap();
        assert_eq!(route["backend"], "remote");
        assert_eq!(route["sandbox_id"], "sbx-1");
    }

    #[test]
    fn test_caller_supplied_route_is_dropped() {
        let forged = serde_json::json!({"backend": "remote", "sandbox_id": "attacker"});

        let hook = SandboxHook::new(SandboxTarget::local("/tmp/p"));
        let inv = ToolInvocation::bash("s1", "ls").with_argument(ROUTE_ARGUMENT, forged.clone());
        let out = continued(hook.run(inv, &ctx()).unwrap());
        assert!(!out.raw_arguments.contains_key(ROUTE_ARGUMENT));

        let target = SandboxTarget::container(ContainerId::new("box").unwrap(), "/workspace");
        let hook = SandboxHook::new(target);
        let inv = ToolInvocation::bash("s1", "ls").with_argument(ROUTE_ARGUMENT, forged.clone());
        let out = continued(hook.run(inv, &ctx()).unwrap());
        assert!(!out.raw_arguments.contains_key(ROUTE_ARGUMENT));

        let target = SandboxTarget::remote(RemoteWorkspace::new("sbx-1", "/home/user/app"));
        let hook = SandboxHook::new(target);
        let inv = ToolInvocation::bash("s1", "ls").with_argument(ROUTE_ARGUMENT, forged);
        let out = continued(hook.run(inv, &ctx()).unwrap());
        assert_eq!(out.raw_arguments[ROUTE_ARGUMENT]["sandbox_id"], "sbx-1");
    }

    #[test]
    fn test_missing_backend_denies() {
        let hook = SandboxHook::new(SandboxTarget::Remote { workspace: None });
        match hook.run(ToolInvocation::bash("s1", "ls"), &ctx()).unwrap() {
            HookOutcome::Deny(d) => assert_eq!(d.cause, DenyCause::RoutingUnavailable),
            other => panic!("expected deny, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_command_is_error() {
        let hook = SandboxHook::new(SandboxTarget::local("/tmp/p"));
        assert!(hook.run(ToolInvocation::new("Bash", "s1"), &ctx()).is_err());
    }
}
