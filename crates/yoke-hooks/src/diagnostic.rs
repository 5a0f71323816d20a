use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;
use yoke_core::{Hook, HookError, HookOutcome, SessionContext, ToolInvocation, ToolMatcher};

/// Sees every invocation first and records that it fired. Never denies.
#[derive(Default)]
pub struct DiagnosticHook {
    seen: AtomicU64,
}

impl DiagnosticHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of invocations this hook has observed.
    pub fn invocations_seen(&self) -> u64 {
        self.seen.load(Ordering::Relaxed)
    }
}

impl Hook for DiagnosticHook {
    fn id(&self) -> &'static str {
        "diagnostic.probe.v1"
    }

    fn matcher(&self) -> ToolMatcher {
        ToolMatcher::Any
    }

    fn run(
        &self,
        invocation: ToolInvocation,
        ctx: &SessionContext,
    ) -> Result<HookOutcome, HookError> {
        let count = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            session_id = %ctx.session_id,
            trace_id = %ctx.trace_id,
            tool = %invocation.tool_name,
            count,
            "pre-tool hook fired"
        );
        Ok(HookOutcome::Continue(invocation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_everything_through() {
        let hook = DiagnosticHook::new();
        let ctx = SessionContext::new("s1", "/tmp/p");

        for inv in [
            ToolInvocation::bash("s1", "rm -rf /"),
            ToolInvocation::new("Read", "s1"),
        ] {
            match hook.run(inv.clone(), &ctx).unwrap() {
                HookOutcome::Continue(out) => assert_eq!(out, inv),
                HookOutcome::Deny(d) => panic!("unexpected deny: {}", d.reason),
            }
        }
        assert_eq!(hook.invocations_seen(), 2);
    }
}
