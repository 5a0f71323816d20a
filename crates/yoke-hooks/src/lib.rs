//! YokeFlow Hooks: the pre-tool hooks registered for every agent session
//!
//! # Hook Order
//!
//! ```text
//! invocation → diagnostic (*) → security (Bash) → sandbox (Bash) → executor
//!                                    ↓ deny            ↓ deny
//!                                 blocked          no backend
//! ```
//!
//! Security always runs before sandbox routing, so a command is checked in
//! the exact form the agent wrote it, before any container wrapper exists.

mod diagnostic;
mod sandbox;
mod security;

pub use diagnostic::DiagnosticHook;
pub use sandbox::{SandboxHook, ROUTE_ARGUMENT};
pub use security::{SecurityHook, MISSING_COMMAND_RULE};

use tracing::info;
use yoke_core::{GateResult, GovernanceConfig, HookPipeline, SessionContext, ToolInvocation};
use yoke_sandbox::{verification_route, RoutingError, SandboxTarget, VerificationRoute};

// ============================================================================
// CONVENIENCE BUILDERS
// ============================================================================

/// Diagnostic → security → sandbox, the order every session registers.
pub fn standard_pipeline(config: &GovernanceConfig, target: SandboxTarget) -> HookPipeline {
    HookPipeline::new(vec![
        Box::new(DiagnosticHook::new()),
        Box::new(SecurityHook::from_config(config)),
        Box::new(SandboxHook::new(target)),
    ])
}

/// Blocklist only, for callers that route commands themselves.
pub fn security_pipeline(config: &GovernanceConfig) -> HookPipeline {
    HookPipeline::new(vec![Box::new(SecurityHook::from_config(config))])
}

// ============================================================================
// SESSION GATE
// ============================================================================

/// Everything fixed at session start: context, hook chain and verification wiring.
pub struct SessionGate {
    ctx: SessionContext,
    pipeline: HookPipeline,
    verification: VerificationRoute,
}

impl SessionGate {
    /// Build the gate for one session. Fails when the selected backend has no
    /// live handle, since neither commands nor verification could run.
    pub fn open(
        config: &GovernanceConfig,
        ctx: SessionContext,
        target: SandboxTarget,
    ) -> Result<Self, RoutingError> {
        let verification = verification_route(&target, config.use_container_playwright)?;
        let backend = target.backend();
        let pipeline = standard_pipeline(config, target);

        info!(
            session_id = %ctx.session_id,
            trace_id = %ctx.trace_id,
            backend = %backend,
            pipeline = pipeline.pipeline_id(),
            "session gate opened"
        );

        Ok(Self {
            ctx,
            pipeline,
            verification,
        })
    }

    pub fn check(&self, invocation: ToolInvocation) -> GateResult {
        self.pipeline.run(invocation, &self.ctx)
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn verification(&self) -> &VerificationRoute {
        &self.verification
    }
}
