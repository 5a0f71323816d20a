//! Hook Pipeline: runs hooks in registration order and short-circuits on deny
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::context::SessionContext;
use crate::data_model::ToolInvocation;
use crate::decision::{Denial, PolicyDecision};
use crate::error::YokeError;
use crate::hook::{Hook, HookOutcome};

/// Record of one hook's pass over an invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookTrace {
    pub id: String,
    pub in_hash: String,
    pub out_hash: String,
    pub rewritten: bool,
    pub latency_us: u64,
    pub verdict: String,
}

/// Final decision plus the invocation as the last hook left it
#[derive(Debug, Clone)]
pub struct GateResult {
    pub decision: PolicyDecision,
    pub invocation: ToolInvocation,
    pub traces: Vec<HookTrace>,
}

impl GateResult {
    pub fn is_allowed(&self) -> bool {
        self.decision.is_allowed()
    }

    /// The invocation to execute, or the denial as an error.
    pub fn into_result(self) -> Result<ToolInvocation, YokeError> {
        match self.decision {
            PolicyDecision::Allow => Ok(self.invocation),
            PolicyDecision::Deny(denial) => Err(denial.into()),
        }
    }
}

pub struct HookPipeline {
    hooks: Vec<Box<dyn Hook>>,
    pipeline_id: String,
}

impl HookPipeline {
    pub fn new(hooks: Vec<Box<dyn Hook>>) -> Self {
        let pipeline_id = hooks
            .iter()
            .map(|h| h.id().split('.').next().unwrap_or("?"))
            .collect::<Vec<_>>()
            .join("→");

        Self { hooks, pipeline_id }
    }

    /// Gate one invocation.
    ///
    /// Takes `&self` only; the pipeline holds no per-session mutable state,
    /// so each session's commands are gated strictly in the order the
    /// caller submits them.
    pub fn run(&self, invocation: ToolInvocation, ctx: &SessionContext) -> GateResult {
        let mut current = invocation;
        let mut traces = Vec::with_capacity(self.hooks.len());

        for hook in &self.hooks {
            if !hook.matcher().matches(&current) {
                continue;
            }

            let start = Instant::now();
            let in_bytes = current.canonical_bytes();
            let in_hash = hash_bytes(&in_bytes);
            let before = current.clone();

            let outcome = catch_unwind(AssertUnwindSafe(|| hook.run(before, ctx)));
            let latency_us = start.elapsed().as_micros() as u64;

            let outcome = match outcome {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    error!(
                        session_id = %ctx.session_id,
                        hook = hook.id(),
                        tool = %current.tool_name,
                        error = %e,
                        "hook failed, denying invocation"
                    );
                    HookOutcome::Deny(Denial::fault(hook.id()))
                }
                Err(_) => {
                    error!(
                        session_id = %ctx.session_id,
                        hook = hook.id(),
                        tool = %current.tool_name,
                        "hook panicked, denying invocation"
                    );
                    HookOutcome::Deny(Denial::fault(hook.id()))
                }
            };

            match outcome {
                HookOutcome::Continue(next) => {
                    let out_hash = hash_bytes(&next.canonical_bytes());
                    debug!(
                        session_id = %ctx.session_id,
                        hook = hook.id(),
                        tool = %next.tool_name,
                        rewritten = in_hash != out_hash,
                        "hook passed"
                    );
                    traces.push(HookTrace {
                        id: hook.id().to_string(),
                        rewritten: in_hash != out_hash,
                        in_hash,
                        out_hash,
                        latency_us,
                        verdict: "continue".to_string(),
                    });
                    current = next;
                }
                HookOutcome::Deny(denial) => {
                    warn!(
                        session_id = %ctx.session_id,
                        hook = hook.id(),
                        tool = %current.tool_name,
                        reason = %denial.reason,
                        "invocation denied"
                    );
                    traces.push(HookTrace {
                        id: hook.id().to_string(),
                        out_hash: in_hash.clone(),
                        in_hash,
                        rewritten: false,
                        latency_us,
                        verdict: "deny".to_string(),
                    });
                    return GateResult {
                        decision: PolicyDecision::deny(denial),
                        invocation: current,
                        traces,
                    };
                }
            }
        }

        GateResult {
            decision: PolicyDecision::allow(),
            invocation: current,
            traces,
        }
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

fn hash_bytes(data: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(data))
}
