//! YokeFlow Core: invocation model, Hook trait, HookPipeline and configuration
//!
//! Every tool invocation the agent attempts flows through a `HookPipeline`
//! before it reaches an executor. The same invocation shape is what the
//! session log records and what the quality scorer replays afterwards.
//!
//! ```text
//! ToolInvocation → hook₁ → hook₂ → … → GateResult { decision, invocation }
//!                    ↓ deny
//!                  stop (no later hook, no executor)
//! ```

pub mod config;
pub mod context;
pub mod data_model;
pub mod decision;
pub mod error;
pub mod hook;
pub mod runner;

pub use config::{GovernanceConfig, SandboxBackend, YokeConfig};
pub use context::SessionContext;
pub use data_model::{SessionLogEntry, ToolInvocation, ToolKind, ToolResult};
pub use decision::{Denial, DenyCause, PolicyDecision};
pub use error::YokeError;
pub use hook::{Hook, HookError, HookOutcome, ToolMatcher};
pub use runner::{GateResult, HookPipeline, HookTrace};

/// Engine version
pub const YOKE_VERSION: &str = "1.0.0";
