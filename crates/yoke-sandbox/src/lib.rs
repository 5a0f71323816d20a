//! YokeFlow Sandbox: routes commands to the session's execution backend
//!
//! The backend is a closed set (`none`, `container`, `remote`); each variant
//! of `SandboxTarget` has exactly one routing strategy in `route`. Creating
//! and tearing down containers or remote sandboxes is not done here.
//!
//! # Example
//!
//! ```
//! use yoke_sandbox::{route, ContainerId, SandboxTarget};
//!
//! let target = SandboxTarget::container(ContainerId::new("yokeflow-app").unwrap(), "/workspace");
//! let routed = route("npm test", &target).unwrap();
//!
//! assert_eq!(routed.inner_command(), "npm test");
//! assert!(routed.shell_line().starts_with("docker exec"));
//! ```

pub mod error;
pub mod router;
pub mod target;
pub mod verification;

pub use error::RoutingError;
pub use router::{route, ExecutableCommand};
pub use target::{ContainerId, RemoteWorkspace, SandboxTarget};
pub use verification::{verification_route, VerificationRoute, VerificationServer};
