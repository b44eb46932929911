//! dockhand core library
//!
//! Host probing, configuration resolution, privileged command execution
//! and the step orchestrator. The CLI crate wires these together; nothing
//! here writes to the terminal.

pub mod credential;
pub mod error;
pub mod exec;
pub mod orchestrator;
pub mod paths;
pub mod probe;
pub mod reporter;
pub mod resolve;
pub mod steps;

// Re-exports
pub use credential::Credential;
pub use error::{ConfigError, ExecError, PrivilegeError, ProbeError, StepError, UnsupportedHostError};
pub use exec::{CommandRunner, CommandSpec, ExecutionResult, SystemRunner};
pub use orchestrator::{Orchestrator, OrchestratorState};
pub use probe::{ProbeSource, Prober, SystemProbeSource, check_supported};
pub use reporter::{NullReporter, Reporter};
pub use resolve::{CliOverrides, ResolveRequest, resolve};
pub use steps::{StepDefinition, all_steps};
