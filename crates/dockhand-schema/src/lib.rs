//! Shared value types for dockhand.
//!
//! Everything here is plain data: what the prober detected, what the
//! resolver decided, and what the orchestrator did. Behaviour lives in
//! `dockhand-core`.

pub mod arch;
pub mod config;
pub mod host;
pub mod report;
pub mod step;

// Re-exports
pub use arch::*;
pub use config::{
    ConfigDocument, DEFAULT_ADDITIONAL_PACKAGES, DEFAULT_REPOSITORY_BASE_URL, EffectiveConfig,
    EffectiveConfigBuilder, LogLevel, ParseLogLevelError,
};
pub use host::{Distribution, DistroId, HostProfile, PackageFamily, derive_repo_url};
pub use report::{AbortReason, OverallStatus, RunOutcome, RunReport, StepResult, StepStatus};
pub use step::{StepId, UnknownStepError};
