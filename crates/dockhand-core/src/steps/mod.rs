//! The step registry.
//!
//! Seven steps, closed over [`StepId`]. Each action first checks whether
//! its target state already holds and reports `Skipped` if so; host state is
//! always re-read through the [`CommandRunner`], never cached between steps.

mod install;
mod packages;
mod system;
mod verify;

pub use system::invoking_user;

use crate::error::{StepError, UnsupportedHostError};
use crate::exec::CommandRunner;
use dockhand_schema::{EffectiveConfig, HostProfile, StepId, StepResult};
use packages::PackageManager;
use std::time::Instant;

/// Everything a step action can see.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// Probed host.
    pub host: &'a HostProfile,
    /// Resolved configuration.
    pub config: &'a EffectiveConfig,
    /// Command execution seam.
    pub runner: &'a dyn CommandRunner,
    /// User for the `group` step; detected from the environment when `None`.
    pub user: Option<&'a str>,
}

impl std::fmt::Debug for StepContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepContext")
            .field("host", &self.host)
            .field("config", &self.config)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl StepContext<'_> {
    fn packages(&self) -> Result<PackageManager, StepError> {
        self.host
            .family()
            .map(PackageManager::new)
            .ok_or_else(|| {
                UnsupportedHostError::UnrecognizedDistribution {
                    id: self.host.distribution.id.to_string(),
                }
                .into()
            })
    }
}

/// One entry of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepDefinition {
    id: StepId,
}

/// Every step, in the order they must run.
pub fn all_steps() -> [StepDefinition; 7] {
    StepId::ALL.map(|id| StepDefinition { id })
}

impl StepDefinition {
    /// The step this entry runs.
    pub fn id(self) -> StepId {
        self.id
    }

    /// Whether `config` switches this step on.
    pub fn enabled_in(self, config: &EffectiveConfig) -> bool {
        config.is_enabled(self.id)
    }

    /// Run the action, keeping the typed error for the caller to inspect.
    pub fn execute(self, ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
        match self.id {
            StepId::Prerequisites => install::prerequisites(ctx),
            StepId::Engine => install::engine(ctx),
            StepId::Compose => install::compose(ctx),
            StepId::Tools => install::tools(ctx),
            StepId::Service => system::service(ctx),
            StepId::Group => system::group(ctx),
            StepId::Verify => verify::verify(ctx),
        }
    }

    /// Run the action and fold any error into a `Failed` result.
    pub fn run(
        self,
        host: &HostProfile,
        config: &EffectiveConfig,
        runner: &dyn CommandRunner,
    ) -> StepResult {
        let ctx = StepContext {
            host,
            config,
            runner,
            user: None,
        };
        let start = Instant::now();
        self.execute(&ctx)
            .unwrap_or_else(|err| failure_result(self.id, &err))
            .with_duration(start.elapsed())
    }
}

/// A `Failed` result carrying the failing command, exit code and stderr.
pub fn failure_result(id: StepId, err: &StepError) -> StepResult {
    match err {
        StepError::Command {
            command,
            exit_code,
            stderr,
            ..
        } => StepResult::failed(id, err.to_string()).with_command(
            command.clone(),
            *exit_code,
            stderr.clone(),
        ),
        other => StepResult::failed(id, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_is_fixed() {
        let ids: Vec<StepId> = all_steps().iter().map(|s| s.id()).collect();
        assert_eq!(ids, StepId::ALL.to_vec());
    }

    #[test]
    fn test_enabled_in_follows_config() {
        let config = EffectiveConfig::builder()
            .step(StepId::Group, false)
            .build();
        let enabled: Vec<StepId> = all_steps()
            .into_iter()
            .filter(|s| s.enabled_in(&config))
            .map(StepDefinition::id)
            .collect();
        assert!(!enabled.contains(&StepId::Group));
        assert_eq!(enabled.len(), 6);
    }

    #[test]
    fn test_failure_result_keeps_diagnostics() {
        let err = StepError::Command {
            command: "sudo apt-get install -y -- docker-ce".to_string(),
            exit_code: Some(100),
            stderr: "E: Unable to locate package docker-ce".to_string(),
            timed_out: false,
        };
        let result = failure_result(StepId::Engine, &err);
        assert_eq!(result.exit_code, Some(100));
        assert_eq!(
            result.command.as_deref(),
            Some("sudo apt-get install -y -- docker-ce")
        );
        assert!(result.stderr.unwrap().contains("Unable to locate"));
    }
}
