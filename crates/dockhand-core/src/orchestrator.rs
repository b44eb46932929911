//! The install orchestrator.
//!
//! A small state machine:
//!
//! ```text
//! Pending -> Planning -> Executing(0) -> ... -> Executing(n-1) -> Completed
//!               |              |
//!               +--------------+------------------------------> Aborted(reason)
//! ```
//!
//! [`Orchestrator::advance`] runs exactly one step and hands its result back
//! to the caller, which is the progress boundary for any UI. Cancellation is
//! cooperative: the flag is only inspected between steps, never while a
//! command is running.
//!
//! # Failure policy
//!
//! - A failed non-verify step aborts the run; later steps depend on it.
//! - A failed `verify` is recorded and the run still completes, classified
//!   as `SuccessUnverified`.
//! - A privilege failure, before or during a step, aborts with
//!   `AbortReason::Privilege`.
//! - Nothing is retried.

use crate::error::StepError;
use crate::exec::CommandRunner;
use crate::probe::check_supported;
use crate::reporter::{NullReporter, Reporter};
use crate::steps::{StepContext, StepDefinition, all_steps, failure_result};
use chrono::{DateTime, Utc};
use dockhand_schema::{
    AbortReason, EffectiveConfig, HostProfile, RunOutcome, RunReport, StepId, StepResult,
    StepStatus,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

/// Where the orchestrator is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Nothing has happened yet.
    Pending,
    /// The plan is computed and the host accepted; no step has run.
    Planning,
    /// The step at this plan index runs next.
    Executing(usize),
    /// Every planned step was attempted.
    Completed,
    /// Stopped early.
    Aborted(AbortReason),
}

impl OrchestratorState {
    /// `Completed` or `Aborted`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted(_))
    }
}

/// Drives one installation run.
#[derive(Debug)]
pub struct Orchestrator<R> {
    config: EffectiveConfig,
    host: HostProfile,
    runner: R,
    user: Option<String>,
    state: OrchestratorState,
    plan: Vec<StepDefinition>,
    results: Vec<StepResult>,
    started_at: DateTime<Utc>,
}

impl<R: CommandRunner> Orchestrator<R> {
    /// A fresh orchestrator in the `Pending` state.
    pub fn new(config: EffectiveConfig, host: HostProfile, runner: R) -> Self {
        Self {
            config,
            host,
            runner,
            user: None,
            state: OrchestratorState::Pending,
            plan: Vec::new(),
            results: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Use `user` for the `group` step instead of detecting it.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Current state.
    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    /// Results recorded so far.
    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    /// Host this run targets.
    pub fn host(&self) -> &HostProfile {
        &self.host
    }

    /// Compute the plan: the enabled steps in canonical order.
    ///
    /// An unsupported host moves straight to `Aborted` and the plan is still
    /// returned, so callers can show what would have run. Calling this again
    /// returns the same plan without side effects.
    pub fn plan(&mut self) -> Vec<StepId> {
        if self.state == OrchestratorState::Pending {
            self.started_at = Utc::now();
            self.plan = all_steps()
                .into_iter()
                .filter(|step| step.enabled_in(&self.config))
                .collect();
            self.state = match check_supported(&self.host) {
                Ok(()) => OrchestratorState::Planning,
                Err(err) => {
                    warn!(error = %err, "host is not supported");
                    OrchestratorState::Aborted(AbortReason::UnsupportedHost(err.to_string()))
                }
            };
            debug!(plan = ?self.plan_ids(), state = ?self.state, "planned");
        }
        self.plan_ids()
    }

    fn plan_ids(&self) -> Vec<StepId> {
        self.plan.iter().map(|s| s.id()).collect()
    }

    /// Run the next step and return its result; `None` once terminal.
    pub fn advance(&mut self) -> Option<StepResult> {
        self.advance_with(&NullReporter)
    }

    fn advance_with(&mut self, reporter: &dyn Reporter) -> Option<StepResult> {
        if self.state == OrchestratorState::Pending {
            self.plan();
        }

        let index = match self.state {
            OrchestratorState::Planning => {
                if self.plan.is_empty() {
                    self.state = OrchestratorState::Completed;
                    return None;
                }
                if let Err(err) = self.runner.ensure_privileges() {
                    error!(error = %err, "cannot obtain elevated privileges");
                    self.state = OrchestratorState::Aborted(AbortReason::Privilege(err.to_string()));
                    return None;
                }
                0
            }
            OrchestratorState::Executing(index) => index,
            OrchestratorState::Pending
            | OrchestratorState::Completed
            | OrchestratorState::Aborted(_) => return None,
        };

        let step = self.plan[index];
        let id = step.id();
        self.state = OrchestratorState::Executing(index);
        reporter.step_started(id, index, self.plan.len());

        let span = info_span!("step", step = %id, index, total = self.plan.len());
        let _guard = span.enter();
        debug!("starting");

        let ctx = StepContext {
            host: &self.host,
            config: &self.config,
            runner: &self.runner,
            user: self.user.as_deref(),
        };
        let start = Instant::now();
        let outcome = step.execute(&ctx);
        let elapsed = start.elapsed();

        let (result, privilege_failure) = match outcome {
            Ok(result) => (result, None),
            Err(err) => {
                let privilege = match &err {
                    StepError::Privilege(p) => Some(p.to_string()),
                    _ => None,
                };
                (failure_result(id, &err), privilege)
            }
        };
        let result = result.with_duration(elapsed);

        match result.status {
            StepStatus::Success | StepStatus::Skipped => {
                debug!(status = %result.status, detail = %result.detail, "finished");
            }
            StepStatus::Failed => {
                error!(detail = %result.detail, exit_code = ?result.exit_code, "failed");
            }
        }

        self.state = if let Some(why) = privilege_failure {
            OrchestratorState::Aborted(AbortReason::Privilege(why))
        } else if result.status == StepStatus::Failed && id != StepId::Verify {
            OrchestratorState::Aborted(AbortReason::StepFailed(id))
        } else if index + 1 == self.plan.len() {
            OrchestratorState::Completed
        } else {
            OrchestratorState::Executing(index + 1)
        };

        self.results.push(result.clone());
        Some(result)
    }

    /// Stop before the next step. No effect once terminal.
    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            info!("cancellation requested; stopping before the next step");
            self.state = OrchestratorState::Aborted(AbortReason::Cancelled);
        }
    }

    /// Finalize the report. Planned steps that never ran are listed in
    /// `not_attempted`; a run finished before reaching a terminal state is
    /// recorded as cancelled.
    pub fn finish(self) -> RunReport {
        let outcome = match self.state {
            OrchestratorState::Completed => RunOutcome::Completed,
            OrchestratorState::Aborted(reason) => RunOutcome::Aborted(reason),
            OrchestratorState::Pending
            | OrchestratorState::Planning
            | OrchestratorState::Executing(_) => RunOutcome::Aborted(AbortReason::Cancelled),
        };
        let not_attempted: Vec<StepId> = self
            .plan
            .iter()
            .map(|s| s.id())
            .filter(|id| !self.results.iter().any(|r| r.id == *id))
            .collect();
        RunReport::new(
            self.results,
            not_attempted,
            outcome,
            Some(self.host),
            self.started_at,
        )
    }

    /// Drive the whole plan, reporting progress, and return the report.
    pub fn run(mut self, reporter: &dyn Reporter, cancel: &AtomicBool) -> RunReport {
        let plan = self.plan();
        reporter.planned(&self.host, &plan);

        loop {
            if cancel.load(Ordering::SeqCst) {
                self.cancel();
            }
            match self.advance_with(reporter) {
                Some(result) => reporter.step_finished(&result),
                None => break,
            }
        }

        if let OrchestratorState::Aborted(reason) = &self.state {
            reporter.aborted(reason);
        }
        let report = self.finish();
        reporter.finished(&report);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExecError, PrivilegeError};
    use crate::exec::{CommandSpec, ExecutionResult};
    use dockhand_schema::{Distribution, DistroId};
    use std::sync::Mutex;

    /// Every command succeeds; optionally refuses privileges.
    #[derive(Default)]
    struct Permissive {
        deny_privileges: bool,
        commands: Mutex<Vec<String>>,
    }

    impl CommandRunner for Permissive {
        fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult, ExecError> {
            self.commands.lock().unwrap().push(spec.display());
            Ok(ExecutionResult {
                exit_code: Some(0),
                stdout: "install ok installed docker".to_string(),
                ..ExecutionResult::default()
            })
        }

        fn ensure_privileges(&self) -> Result<(), PrivilegeError> {
            if self.deny_privileges {
                Err(PrivilegeError::PasswordRequired)
            } else {
                Ok(())
            }
        }
    }

    fn host(machine: &str) -> HostProfile {
        HostProfile::new(
            machine,
            Distribution {
                id: DistroId::Ubuntu,
                name: "Ubuntu 24.04 LTS".to_string(),
                version: "24.04".to_string(),
                codename: Some("noble".to_string()),
            },
            "https://download.docker.com/linux",
        )
    }

    #[test]
    fn test_state_transitions() {
        let config = EffectiveConfig::builder()
            .only_steps(&[StepId::Service, StepId::Verify])
            .build();
        let mut orch = Orchestrator::new(config, host("x86_64"), Permissive::default())
            .with_user("alice");
        assert_eq!(orch.state(), &OrchestratorState::Pending);
        assert_eq!(orch.plan(), vec![StepId::Service, StepId::Verify]);
        assert_eq!(orch.state(), &OrchestratorState::Planning);

        let first = orch.advance().unwrap();
        assert_eq!(first.id, StepId::Service);
        assert_eq!(orch.state(), &OrchestratorState::Executing(1));

        let second = orch.advance().unwrap();
        assert_eq!(second.id, StepId::Verify);
        assert_eq!(orch.state(), &OrchestratorState::Completed);
        assert!(orch.advance().is_none());

        let report = orch.finish();
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert!(report.not_attempted.is_empty());
    }

    #[test]
    fn test_privilege_failure_runs_nothing() {
        let runner = Permissive {
            deny_privileges: true,
            ..Permissive::default()
        };
        let orch = Orchestrator::new(EffectiveConfig::default(), host("x86_64"), runner);
        let report = orch.run(&NullReporter, &AtomicBool::new(false));
        assert!(report.results.is_empty());
        assert_eq!(report.not_attempted, StepId::ALL.to_vec());
        assert!(matches!(
            report.outcome,
            RunOutcome::Aborted(AbortReason::Privilege(_))
        ));
    }

    #[test]
    fn test_cancel_before_first_step() {
        let orch = Orchestrator::new(EffectiveConfig::default(), host("x86_64"), Permissive::default());
        let report = orch.run(&NullReporter, &AtomicBool::new(true));
        assert!(report.results.is_empty());
        assert_eq!(report.outcome, RunOutcome::Aborted(AbortReason::Cancelled));
        assert_eq!(report.resume_steps(), StepId::ALL.to_vec());
    }

    #[test]
    fn test_empty_plan_completes() {
        let config = EffectiveConfig::builder().only_steps(&[]).build();
        let mut orch = Orchestrator::new(config, host("x86_64"), Permissive::default());
        assert!(orch.advance().is_none());
        assert_eq!(orch.state(), &OrchestratorState::Completed);
    }

    #[test]
    fn test_unsupported_host_aborts_in_planning() {
        let runner = std::sync::Arc::new(Permissive::default());
        let mut orch = Orchestrator::new(EffectiveConfig::default(), host("mips"), runner.clone());
        orch.plan();
        assert!(matches!(
            orch.state(),
            OrchestratorState::Aborted(AbortReason::UnsupportedHost(_))
        ));
        assert!(orch.advance().is_none());
        assert!(runner.commands.lock().unwrap().is_empty());
    }
}
