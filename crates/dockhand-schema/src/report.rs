//! Step outcomes and the final run report.

use crate::host::HostProfile;
use crate::step::StepId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// The step changed the host and succeeded.
    Success,
    /// The target state already held; nothing was changed.
    Skipped,
    /// The step could not reach its target state.
    Failed,
}

impl StepStatus {
    /// Returns `true` for `Success` and `Skipped`.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        })
    }
}

/// What happened when one step ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Which step.
    pub id: StepId,
    /// Outcome.
    pub status: StepStatus,
    /// Free-text diagnostic.
    pub detail: String,
    /// Exit code of the failing command, when one was run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Command line that failed, for manual reproduction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Captured stderr of the failing command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// Wall-clock duration of the step.
    pub duration_ms: u64,
}

impl StepResult {
    fn with_status(id: StepId, status: StepStatus, detail: impl Into<String>) -> Self {
        Self {
            id,
            status,
            detail: detail.into(),
            exit_code: None,
            command: None,
            stderr: None,
            duration_ms: 0,
        }
    }

    /// A step that changed the host successfully.
    pub fn success(id: StepId, detail: impl Into<String>) -> Self {
        Self::with_status(id, StepStatus::Success, detail)
    }

    /// A step whose target state already held.
    pub fn skipped(id: StepId, detail: impl Into<String>) -> Self {
        Self::with_status(id, StepStatus::Skipped, detail)
    }

    /// A failed step.
    pub fn failed(id: StepId, detail: impl Into<String>) -> Self {
        Self::with_status(id, StepStatus::Failed, detail)
    }

    /// Attach the failing command, its exit code and stderr.
    pub fn with_command(
        mut self,
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        self.command = Some(command.into());
        self.exit_code = exit_code;
        let stderr = stderr.into();
        if !stderr.trim().is_empty() {
            self.stderr = Some(stderr);
        }
        self
    }

    /// Record how long the step took.
    pub fn with_duration(mut self, duration: std::time::Duration) -> Self {
        self.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Why a run stopped before finishing its plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AbortReason {
    /// Architecture or distribution is not installable. No step ran.
    UnsupportedHost(String),
    /// Elevated privileges could not be obtained.
    Privilege(String),
    /// A non-verify step failed; later steps depend on it.
    StepFailed(StepId),
    /// The caller asked to stop between steps.
    Cancelled,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedHost(why) => write!(f, "unsupported host: {why}"),
            Self::Privilege(why) => write!(f, "cannot obtain elevated privileges: {why}"),
            Self::StepFailed(step) => write!(f, "step '{step}' failed"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Terminal state of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every planned step was attempted.
    Completed,
    /// Execution stopped early.
    Aborted(AbortReason),
}

/// Aggregate classification of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Every executed step succeeded or was skipped.
    Success,
    /// Everything installed, but the final verification could not confirm it.
    SuccessUnverified,
    /// The run aborted or a step failed.
    Failed,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::SuccessUnverified => "success, unverified",
            Self::Failed => "failed",
        })
    }
}

/// Immutable record of one orchestrator invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Results in execution order.
    pub results: Vec<StepResult>,
    /// Planned steps that never ran.
    pub not_attempted: Vec<StepId>,
    /// Completed or aborted, with reason.
    pub outcome: RunOutcome,
    /// Aggregate status.
    pub overall_status: OverallStatus,
    /// Host the run targeted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<HostProfile>,
    /// When planning began.
    pub started_at: DateTime<Utc>,
    /// When the report was finalized.
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Finalize a report, classifying its overall status.
    pub fn new(
        results: Vec<StepResult>,
        not_attempted: Vec<StepId>,
        outcome: RunOutcome,
        host: Option<HostProfile>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let overall_status = classify(&results, &outcome);
        Self {
            results,
            not_attempted,
            outcome,
            overall_status,
            host,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// The failed step, preferring a non-verify failure over verify.
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.results
            .iter()
            .find(|r| r.status == StepStatus::Failed && r.id != StepId::Verify)
            .or_else(|| {
                self.results
                    .iter()
                    .find(|r| r.status == StepStatus::Failed)
            })
    }

    /// Steps a follow-up `--steps` invocation should run to finish the job.
    pub fn resume_steps(&self) -> Vec<StepId> {
        let mut steps: Vec<StepId> = self
            .results
            .iter()
            .filter(|r| r.status == StepStatus::Failed)
            .map(|r| r.id)
            .chain(self.not_attempted.iter().copied())
            .collect();
        steps.sort();
        steps.dedup();
        steps
    }

    /// Look up the result for `step`.
    pub fn result_for(&self, step: StepId) -> Option<&StepResult> {
        self.results.iter().find(|r| r.id == step)
    }

    /// Total run time in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        let millis = (self.finished_at - self.started_at).num_milliseconds();
        millis.max(0) as f64 / 1000.0
    }
}

fn classify(results: &[StepResult], outcome: &RunOutcome) -> OverallStatus {
    if matches!(outcome, RunOutcome::Aborted(_)) {
        return OverallStatus::Failed;
    }
    let mut verify_failed = false;
    for result in results.iter().filter(|r| r.status == StepStatus::Failed) {
        if result.id == StepId::Verify {
            verify_failed = true;
        } else {
            return OverallStatus::Failed;
        }
    }
    if verify_failed {
        OverallStatus::SuccessUnverified
    } else {
        OverallStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(results: Vec<StepResult>, not_attempted: Vec<StepId>, outcome: RunOutcome) -> RunReport {
        RunReport::new(results, not_attempted, outcome, None, Utc::now())
    }

    #[test]
    fn test_all_ok_is_success() {
        let r = report(
            vec![
                StepResult::success(StepId::Engine, "installed"),
                StepResult::skipped(StepId::Verify, "already"),
            ],
            vec![],
            RunOutcome::Completed,
        );
        assert_eq!(r.overall_status, OverallStatus::Success);
        assert!(r.failed_step().is_none());
    }

    #[test]
    fn test_verify_failure_is_unverified() {
        let r = report(
            vec![
                StepResult::success(StepId::Engine, "installed"),
                StepResult::failed(StepId::Verify, "docker info failed"),
            ],
            vec![],
            RunOutcome::Completed,
        );
        assert_eq!(r.overall_status, OverallStatus::SuccessUnverified);
        assert_eq!(r.resume_steps(), vec![StepId::Verify]);
    }

    #[test]
    fn test_abort_lists_resume_steps() {
        let r = report(
            vec![
                StepResult::success(StepId::Prerequisites, "ok"),
                StepResult::failed(StepId::Engine, "apt-get failed")
                    .with_command("apt-get install", Some(100), "E: boom"),
            ],
            vec![StepId::Service, StepId::Compose],
            RunOutcome::Aborted(AbortReason::StepFailed(StepId::Engine)),
        );
        assert_eq!(r.overall_status, OverallStatus::Failed);
        assert_eq!(r.failed_step().map(|s| s.id), Some(StepId::Engine));
        assert_eq!(
            r.resume_steps(),
            vec![StepId::Engine, StepId::Compose, StepId::Service]
        );
    }

    #[test]
    fn test_blank_stderr_is_dropped() {
        let result = StepResult::failed(StepId::Tools, "x").with_command("apt-get", Some(1), "  \n");
        assert!(result.stderr.is_none());
        assert_eq!(result.exit_code, Some(1));
    }
}
