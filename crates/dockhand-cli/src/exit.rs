//! Process exit codes.
//!
//! | code | meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | completed; every step succeeded or was skipped       |
//! | 1    | a step failed, or the run aborted (incl. privileges) |
//! | 2    | configuration or usage error; nothing ran            |
//! | 3    | host could not be identified or is unsupported       |
//! | 4    | completed, but verification could not confirm it     |
//! | 130  | cancelled                                            |

use dockhand_core::{ConfigError, ProbeError, UnsupportedHostError};
use dockhand_schema::{AbortReason, OverallStatus, RunOutcome, RunReport};

pub const SUCCESS: u8 = 0;
pub const FAILURE: u8 = 1;
pub const CONFIG_ERROR: u8 = 2;
pub const UNSUPPORTED_HOST: u8 = 3;
pub const UNVERIFIED: u8 = 4;
pub const CANCELLED: u8 = 130;

/// Exit code for a finished run.
pub fn for_report(report: &RunReport) -> u8 {
    match &report.outcome {
        RunOutcome::Aborted(AbortReason::Cancelled) => CANCELLED,
        RunOutcome::Aborted(AbortReason::UnsupportedHost(_)) => UNSUPPORTED_HOST,
        RunOutcome::Aborted(_) => FAILURE,
        RunOutcome::Completed => match report.overall_status {
            OverallStatus::Success => SUCCESS,
            OverallStatus::SuccessUnverified => UNVERIFIED,
            OverallStatus::Failed => FAILURE,
        },
    }
}

/// Exit code for an error that stopped a command before any step ran.
pub fn for_error(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() {
        CONFIG_ERROR
    } else if err.downcast_ref::<ProbeError>().is_some()
        || err.downcast_ref::<UnsupportedHostError>().is_some()
    {
        UNSUPPORTED_HOST
    } else {
        FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockhand_schema::{StepId, StepResult};

    fn report(
        results: Vec<StepResult>,
        not_attempted: Vec<StepId>,
        outcome: RunOutcome,
    ) -> RunReport {
        RunReport::new(results, not_attempted, outcome, None, chrono::Utc::now())
    }

    #[test]
    fn test_report_codes() {
        let ok = report(
            vec![StepResult::success(StepId::Engine, "installed")],
            vec![],
            RunOutcome::Completed,
        );
        assert_eq!(for_report(&ok), SUCCESS);

        let unverified = report(
            vec![
                StepResult::success(StepId::Engine, "installed"),
                StepResult::failed(StepId::Verify, "docker info failed"),
            ],
            vec![],
            RunOutcome::Completed,
        );
        assert_eq!(for_report(&unverified), UNVERIFIED);

        let failed = report(
            vec![StepResult::failed(StepId::Engine, "apt-get failed")],
            vec![StepId::Verify],
            RunOutcome::Aborted(AbortReason::StepFailed(StepId::Engine)),
        );
        assert_eq!(for_report(&failed), FAILURE);

        let cancelled = report(vec![], vec![StepId::Engine], RunOutcome::Aborted(AbortReason::Cancelled));
        assert_eq!(for_report(&cancelled), CANCELLED);

        let unsupported = report(
            vec![],
            vec![StepId::Engine],
            RunOutcome::Aborted(AbortReason::UnsupportedHost("mips".to_string())),
        );
        assert_eq!(for_report(&unsupported), UNSUPPORTED_HOST);
    }

    #[test]
    fn test_error_codes() {
        let config: anyhow::Error = ConfigError::InvalidRepoUrl("ftp://x".to_string()).into();
        assert_eq!(for_error(&config), CONFIG_ERROR);

        let probe: anyhow::Error = ProbeError::Unidentifiable.into();
        assert_eq!(for_error(&probe), UNSUPPORTED_HOST);

        let other = anyhow::anyhow!("worker panicked");
        assert_eq!(for_error(&other), FAILURE);
    }
}
