//! Reporter trait for progress output
//!
//! The orchestrator reports through this trait so it never depends on a
//! particular terminal UI. Every method has a no-op default; a reporter
//! only overrides what it displays.

use dockhand_schema::{AbortReason, HostProfile, RunReport, StepId, StepResult};

/// Receives orchestrator progress events.
pub trait Reporter: Send + Sync {
    /// The plan is known; `steps` will run in this order.
    fn planned(&self, _host: &HostProfile, _steps: &[StepId]) {}

    /// Step `index` (zero-based) of `total` is starting.
    fn step_started(&self, _step: StepId, _index: usize, _total: usize) {}

    /// A step finished; this is the per-step progress boundary.
    fn step_finished(&self, _result: &StepResult) {}

    /// The run stopped early.
    fn aborted(&self, _reason: &AbortReason) {}

    /// The final report is ready.
    fn finished(&self, _report: &RunReport) {}

    /// Log an informational message.
    fn info(&self, _msg: &str) {}

    /// Log a warning message.
    fn warning(&self, _msg: &str) {}
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn planned(&self, host: &HostProfile, steps: &[StepId]) {
        (**self).planned(host, steps);
    }
    fn step_started(&self, step: StepId, index: usize, total: usize) {
        (**self).step_started(step, index, total);
    }
    fn step_finished(&self, result: &StepResult) {
        (**self).step_finished(result);
    }
    fn aborted(&self, reason: &AbortReason) {
        (**self).aborted(reason);
    }
    fn finished(&self, report: &RunReport) {
        (**self).finished(report);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

/// A reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}
