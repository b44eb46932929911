//! Console implementation of the orchestrator's [`Reporter`].

use super::actor::{UiActor, UiEvent};
use dockhand_core::Reporter;
use dockhand_schema::{AbortReason, HostProfile, RunReport, StepId, StepResult};
use std::sync::mpsc;

/// Forwards orchestrator events to the UI actor.
#[derive(Debug)]
pub struct ConsoleReporter {
    sender: mpsc::Sender<UiEvent>,
    _actor: UiActor,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        let actor = UiActor::spawn();
        Self {
            sender: actor.sender(),
            _actor: actor,
        }
    }

    fn send(&self, event: UiEvent) {
        let _ = self.sender.send(event);
    }

    /// Wait until everything sent so far is on screen.
    pub async fn flush(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.send(UiEvent::Sync(tx));
        let _ = rx.await;
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn planned(&self, host: &HostProfile, steps: &[StepId]) {
        let dist = &host.distribution;
        self.send(UiEvent::Planned {
            host: format!("{} ({})", dist.name, host.architecture),
            steps: steps.to_vec(),
        });
    }

    fn step_started(&self, step: StepId, index: usize, total: usize) {
        self.send(UiEvent::StepStarted { step, index, total });
    }

    fn step_finished(&self, result: &StepResult) {
        self.send(UiEvent::StepFinished(result.clone()));
    }

    fn aborted(&self, reason: &AbortReason) {
        self.send(UiEvent::Aborted(reason.clone()));
    }

    fn finished(&self, report: &RunReport) {
        self.send(UiEvent::Finished(Box::new(report.clone())));
    }

    fn info(&self, msg: &str) {
        self.send(UiEvent::Info(msg.to_string()));
    }

    fn warning(&self, msg: &str) {
        self.send(UiEvent::Warning(msg.to_string()));
    }
}
