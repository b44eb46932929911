//! UI actor: all console output runs on one thread.
//!
//! The orchestrator worker, the signal task and the command code all send
//! [`UiEvent`]s down a channel; this thread renders them in order, so a
//! warning printed while a step is running never tears its progress line.

use super::table::{resume_hint, summary_table};
use super::theme::Theme;
use crossterm::style::{Color, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{QueueableCommand, cursor};
use dockhand_schema::{AbortReason, OverallStatus, RunReport, StepId, StepResult};
use std::io::{IsTerminal, Stdout, Write};
use std::sync::mpsc;
use std::thread;

/// Events the UI actor renders.
#[derive(Debug)]
pub enum UiEvent {
    /// The plan is fixed.
    Planned { host: String, steps: Vec<StepId> },
    /// Step `index` (zero-based) of `total` started.
    StepStarted {
        step: StepId,
        index: usize,
        total: usize,
    },
    StepFinished(StepResult),
    Aborted(AbortReason),
    /// Final summary.
    Finished(Box<RunReport>),
    Info(String),
    Warning(String),
    /// Acknowledge once every earlier event has been rendered.
    Sync(tokio::sync::oneshot::Sender<()>),
    Shutdown,
}

/// Handle to the UI actor thread
#[derive(Debug)]
pub struct UiActor {
    sender: mpsc::Sender<UiEvent>,
    _handle: thread::JoinHandle<()>,
}

impl UiActor {
    /// Spawn the actor, rendering to stdout.
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || {
            let stdout = std::io::stdout();
            let interactive = stdout.is_terminal();
            run_event_loop(&receiver, &mut Renderer::new(stdout, interactive));
        });
        Self {
            sender,
            _handle: handle,
        }
    }

    /// Get a cloneable sender for this actor
    pub fn sender(&self) -> mpsc::Sender<UiEvent> {
        self.sender.clone()
    }
}

impl Drop for UiActor {
    fn drop(&mut self) {
        let _ = self.sender.send(UiEvent::Shutdown);
    }
}

fn run_event_loop(receiver: &mpsc::Receiver<UiEvent>, renderer: &mut Renderer) {
    while let Ok(event) = receiver.recv() {
        match event {
            UiEvent::Planned { host, steps } => renderer.planned(&host, &steps),
            UiEvent::StepStarted { step, index, total } => renderer.started(step, index, total),
            UiEvent::StepFinished(result) => renderer.finished_step(&result),
            UiEvent::Aborted(reason) => renderer.aborted(&reason),
            UiEvent::Finished(report) => renderer.summary(&report),
            UiEvent::Info(msg) => renderer.message(renderer.theme.icons.info, None, &msg),
            UiEvent::Warning(msg) => {
                let color = renderer.theme.colors.warning;
                renderer.message(renderer.theme.icons.warning, Some(color), &msg);
            }
            UiEvent::Sync(tx) => {
                let _ = tx.send(());
            }
            UiEvent::Shutdown => break,
        }
    }
}

/// Line-oriented renderer.
///
/// On a terminal a running step shows as a live `●` line that is rewritten
/// in place when the step finishes. Elsewhere only finished lines are
/// written and no escape sequences are emitted.
struct Renderer {
    out: Stdout,
    interactive: bool,
    theme: Theme,
    /// Text of the live line, if one is on screen.
    active: Option<String>,
    /// `[i/n]` prefix for the step in flight.
    position: String,
}

impl Renderer {
    fn new(out: Stdout, interactive: bool) -> Self {
        Self {
            out,
            interactive,
            theme: Theme::default(),
            active: None,
            position: String::new(),
        }
    }

    fn planned(&mut self, host: &str, steps: &[StepId]) {
        let count = steps.len();
        let noun = if count == 1 { "step" } else { "steps" };
        self.line(
            self.theme.icons.info,
            None,
            &format!("{host}: {count} {noun} planned"),
        );
    }

    fn started(&mut self, step: StepId, index: usize, total: usize) {
        self.position = format!("[{}/{total}]", index + 1);
        if !self.interactive {
            return;
        }
        let text = format!("{} {}", self.position, step.label());
        self.put(self.theme.icons.active, Some(self.theme.colors.active), &text, false);
        self.active = Some(text);
    }

    fn finished_step(&mut self, result: &StepResult) {
        self.clear_active();
        let (icon, color) = self.theme.status(result.status);
        let mut text = format!("{} {}", self.position, result.id.label());
        if !result.detail.is_empty() {
            text.push_str(": ");
            text.push_str(&result.detail);
        }
        self.line(icon, Some(color), &text);
        if let Some(command) = result.command.as_deref().filter(|_| !result.status.is_ok()) {
            let secondary = self.theme.colors.secondary;
            self.line(" ", Some(secondary), &format!("  command: {command}"));
            if let Some(stderr) = result.stderr.as_deref().filter(|s| !s.is_empty()) {
                for err_line in stderr.lines().take(10) {
                    self.line(" ", Some(secondary), &format!("  {err_line}"));
                }
            }
        }
    }

    fn aborted(&mut self, reason: &AbortReason) {
        self.clear_active();
        let (icon, color) = (self.theme.icons.error, self.theme.colors.error);
        self.line(icon, Some(color), &format!("aborted: {reason}"));
    }

    fn summary(&mut self, report: &RunReport) {
        self.clear_active();
        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "{}", summary_table(report));
        let (icon, color) = match report.overall_status {
            OverallStatus::Success => (self.theme.icons.success, self.theme.colors.success),
            OverallStatus::SuccessUnverified => {
                (self.theme.icons.warning, self.theme.colors.warning)
            }
            OverallStatus::Failed => (self.theme.icons.error, self.theme.colors.error),
        };
        self.line(
            icon,
            Some(color),
            &format!("{} in {:.1}s", report.overall_status, report.elapsed_secs()),
        );
        if let Some(hint) = resume_hint(report) {
            let secondary = self.theme.colors.secondary;
            self.line(" ", Some(secondary), &format!("resume with: {hint}"));
        }
        let _ = self.out.flush();
    }

    /// Print a message without losing the live line.
    fn message(&mut self, icon: &str, color: Option<Color>, msg: &str) {
        let live = self.active.take();
        if live.is_some() {
            self.erase_line();
        }
        self.line(icon, color, msg);
        if let Some(text) = live {
            self.put(self.theme.icons.active, Some(self.theme.colors.active), &text, false);
            self.active = Some(text);
        }
    }

    fn clear_active(&mut self) {
        if self.active.take().is_some() {
            self.erase_line();
        }
    }

    fn erase_line(&mut self) {
        let _ = self.out.queue(cursor::MoveToColumn(0));
        let _ = self.out.queue(Clear(ClearType::CurrentLine));
    }

    fn line(&mut self, icon: &str, color: Option<Color>, text: &str) {
        self.put(icon, color, text, true);
    }

    fn put(&mut self, icon: &str, color: Option<Color>, text: &str, newline: bool) {
        match color.filter(|_| self.interactive) {
            Some(color) => {
                let _ = self.out.queue(SetForegroundColor(color));
                let _ = write!(self.out, "  {icon}");
                let _ = self.out.queue(ResetColor);
                let _ = write!(self.out, " {text}");
            }
            None => {
                let _ = write!(self.out, "  {icon} {text}");
            }
        }
        if newline {
            let _ = writeln!(self.out);
        }
        let _ = self.out.flush();
    }
}
