//! Privileged command execution.
//!
//! Every command a step issues goes through a [`CommandRunner`]. The
//! production implementation, [`SystemRunner`], spawns processes directly
//! (never through a shell), escalates with `sudo` when the command is
//! privileged and the process is not root, and bounds every wait with a
//! timeout.
//!
//! # Implementation Note: credentials and sudo
//!
//! Privileged commands always run as `sudo -n -- <cmd>`, so a missing sudo
//! ticket turns into a [`PrivilegeError`] instead of a prompt that blocks
//! forever. When sudo reports that a password is required and a password
//! file is configured, the password is handed to `sudo -S -p '' -v`, which
//! only refreshes the ticket, and the command is retried once. The secret
//! therefore only ever reaches sudo itself: never an argument list, a log
//! line, or the stdin of the command being escalated.
//!
//! # Implementation Note: timeouts
//!
//! Children run in their own process group. On timeout the whole group is
//! killed, so background jobs a command started die with it. Under sudo the
//! target runs as root and cannot be signalled from here, so it is wrapped
//! in `timeout(1)`, which enforces the same limit from inside the
//! escalation.

use crate::credential::Credential;
use crate::error::{ExecError, PrivilegeError, StepError};
use std::borrow::Cow;
use std::io::{Read, Write};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Per-command timeouts, by kind of work.
pub mod timeouts {
    use std::time::Duration;

    /// Local, read-only queries (`dpkg-query`, `systemctl is-active`).
    pub const QUERY: Duration = Duration::from_secs(30);
    /// Service manager changes.
    pub const SERVICE: Duration = Duration::from_secs(90);
    /// Single-file downloads (GPG key).
    pub const DOWNLOAD: Duration = Duration::from_secs(120);
    /// Package manager operations that hit the network.
    pub const PACKAGE: Duration = Duration::from_secs(900);
    /// Pulling and running a test container.
    pub const CONTAINER: Duration = Duration::from_secs(300);
}

/// How long to wait for output pipes to drain after the child is gone.
const READER_GRACE: Duration = Duration::from_secs(3);

/// How long a killed child gets to be reaped.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// `timeout --kill-after` for escalated commands, in seconds.
const ESCALATED_KILL_AFTER: u64 = 5;

/// A command to run: program plus a discrete argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    privileged: bool,
    timeout: Duration,
}

impl CommandSpec {
    /// An unprivileged command with the query timeout.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            privileged: false,
            timeout: timeouts::QUERY,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the command.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Require elevated privileges.
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// Override the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument list.
    pub fn arg_list(&self) -> &[String] {
        &self.args
    }

    /// Extra environment.
    pub fn env_vars(&self) -> &[(String, String)] {
        &self.env
    }

    /// Whether the command needs elevated privileges.
    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    /// Timeout for this command.
    pub fn timeout_duration(&self) -> Duration {
        self.timeout
    }

    /// Shell-quoted rendering, suitable for pasting into a terminal.
    pub fn display(&self) -> String {
        let mut parts: Vec<Cow<'_, str>> = Vec::new();
        if self.privileged {
            parts.push(Cow::Borrowed("sudo"));
        }
        for (key, value) in &self.env {
            parts.push(Cow::Owned(format!("{key}={}", shell_quote(value))));
        }
        parts.push(shell_quote(&self.program));
        parts.extend(self.args.iter().map(|a| shell_quote(a)));
        parts.join(" ")
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

fn shell_quote(s: &str) -> Cow<'_, str> {
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=+,@%".contains(c));
    if safe {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(format!("'{}'", s.replace('\'', r"'\''")))
    }
}

/// Captured outcome of a command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    /// Exit code; `None` when killed by a signal or on timeout.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// The command exceeded its timeout and was killed.
    pub timed_out: bool,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

impl ExecutionResult {
    /// Exit code zero and no timeout.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Turn a non-successful result into a [`StepError::Command`].
    pub fn check(self, spec: &CommandSpec) -> Result<Self, StepError> {
        if self.success() {
            Ok(self)
        } else {
            Err(StepError::Command {
                command: spec.display(),
                exit_code: self.exit_code,
                stderr: self.stderr,
                timed_out: self.timed_out,
            })
        }
    }
}

/// Something that can run commands against the host.
///
/// Steps only ever observe host state through this trait, which keeps them
/// testable against a simulated host.
pub trait CommandRunner: Send + Sync {
    /// Run `spec`, escalating if it is privileged.
    fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult, ExecError>;

    /// Confirm that privileged commands will be able to run.
    fn ensure_privileges(&self) -> Result<(), PrivilegeError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult, ExecError> {
        (**self).run(spec)
    }

    fn ensure_privileges(&self) -> Result<(), PrivilegeError> {
        (**self).ensure_privileges()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Escalation {
    /// Already running as root.
    Root,
    /// Escalate through the sudo binary at this path.
    Sudo(PathBuf),
    /// Not root and no sudo available.
    Unavailable,
}

/// Runs commands on the local machine.
#[derive(Debug)]
pub struct SystemRunner {
    escalation: Escalation,
    credential: Option<Credential>,
}

impl SystemRunner {
    /// Detect how to escalate (root, sudo, or not at all).
    pub fn new(credential: Option<Credential>) -> Self {
        let escalation = if effective_uid() == 0 {
            Escalation::Root
        } else {
            match which::which("sudo") {
                Ok(path) => Escalation::Sudo(path),
                Err(_) => Escalation::Unavailable,
            }
        };
        debug!(?escalation, has_credential = credential.is_some(), "privilege escalation");
        Self {
            escalation,
            credential,
        }
    }

    fn with_escalation(escalation: Escalation, credential: Option<Credential>) -> Self {
        Self {
            escalation,
            credential,
        }
    }

    /// Build the process for `spec`, escalated when it is privileged.
    fn build_command(&self, spec: &CommandSpec) -> Result<Command, PrivilegeError> {
        let sudo = match (&self.escalation, spec.privileged) {
            (_, false) | (Escalation::Root, true) => None,
            (Escalation::Sudo(path), true) => Some(path),
            (Escalation::Unavailable, true) => return Err(PrivilegeError::SudoMissing),
        };

        let Some(sudo) = sudo else {
            let mut cmd = Command::new(&spec.program);
            cmd.args(&spec.args)
                .envs(spec.env.iter().map(|(k, v)| (k, v)))
                .env("LC_ALL", "C");
            return Ok(cmd);
        };

        let mut cmd = Command::new(sudo);
        cmd.args(["-n", "--", "timeout"])
            .arg(format!("--kill-after={ESCALATED_KILL_AFTER}"))
            // one second past our own limit, so the local kill wins the race
            .arg((spec.timeout.as_secs() + 1).to_string());
        if !spec.env.is_empty() {
            // sudo resets the environment; pass variables through env(1)
            cmd.arg("env");
            cmd.args(spec.env.iter().map(|(k, v)| format!("{k}={v}")));
        }
        cmd.arg(&spec.program).args(&spec.args).env("LC_ALL", "C");
        Ok(cmd)
    }

    /// `sudo -S -p '' -v`: refresh the sudo ticket from stdin, run nothing.
    fn validate_command(sudo: &Path) -> Command {
        let mut cmd = Command::new(sudo);
        cmd.args(["-S", "-p", "", "-v"]).env("LC_ALL", "C");
        cmd
    }

    /// Hand the password file to sudo once so later `-n` calls succeed.
    fn validate_credential(&self, sudo: &Path) -> Result<(), PrivilegeError> {
        let Some(credential) = &self.credential else {
            return Err(PrivilegeError::PasswordRequired);
        };
        let spec = CommandSpec::new("sudo").arg("-v").timeout(timeouts::QUERY);
        let payload = format!("{}\n", credential.expose());
        let result = spawn_and_wait(Self::validate_command(sudo), Some(&payload), &spec)
            .map_err(|err| PrivilegeError::NotPermitted(err.to_string()))?;
        if result.success() {
            debug!("sudo ticket refreshed from password file");
            return Ok(());
        }
        Err(classify_sudo_failure(&result.stderr).unwrap_or_else(|| {
            PrivilegeError::NotPermitted(first_line(&result.stderr).to_string())
        }))
    }

    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult, ExecError> {
        let cmd = self.build_command(spec)?;
        spawn_and_wait(cmd, None, spec)
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult, ExecError> {
        let result = self.execute(spec)?;
        let Escalation::Sudo(sudo) = &self.escalation else {
            return Ok(result);
        };
        if !spec.privileged || result.success() {
            return Ok(result);
        }
        match classify_sudo_failure(&result.stderr) {
            Some(PrivilegeError::PasswordRequired) if self.credential.is_some() => {
                self.validate_credential(sudo)?;
                let retried = self.execute(spec)?;
                match classify_sudo_failure(&retried.stderr).filter(|_| !retried.success()) {
                    Some(err) => Err(err.into()),
                    None => Ok(retried),
                }
            }
            Some(err) => Err(err.into()),
            None => Ok(result),
        }
    }

    fn ensure_privileges(&self) -> Result<(), PrivilegeError> {
        match &self.escalation {
            Escalation::Root => return Ok(()),
            Escalation::Unavailable => return Err(PrivilegeError::SudoMissing),
            Escalation::Sudo(_) => {}
        }

        let check = CommandSpec::new("true").privileged();
        match self.run(&check) {
            Ok(result) if result.success() => Ok(()),
            Ok(result) => Err(classify_sudo_failure(&result.stderr).unwrap_or_else(|| {
                PrivilegeError::NotPermitted(first_line(&result.stderr).to_string())
            })),
            Err(ExecError::Privilege(err)) => Err(err),
            Err(other) => Err(PrivilegeError::NotPermitted(other.to_string())),
        }
    }
}

/// Spawn `cmd`, feed it `payload`, and wait at most `spec.timeout`.
fn spawn_and_wait(
    mut cmd: Command,
    payload: Option<&str>,
    spec: &CommandSpec,
) -> Result<ExecutionResult, ExecError> {
    cmd.stdin(if payload.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    // own process group: a terminal Ctrl-C reaches only us, and a timeout
    // can take down everything the command started
    .process_group(0);

    debug!(
        command = %spec.display(),
        timeout_secs = spec.timeout.as_secs(),
        "running command"
    );

    let start = Instant::now();
    let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
        program: spec.program.clone(),
        source,
    })?;

    if let (Some(payload), Some(mut stdin)) = (payload, child.stdin.take()) {
        // sudo may exit before reading (cached ticket); a closed pipe is fine
        if let Err(source) = stdin.write_all(payload.as_bytes()) {
            if source.kind() != std::io::ErrorKind::BrokenPipe {
                kill_and_reap(&mut child);
                return Err(ExecError::Io {
                    program: spec.program.clone(),
                    source,
                });
            }
        }
    }

    let stdout_rx = spawn_reader(child.stdout.take());
    let stderr_rx = spawn_reader(child.stderr.take());

    let waited = child.wait_timeout(spec.timeout).map_err(|source| ExecError::Io {
        program: spec.program.clone(),
        source,
    })?;
    let (exit_code, timed_out) = match waited {
        Some(status) => (status.code(), false),
        None => {
            kill_and_reap(&mut child);
            (None, true)
        }
    };

    let result = ExecutionResult {
        exit_code,
        stdout: collect(&stdout_rx),
        stderr: collect(&stderr_rx),
        timed_out,
        elapsed: start.elapsed(),
    };

    if timed_out {
        warn!(
            command = %spec.display(),
            timeout_secs = spec.timeout.as_secs(),
            "command timed out and was killed"
        );
    } else {
        debug!(
            exit_code = ?result.exit_code,
            elapsed_ms = u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX),
            "command finished"
        );
    }
    Ok(result)
}

/// SIGKILL the child's process group, then reap it with a bounded wait.
fn kill_and_reap(child: &mut Child) {
    if !kill_process_group(child.id()) {
        let _ = child.kill();
    }
    match child.wait_timeout(KILL_GRACE) {
        Ok(Some(_)) => {}
        Ok(None) | Err(_) => warn!(pid = child.id(), "killed command did not exit"),
    }
}

#[allow(unsafe_code)]
fn kill_process_group(pid: u32) -> bool {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: killpg(2) only sends a signal. The child was spawned with
    // process_group(0), so its pid is the id of a group we created.
    unsafe { libc::killpg(pgid, libc::SIGKILL) == 0 }
}

/// Map sudo's own failure messages to a [`PrivilegeError`].
fn classify_sudo_failure(stderr: &str) -> Option<PrivilegeError> {
    let lower = stderr.to_lowercase();
    if lower.contains("a password is required") || lower.contains("no password was provided") {
        Some(PrivilegeError::PasswordRequired)
    } else if lower.contains("incorrect password") || lower.contains("sorry, try again") {
        Some(PrivilegeError::IncorrectPassword)
    } else if lower.contains("not in the sudoers file") || lower.contains("is not allowed to execute")
    {
        Some(PrivilegeError::NotPermitted(first_line(stderr).to_string()))
    } else {
        None
    }
}

fn first_line(s: &str) -> &str {
    s.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    if let Some(mut pipe) = pipe {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
    }
    rx
}

fn collect(rx: &mpsc::Receiver<Vec<u8>>) -> String {
    // Grandchildren can keep a pipe open after the child is killed
    rx.recv_timeout(READER_GRACE)
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

#[allow(unsafe_code)]
fn effective_uid() -> u32 {
    // SAFETY: geteuid(2) takes no arguments, has no preconditions and
    // always succeeds.
    unsafe { libc::geteuid() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> SystemRunner {
        SystemRunner::with_escalation(Escalation::Root, None)
    }

    #[test]
    fn test_captures_stdout_and_exit_code() {
        let result = local()
            .run(&CommandSpec::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]))
            .unwrap();
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
        assert!(!result.success());
    }

    #[test]
    fn test_timeout_kills_instead_of_hanging() {
        let spec = CommandSpec::new("sleep")
            .arg("10")
            .timeout(Duration::from_millis(200));
        let result = local().run(&spec).unwrap();
        assert!(result.timed_out);
        assert!(result.exit_code.is_none());
        assert!(result.elapsed < Duration::from_secs(5));
        assert!(matches!(
            result.check(&spec),
            Err(StepError::Command { timed_out: true, .. })
        ));
    }

    #[test]
    fn test_arguments_are_not_shell_interpreted() {
        let result = local()
            .run(&CommandSpec::new("echo").arg("pkg; touch /tmp/pwned"))
            .unwrap();
        assert_eq!(result.stdout.trim(), "pkg; touch /tmp/pwned");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = local()
            .run(&CommandSpec::new("definitely-not-a-real-binary-xyz"))
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    fn argv(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// A stand-in for sudo: `-S` reads a password and creates a ticket,
    /// `-n` fails without one and otherwise execs the rest of its argv.
    fn fake_sudo(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("sudo");
        std::fs::write(
            &path,
            r#"#!/bin/sh
dir=$(dirname "$0")
printf '%s\n' "$*" >> "$dir/calls"
if [ "$1" = "-S" ]; then
    read -r pw
    if [ "$pw" = "hunter2" ]; then touch "$dir/ticket"; exit 0; fi
    echo "Sorry, try again." >&2
    echo "sudo: 1 incorrect password attempt" >&2
    exit 1
fi
if [ ! -f "$dir/ticket" ]; then
    echo "sudo: a password is required" >&2
    exit 1
fi
shift 2
exec "$@"
"#,
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_escalated_command_never_carries_the_password() {
        let runner = SystemRunner::with_escalation(
            Escalation::Sudo(PathBuf::from("/usr/bin/sudo")),
            Some(Credential::new("hunter2")),
        );
        let spec = CommandSpec::new("apt-get")
            .args(["install", "-y", "--", "curl"])
            .env("DEBIAN_FRONTEND", "noninteractive")
            .timeout(Duration::from_secs(900))
            .privileged();
        let cmd = runner.build_command(&spec).unwrap();
        assert_eq!(
            argv(&cmd),
            vec![
                "-n",
                "--",
                "timeout",
                "--kill-after=5",
                "901",
                "env",
                "DEBIAN_FRONTEND=noninteractive",
                "apt-get",
                "install",
                "-y",
                "--",
                "curl"
            ]
        );
        assert!(argv(&cmd).iter().all(|a| !a.contains("hunter2")));

        let validate = SystemRunner::validate_command(Path::new("/usr/bin/sudo"));
        assert_eq!(argv(&validate), vec!["-S", "-p", "", "-v"]);
    }

    #[test]
    fn test_unprivileged_command_is_not_wrapped() {
        let runner =
            SystemRunner::with_escalation(Escalation::Sudo(PathBuf::from("/usr/bin/sudo")), None);
        let cmd = runner
            .build_command(&CommandSpec::new("dpkg-query").arg("-W"))
            .unwrap();
        assert_eq!(cmd.get_program(), "dpkg-query");
        assert_eq!(argv(&cmd), vec!["-W"]);
    }

    #[test]
    fn test_timeout_kills_background_jobs_too() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("late");
        let script = format!("(sleep 1; touch '{}') & wait", marker.display());
        let spec = CommandSpec::new("sh")
            .args(["-c", script.as_str()])
            .timeout(Duration::from_millis(200));

        let result = local().run(&spec).unwrap();
        assert!(result.timed_out);
        assert!(result.elapsed < Duration::from_secs(1));

        thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists(), "background job outlived the timeout");
    }

    #[test]
    fn test_password_validates_ticket_and_stays_out_of_target_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SystemRunner::with_escalation(
            Escalation::Sudo(fake_sudo(dir.path())),
            Some(Credential::new("hunter2")),
        );

        // cat echoes whatever reaches its stdin
        let result = runner.run(&CommandSpec::new("cat").privileged()).unwrap();
        assert!(result.success(), "stderr: {}", result.stderr);
        assert_eq!(result.stdout, "");
        assert!(dir.path().join("ticket").exists());

        let calls = std::fs::read_to_string(dir.path().join("calls")).unwrap();
        let calls: Vec<&str> = calls.lines().collect();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].starts_with("-n -- timeout"));
        assert_eq!(calls[1], "-S -p  -v");
        assert!(calls[2].starts_with("-n -- timeout"));

        // ticket cached: no second validation
        runner.ensure_privileges().unwrap();
        let calls = std::fs::read_to_string(dir.path().join("calls")).unwrap();
        assert_eq!(calls.lines().count(), 4);
    }

    #[test]
    fn test_wrong_password_is_incorrect_password() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SystemRunner::with_escalation(
            Escalation::Sudo(fake_sudo(dir.path())),
            Some(Credential::new("letmein")),
        );
        assert_eq!(
            runner.ensure_privileges(),
            Err(PrivilegeError::IncorrectPassword)
        );
        assert!(!dir.path().join("ticket").exists());
    }

    #[test]
    fn test_missing_password_is_password_required() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SystemRunner::with_escalation(Escalation::Sudo(fake_sudo(dir.path())), None);
        let err = runner
            .run(&CommandSpec::new("true").privileged())
            .unwrap_err();
        assert!(matches!(
            err,
            ExecError::Privilege(PrivilegeError::PasswordRequired)
        ));
    }

    #[test]
    fn test_no_sudo_is_privilege_error() {
        let runner = SystemRunner::with_escalation(Escalation::Unavailable, None);
        assert_eq!(
            runner.ensure_privileges(),
            Err(PrivilegeError::SudoMissing)
        );
        let err = runner
            .run(&CommandSpec::new("true").privileged())
            .unwrap_err();
        assert!(matches!(err, ExecError::Privilege(PrivilegeError::SudoMissing)));
        // unprivileged commands still run
        assert!(runner.run(&CommandSpec::new("true")).unwrap().success());
    }

    #[test]
    fn test_classify_sudo_messages() {
        assert_eq!(
            classify_sudo_failure("sudo: a password is required\n"),
            Some(PrivilegeError::PasswordRequired)
        );
        assert_eq!(
            classify_sudo_failure("Sorry, try again.\nsudo: 1 incorrect password attempt"),
            Some(PrivilegeError::IncorrectPassword)
        );
        assert!(matches!(
            classify_sudo_failure("alice is not in the sudoers file.  This incident will be reported."),
            Some(PrivilegeError::NotPermitted(_))
        ));
        assert_eq!(classify_sudo_failure("E: Unable to locate package foo"), None);
    }

    #[test]
    fn test_display_quotes_unsafe_arguments() {
        let spec = CommandSpec::new("tee")
            .arg("/etc/apt/sources.list.d/docker.list")
            .arg("deb [arch=amd64] x")
            .privileged();
        assert_eq!(
            spec.display(),
            "sudo tee /etc/apt/sources.list.d/docker.list 'deb [arch=amd64] x'"
        );
    }
}
