//! Error taxonomy for probing, configuration, privilege escalation and
//! step execution.

use dockhand_schema::{Architecture, DistroId, ParseLogLevelError, UnknownStepError};
use std::path::PathBuf;
use thiserror::Error;

/// The host could not be identified at all.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("cannot identify host: no machine architecture and no os-release data found")]
    Unidentifiable,
}

/// Configuration could not be loaded or failed validation. No step runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    UnknownStep(#[from] UnknownStepError),

    #[error(transparent)]
    InvalidLogLevel(#[from] ParseLogLevelError),

    #[error("invalid package name '{0}': only letters, digits and + . _ : - are allowed")]
    InvalidPackageName(String),

    #[error("invalid repository URL '{0}': must start with http:// or https://")]
    InvalidRepoUrl(String),

    #[error("password file not found: {}", .path.display())]
    CredentialNotFound { path: PathBuf },

    #[error(
        "password file {} has mode {mode:04o}; it must not be accessible by group or others (chmod 600)",
        .path.display()
    )]
    InsecureCredentialFile { path: PathBuf, mode: u32 },

    #[error("password file {} is empty", .path.display())]
    EmptyCredential { path: PathBuf },

    #[error("cannot write {}: file exists (use --force to overwrite)", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The detected architecture/distribution combination is not installable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedHostError {
    #[error("unknown CPU architecture '{machine}'")]
    UnknownArchitecture { machine: String },

    #[error("unrecognized distribution '{id}'")]
    UnrecognizedDistribution { id: String },

    #[error("{distro} does not ship Docker packages for {arch}")]
    ArchitectureNotSupported {
        distro: DistroId,
        arch: Architecture,
    },

    #[error("{distro} release codename is missing from os-release")]
    MissingCodename { distro: DistroId },
}

/// Elevated privileges are unavailable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrivilegeError {
    #[error("'sudo' not found and not running as root")]
    SudoMissing,

    #[error("sudo requires a password; pass --password-file or configure passwordless sudo")]
    PasswordRequired,

    #[error("sudo rejected the password from the password file")]
    IncorrectPassword,

    #[error("user is not allowed to use sudo: {0}")]
    NotPermitted(String),
}

/// A command could not be run at all.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// A step's underlying work failed.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("{}: `{command}`", describe_failure(.exit_code, .timed_out))]
    Command {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
        timed_out: bool,
    },

    #[error(transparent)]
    Privilege(#[from] PrivilegeError),

    #[error(transparent)]
    Exec(ExecError),

    #[error(transparent)]
    UnsupportedHost(#[from] UnsupportedHostError),

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

fn describe_failure(exit_code: &Option<i32>, timed_out: &bool) -> String {
    match (*timed_out, *exit_code) {
        (true, _) => "command timed out".to_string(),
        (false, Some(code)) => format!("command exited with status {code}"),
        (false, None) => "command was terminated by a signal".to_string(),
    }
}

impl From<ExecError> for StepError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Privilege(p) => Self::Privilege(p),
            other => Self::Exec(other),
        }
    }
}

impl StepError {
    /// Wrap an I/O error with a short description of what was attempted.
    pub fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}
