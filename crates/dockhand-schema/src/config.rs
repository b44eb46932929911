//! The validated, immutable run configuration.
//!
//! `EffectiveConfig` is only ever produced by [`EffectiveConfigBuilder`];
//! once built it exposes getters and nothing else. The resolver in
//! `dockhand-core` owns layering and validation and feeds the builder.

use crate::step::StepId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default Docker repository root; the distribution id is appended.
pub const DEFAULT_REPOSITORY_BASE_URL: &str = "https://download.docker.com/linux";

/// Packages installed by the `tools` step when nothing else is configured.
pub const DEFAULT_ADDITIONAL_PACKAGES: [&str; 2] = ["docker-buildx-plugin", "docker-compose-plugin"];

/// Log verbosity, in the vocabulary of the configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Every command and its output.
    Debug,
    /// Step transitions (default).
    #[default]
    Info,
    /// Only warnings and errors.
    Warning,
    /// Only errors.
    Error,
}

/// A log level string that is none of DEBUG/INFO/WARNING/ERROR.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid log level '{0}' (expected DEBUG, INFO, WARNING or ERROR)")]
pub struct ParseLogLevelError(pub String);

impl LogLevel {
    /// Upper-case name as written in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            _ => Err(ParseLogLevelError(s.to_string())),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved configuration for one run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    prerequisites: bool,
    engine: bool,
    compose: bool,
    tools: bool,
    service: bool,
    group: bool,
    verify: bool,
    log_level: LogLevel,
    credential_file: Option<PathBuf>,
    repository_base_url: String,
    additional_packages: Vec<String>,
}

impl EffectiveConfig {
    /// Start from the built-in defaults.
    pub fn builder() -> EffectiveConfigBuilder {
        EffectiveConfigBuilder::default()
    }

    /// Whether `step` is switched on.
    pub fn is_enabled(&self, step: StepId) -> bool {
        match step {
            StepId::Prerequisites => self.prerequisites,
            StepId::Engine => self.engine,
            StepId::Compose => self.compose,
            StepId::Tools => self.tools,
            StepId::Service => self.service,
            StepId::Group => self.group,
            StepId::Verify => self.verify,
        }
    }

    /// Enabled steps in canonical order.
    pub fn enabled_steps(&self) -> Vec<StepId> {
        StepId::ALL
            .into_iter()
            .filter(|s| self.is_enabled(*s))
            .collect()
    }

    /// Configured log verbosity.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Path of the sudo credential file, already `~`-expanded.
    pub fn credential_file(&self) -> Option<&Path> {
        self.credential_file.as_deref()
    }

    /// Docker repository root before the distribution id is appended.
    pub fn repository_base_url(&self) -> &str {
        &self.repository_base_url
    }

    /// Packages for the `tools` step, in install order.
    pub fn additional_packages(&self) -> &[String] {
        &self.additional_packages
    }

    /// Render back into the on-disk document shape.
    pub fn to_document(&self) -> ConfigDocument {
        ConfigDocument {
            install_prerequisites: self.prerequisites,
            install_docker_engine: self.engine,
            install_docker_compose: self.compose,
            install_additional_tools: self.tools,
            setup_service: self.service,
            add_user_to_group: self.group,
            verify_installation: self.verify,
            password_file_path: self
                .credential_file
                .as_ref()
                .map(|p| p.display().to_string()),
            log_level: self.log_level,
            docker_repo_url: self.repository_base_url.clone(),
            additional_packages: self.additional_packages.clone(),
        }
    }
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        EffectiveConfigBuilder::default().build()
    }
}

/// Builder for [`EffectiveConfig`], seeded with the built-in defaults.
#[derive(Debug, Clone)]
pub struct EffectiveConfigBuilder {
    inner: EffectiveConfig,
}

impl Default for EffectiveConfigBuilder {
    fn default() -> Self {
        Self {
            inner: EffectiveConfig {
                prerequisites: true,
                engine: true,
                compose: true,
                tools: true,
                service: true,
                group: true,
                verify: true,
                log_level: LogLevel::Info,
                credential_file: None,
                repository_base_url: DEFAULT_REPOSITORY_BASE_URL.to_string(),
                additional_packages: DEFAULT_ADDITIONAL_PACKAGES
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            },
        }
    }
}

impl EffectiveConfigBuilder {
    /// Toggle a single step.
    pub fn step(mut self, step: StepId, enabled: bool) -> Self {
        let slot = match step {
            StepId::Prerequisites => &mut self.inner.prerequisites,
            StepId::Engine => &mut self.inner.engine,
            StepId::Compose => &mut self.inner.compose,
            StepId::Tools => &mut self.inner.tools,
            StepId::Service => &mut self.inner.service,
            StepId::Group => &mut self.inner.group,
            StepId::Verify => &mut self.inner.verify,
        };
        *slot = enabled;
        self
    }

    /// Enable exactly `steps`, disabling every other step.
    pub fn only_steps(mut self, steps: &[StepId]) -> Self {
        for step in StepId::ALL {
            self = self.step(step, steps.contains(&step));
        }
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.inner.log_level = level;
        self
    }

    /// Set or clear the credential file path.
    pub fn credential_file(mut self, path: Option<PathBuf>) -> Self {
        self.inner.credential_file = path;
        self
    }

    /// Set the repository root URL.
    pub fn repository_base_url(mut self, url: impl Into<String>) -> Self {
        self.inner.repository_base_url = url.into();
        self
    }

    /// Replace the additional package list.
    pub fn additional_packages(mut self, packages: Vec<String>) -> Self {
        self.inner.additional_packages = packages;
        self
    }

    /// Freeze the configuration.
    pub fn build(self) -> EffectiveConfig {
        self.inner
    }
}

/// Full on-disk configuration document (every key present).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Run the `prerequisites` step.
    pub install_prerequisites: bool,
    /// Run the `engine` step.
    pub install_docker_engine: bool,
    /// Run the `compose` step.
    pub install_docker_compose: bool,
    /// Run the `tools` step.
    pub install_additional_tools: bool,
    /// Run the `service` step.
    pub setup_service: bool,
    /// Run the `group` step.
    pub add_user_to_group: bool,
    /// Run the `verify` step.
    pub verify_installation: bool,
    /// Sudo password file; first line is the password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_file_path: Option<String>,
    /// Log verbosity.
    pub log_level: LogLevel,
    /// Docker repository root.
    pub docker_repo_url: String,
    /// Extra packages for the `tools` step.
    pub additional_packages: Vec<String>,
}
