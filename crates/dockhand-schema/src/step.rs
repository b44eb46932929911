use serde::{Deserialize, Serialize};

/// The seven installation steps, declared in execution order.
///
/// The declaration order is the dependency order: `service` needs the
/// engine installed, `verify` needs the service running. `Ord` follows it,
/// so sorting a set of ids yields a valid plan order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StepId {
    /// Base packages needed to talk to the Docker repository.
    Prerequisites,
    /// Docker Engine, CLI and containerd.
    Engine,
    /// Docker Compose v2 plugin.
    Compose,
    /// User-configured additional packages.
    Tools,
    /// Enable and start the docker service.
    Service,
    /// Add the invoking user to the `docker` group.
    Group,
    /// Confirm the runtime answers.
    Verify,
}

/// A step name that is not one of the seven known steps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown step '{0}' (expected one of: {names})", names = StepId::names().join(", "))]
pub struct UnknownStepError(pub String);

impl StepId {
    /// All steps in canonical order.
    pub const ALL: [Self; 7] = [
        Self::Prerequisites,
        Self::Engine,
        Self::Compose,
        Self::Tools,
        Self::Service,
        Self::Group,
        Self::Verify,
    ];

    /// Canonical name, accepted by `--steps`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prerequisites => "prerequisites",
            Self::Engine => "engine",
            Self::Compose => "compose",
            Self::Tools => "tools",
            Self::Service => "service",
            Self::Group => "group",
            Self::Verify => "verify",
        }
    }

    /// Human-readable description for progress output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Prerequisites => "Install prerequisite packages",
            Self::Engine => "Install Docker Engine",
            Self::Compose => "Install Docker Compose plugin",
            Self::Tools => "Install additional packages",
            Self::Service => "Enable docker service",
            Self::Group => "Add user to docker group",
            Self::Verify => "Verify installation",
        }
    }

    /// Configuration document key that toggles this step.
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Prerequisites => "install_prerequisites",
            Self::Engine => "install_docker_engine",
            Self::Compose => "install_docker_compose",
            Self::Tools => "install_additional_tools",
            Self::Service => "setup_service",
            Self::Group => "add_user_to_group",
            Self::Verify => "verify_installation",
        }
    }

    /// Zero-based position in the canonical order.
    pub fn position(&self) -> usize {
        Self::ALL
            .iter()
            .position(|s| s == self)
            .unwrap_or(Self::ALL.len())
    }

    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::as_str).collect()
    }
}

impl std::str::FromStr for StepId {
    type Err = UnknownStepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prerequisites" | "prereqs" => Ok(Self::Prerequisites),
            // `docker` is the historical name of the engine step
            "engine" | "docker" => Ok(Self::Engine),
            "compose" => Ok(Self::Compose),
            "tools" => Ok(Self::Tools),
            "service" => Ok(Self::Service),
            "group" => Ok(Self::Group),
            "verify" => Ok(Self::Verify),
            _ => Err(UnknownStepError(s.to_string())),
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order_matches_ord() {
        let mut shuffled = vec![StepId::Verify, StepId::Prerequisites, StepId::Group, StepId::Engine];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![StepId::Prerequisites, StepId::Engine, StepId::Group, StepId::Verify]
        );
        assert_eq!(StepId::Verify.position(), 6);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("docker".parse::<StepId>(), Ok(StepId::Engine));
        assert_eq!("Compose".parse::<StepId>(), Ok(StepId::Compose));
        let err = "kubernetes".parse::<StepId>().unwrap_err();
        assert!(err.to_string().contains("kubernetes"));
        assert!(err.to_string().contains("prerequisites"));
    }
}
