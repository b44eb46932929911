//! Host identification: distribution, package family and the derived
//! `HostProfile`.

use crate::arch::Architecture;
use serde::{Deserialize, Serialize};

/// Distribution identifier, as found in the `ID` field of os-release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DistroId {
    /// Ubuntu and derivatives that declare an Ubuntu base.
    Ubuntu,
    /// Debian.
    Debian,
    /// Raspberry Pi OS (32-bit userland).
    Raspbian,
    /// Fedora.
    Fedora,
    /// CentOS / CentOS Stream.
    Centos,
    /// Red Hat Enterprise Linux.
    Rhel,
    /// Anything else; kept verbatim for diagnostics.
    Unrecognized(String),
}

impl DistroId {
    /// Every id the Docker repository publishes packages for.
    pub const KNOWN: [Self; 6] = [
        Self::Ubuntu,
        Self::Debian,
        Self::Raspbian,
        Self::Fedora,
        Self::Centos,
        Self::Rhel,
    ];

    /// Classify an os-release `ID` value.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_lowercase().as_str() {
            "ubuntu" => Self::Ubuntu,
            "debian" => Self::Debian,
            "raspbian" => Self::Raspbian,
            "fedora" => Self::Fedora,
            "centos" => Self::Centos,
            "rhel" => Self::Rhel,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Path segment used by the Docker package repository.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ubuntu => "ubuntu",
            Self::Debian => "debian",
            Self::Raspbian => "raspbian",
            Self::Fedora => "fedora",
            Self::Centos => "centos",
            Self::Rhel => "rhel",
            Self::Unrecognized(id) => id,
        }
    }

    /// Package manager family, or `None` for unrecognized distributions.
    pub fn family(&self) -> Option<PackageFamily> {
        match self {
            Self::Ubuntu | Self::Debian | Self::Raspbian => Some(PackageFamily::Apt),
            Self::Fedora | Self::Centos | Self::Rhel => Some(PackageFamily::Dnf),
            Self::Unrecognized(_) => None,
        }
    }

    /// Returns `true` for every variant except [`DistroId::Unrecognized`].
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<String> for DistroId {
    fn from(value: String) -> Self {
        Self::from_id(&value)
    }
}

impl From<DistroId> for String {
    fn from(value: DistroId) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for DistroId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which package manager drives installation on a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageFamily {
    /// dpkg/apt based (Debian, Ubuntu, Raspbian).
    Apt,
    /// rpm/dnf based (Fedora, CentOS, RHEL).
    Dnf,
}

/// Distribution as reported by the OS identification file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// Classified id.
    pub id: DistroId,
    /// `PRETTY_NAME`, or the raw id when absent.
    pub name: String,
    /// `VERSION_ID` (e.g. `22.04`), empty when absent.
    pub version: String,
    /// Release codename (`jammy`, `bookworm`), required by apt sources.
    pub codename: Option<String>,
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(codename) = &self.codename {
            write!(f, " ({codename})")?;
        }
        Ok(())
    }
}

/// Everything the steps need to know about the machine, probed once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProfile {
    /// Classified CPU architecture.
    pub architecture: Architecture,
    /// Raw machine string the architecture was derived from.
    pub machine: String,
    /// Detected distribution.
    pub distribution: Distribution,
    /// Docker package repository for this distribution.
    pub package_repo_url: String,
}

impl HostProfile {
    /// Build a profile, deriving the repository URL from `repository_base_url`.
    pub fn new(
        machine: impl Into<String>,
        distribution: Distribution,
        repository_base_url: &str,
    ) -> Self {
        let machine = machine.into();
        let package_repo_url = derive_repo_url(repository_base_url, &distribution.id);
        Self {
            architecture: Architecture::from_machine(&machine),
            machine,
            distribution,
            package_repo_url,
        }
    }

    /// Package manager family of the detected distribution.
    pub fn family(&self) -> Option<PackageFamily> {
        self.distribution.id.family()
    }
}

/// Join a repository base URL with a distribution id.
///
/// A trailing segment that already names a known distribution is replaced,
/// so the historical default `https://download.docker.com/linux/ubuntu`
/// still resolves correctly on Debian.
///
/// ```
/// use dockhand_schema::{DistroId, derive_repo_url};
///
/// assert_eq!(
///     derive_repo_url("https://download.docker.com/linux/ubuntu", &DistroId::Debian),
///     "https://download.docker.com/linux/debian"
/// );
/// ```
pub fn derive_repo_url(base: &str, distro: &DistroId) -> String {
    let trimmed = base.trim().trim_end_matches('/');
    let root = match trimmed.rsplit_once('/') {
        Some((head, last)) if DistroId::KNOWN.iter().any(|d| d.as_str() == last) => head,
        _ => trimmed,
    };
    format!("{root}/{}", distro.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ubuntu() -> Distribution {
        Distribution {
            id: DistroId::Ubuntu,
            name: "Ubuntu 22.04.4 LTS".to_string(),
            version: "22.04".to_string(),
            codename: Some("jammy".to_string()),
        }
    }

    #[test]
    fn test_repo_url_appends_distro() {
        let profile = HostProfile::new("x86_64", ubuntu(), "https://download.docker.com/linux/");
        assert_eq!(
            profile.package_repo_url,
            "https://download.docker.com/linux/ubuntu"
        );
        assert_eq!(profile.architecture, Architecture::Amd64);
        assert_eq!(profile.family(), Some(PackageFamily::Apt));
    }

    #[test]
    fn test_repo_url_replaces_pinned_distro() {
        assert_eq!(
            derive_repo_url("https://mirror.example/docker/fedora", &DistroId::Centos),
            "https://mirror.example/docker/centos"
        );
    }

    #[test]
    fn test_distro_id_roundtrips_as_string() {
        let json = serde_json::to_string(&DistroId::Raspbian).unwrap();
        assert_eq!(json, "\"raspbian\"");
        let parsed: DistroId = serde_json::from_str("\"arch\"").unwrap();
        assert_eq!(parsed, DistroId::Unrecognized("arch".to_string()));
        assert!(parsed.family().is_none());
    }

    #[test]
    fn test_distribution_display() {
        assert_eq!(ubuntu().to_string(), "Ubuntu 22.04.4 LTS (jammy)");
    }
}
