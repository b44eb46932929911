//! Environment prober: machine architecture and distribution detection.
//!
//! The prober reads two things through a [`ProbeSource`]: the kernel's
//! machine string and the os-release file. It never guesses: anything it
//! cannot classify is reported as `unknown`/unrecognized and rejected later
//! by [`check_supported`].

use crate::error::{ProbeError, UnsupportedHostError};
use dockhand_schema::{Architecture, Distribution, DistroId, HostProfile, PackageFamily};
use std::collections::HashMap;
use std::process::Command;
use tracing::debug;

const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

/// Raw host facts.
pub trait ProbeSource {
    /// Machine hardware name, as printed by `uname -m`.
    fn machine(&self) -> Option<String>;
    /// Contents of the os-release file.
    fn os_release(&self) -> Option<String>;
}

/// Reads the live system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbeSource;

impl ProbeSource for SystemProbeSource {
    fn machine(&self) -> Option<String> {
        let from_uname = Command::new("uname")
            .arg("-m")
            .output()
            .ok()
            .filter(|out| out.status.success())
            .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
            .filter(|s| !s.is_empty());
        // Fall back to the architecture this binary was built for
        from_uname.or_else(|| Some(std::env::consts::ARCH.to_string()))
    }

    fn os_release(&self) -> Option<String> {
        OS_RELEASE_PATHS
            .iter()
            .find_map(|path| std::fs::read_to_string(path).ok())
    }
}

/// Builds a [`HostProfile`] from a [`ProbeSource`].
#[derive(Debug)]
pub struct Prober<S = SystemProbeSource> {
    source: S,
    repository_base_url: String,
}

impl Prober<SystemProbeSource> {
    /// Probe the machine this process runs on.
    pub fn system(repository_base_url: impl Into<String>) -> Self {
        Self::new(SystemProbeSource, repository_base_url)
    }
}

impl<S: ProbeSource> Prober<S> {
    /// Probe through an arbitrary source.
    pub fn new(source: S, repository_base_url: impl Into<String>) -> Self {
        Self {
            source,
            repository_base_url: repository_base_url.into(),
        }
    }

    /// Detect the host. Fails only when neither a machine string nor
    /// os-release data is available.
    pub fn probe(&self) -> Result<HostProfile, ProbeError> {
        let machine = self.source.machine();
        let os_release = self.source.os_release();
        if machine.is_none() && os_release.is_none() {
            return Err(ProbeError::Unidentifiable);
        }

        let distribution = match os_release {
            Some(content) => distribution_from_fields(&parse_os_release(&content)),
            None => unknown_distribution(),
        };
        let profile = HostProfile::new(
            machine.unwrap_or_default(),
            distribution,
            &self.repository_base_url,
        );
        debug!(
            machine = %profile.machine,
            arch = %profile.architecture,
            distro = %profile.distribution.id,
            codename = ?profile.distribution.codename,
            repo = %profile.package_repo_url,
            "probed host"
        );
        Ok(profile)
    }
}

/// Parse os-release `KEY=value` lines, unquoting values.
pub fn parse_os_release(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), unquote(value.trim())))
        .collect()
}

fn unquote(value: &str) -> String {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if !quoted {
        return value.to_string();
    }
    let inner = &value[1..value.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn field<'a>(fields: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Classify a distribution from parsed os-release fields.
///
/// Derivatives are mapped onto their base only when they declare it in
/// `ID_LIKE` and also publish the base's release codename.
pub fn distribution_from_fields(fields: &HashMap<String, String>) -> Distribution {
    let raw_id = field(fields, "ID").unwrap_or("unknown");
    let like: Vec<&str> = field(fields, "ID_LIKE")
        .map(|v| v.split_whitespace().collect())
        .unwrap_or_default();

    let (id, codename) = match DistroId::from_id(raw_id) {
        DistroId::Ubuntu => (
            DistroId::Ubuntu,
            field(fields, "VERSION_CODENAME").or_else(|| field(fields, "UBUNTU_CODENAME")),
        ),
        id @ (DistroId::Debian | DistroId::Raspbian) => (id, field(fields, "VERSION_CODENAME")),
        DistroId::Unrecognized(other) => {
            if let (true, Some(code)) = (like.contains(&"ubuntu"), field(fields, "UBUNTU_CODENAME"))
            {
                (DistroId::Ubuntu, Some(code))
            } else if let (true, Some(code)) = (
                like.contains(&"debian"),
                field(fields, "DEBIAN_CODENAME").or_else(|| field(fields, "VERSION_CODENAME")),
            ) {
                (DistroId::Debian, Some(code))
            } else {
                (DistroId::Unrecognized(other), None)
            }
        }
        rpm => (rpm, None),
    };

    Distribution {
        name: field(fields, "PRETTY_NAME")
            .or_else(|| field(fields, "NAME"))
            .unwrap_or(raw_id)
            .to_string(),
        version: field(fields, "VERSION_ID").unwrap_or_default().to_string(),
        codename: codename.map(ToString::to_string),
        id,
    }
}

fn unknown_distribution() -> Distribution {
    Distribution {
        id: DistroId::Unrecognized("unknown".to_string()),
        name: "unknown".to_string(),
        version: String::new(),
        codename: None,
    }
}

/// Architectures the Docker repository publishes for `distro`.
pub fn supported_architectures(distro: &DistroId) -> &'static [Architecture] {
    match distro {
        DistroId::Ubuntu | DistroId::Debian => {
            &[Architecture::Amd64, Architecture::Arm64, Architecture::Armhf]
        }
        DistroId::Raspbian => &[Architecture::Armhf, Architecture::Arm64, Architecture::Armel],
        DistroId::Fedora | DistroId::Centos | DistroId::Rhel => {
            &[Architecture::Amd64, Architecture::Arm64]
        }
        DistroId::Unrecognized(_) => &[],
    }
}

/// Reject hosts the installer cannot serve.
pub fn check_supported(host: &HostProfile) -> Result<(), UnsupportedHostError> {
    if !host.architecture.is_known() {
        return Err(UnsupportedHostError::UnknownArchitecture {
            machine: host.machine.clone(),
        });
    }
    let distro = &host.distribution.id;
    if !distro.is_recognized() {
        return Err(UnsupportedHostError::UnrecognizedDistribution {
            id: distro.to_string(),
        });
    }
    if !supported_architectures(distro).contains(&host.architecture) {
        return Err(UnsupportedHostError::ArchitectureNotSupported {
            distro: distro.clone(),
            arch: host.architecture,
        });
    }
    if host.family() == Some(PackageFamily::Apt) && host.distribution.codename.is_none() {
        return Err(UnsupportedHostError::MissingCodename {
            distro: distro.clone(),
        });
    }
    Ok(())
}
