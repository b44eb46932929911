//! Package manager adapters.

use crate::error::StepError;
use crate::exec::{CommandRunner, CommandSpec, timeouts};
use dockhand_schema::PackageFamily;
use tracing::debug;

/// Packages needed before the Docker repository can be added.
const APT_PREREQUISITES: [&str; 5] = [
    "apt-transport-https",
    "ca-certificates",
    "curl",
    "gnupg",
    "lsb-release",
];
const DNF_PREREQUISITES: [&str; 3] = ["dnf-plugins-core", "ca-certificates", "curl"];

/// Drives dpkg/apt or rpm/dnf through a [`CommandRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PackageManager {
    family: PackageFamily,
}

impl PackageManager {
    pub(crate) fn new(family: PackageFamily) -> Self {
        Self { family }
    }

    pub(crate) fn family(self) -> PackageFamily {
        self.family
    }

    pub(crate) fn prerequisites(self) -> &'static [&'static str] {
        match self.family {
            PackageFamily::Apt => &APT_PREREQUISITES,
            PackageFamily::Dnf => &DNF_PREREQUISITES,
        }
    }

    /// Whether `package` is installed. A failed query means "not installed".
    pub(crate) fn is_installed(
        self,
        runner: &dyn CommandRunner,
        package: &str,
    ) -> Result<bool, StepError> {
        let installed = match self.family {
            PackageFamily::Apt => {
                let result = runner.run(
                    &CommandSpec::new("dpkg-query")
                        .args(["-W", "--showformat=${Status}", "--"])
                        .arg(package),
                )?;
                result.success() && result.stdout.contains("install ok installed")
            }
            PackageFamily::Dnf => runner
                .run(&CommandSpec::new("rpm").args(["-q", "--"]).arg(package))?
                .success(),
        };
        debug!(package, installed, "package query");
        Ok(installed)
    }

    /// The subset of `packages` not yet installed, in the given order.
    pub(crate) fn missing<S: AsRef<str>>(
        self,
        runner: &dyn CommandRunner,
        packages: &[S],
    ) -> Result<Vec<String>, StepError> {
        let mut missing = Vec::new();
        for package in packages {
            let package = package.as_ref();
            if !self.is_installed(runner, package)? {
                missing.push(package.to_string());
            }
        }
        Ok(missing)
    }

    /// Refresh package metadata.
    pub(crate) fn refresh(self, runner: &dyn CommandRunner) -> Result<(), StepError> {
        let spec = match self.family {
            PackageFamily::Apt => apt_get().arg("update"),
            PackageFamily::Dnf => CommandSpec::new("dnf").args(["makecache", "-y"]),
        }
        .privileged()
        .timeout(timeouts::PACKAGE);
        runner.run(&spec)?.check(&spec)?;
        Ok(())
    }

    /// Install `packages`. Names always follow `--`.
    pub(crate) fn install<S: AsRef<str>>(
        self,
        runner: &dyn CommandRunner,
        packages: &[S],
    ) -> Result<(), StepError> {
        if packages.is_empty() {
            return Ok(());
        }
        let base = match self.family {
            PackageFamily::Apt => apt_get().args(["install", "-y", "--"]),
            PackageFamily::Dnf => CommandSpec::new("dnf").args(["install", "-y", "--"]),
        };
        let spec = base
            .args(packages.iter().map(|p| p.as_ref().to_string()))
            .privileged()
            .timeout(timeouts::PACKAGE);
        runner.run(&spec)?.check(&spec)?;
        Ok(())
    }
}

fn apt_get() -> CommandSpec {
    CommandSpec::new("apt-get").env("DEBIAN_FRONTEND", "noninteractive")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExecError, PrivilegeError};
    use crate::exec::ExecutionResult;
    use std::sync::Mutex;

    /// Answers every query with `status` and records the argv it saw.
    struct Recorder {
        status: &'static str,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl Recorder {
        fn new(status: &'static str) -> Self {
            Self {
                status,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for Recorder {
        fn run(&self, spec: &CommandSpec) -> Result<ExecutionResult, ExecError> {
            let mut argv = vec![spec.program().to_string()];
            argv.extend(spec.arg_list().iter().cloned());
            self.calls.lock().unwrap().push(argv);
            Ok(ExecutionResult {
                exit_code: Some(0),
                stdout: self.status.to_string(),
                ..ExecutionResult::default()
            })
        }

        fn ensure_privileges(&self) -> Result<(), PrivilegeError> {
            Ok(())
        }
    }

    #[test]
    fn test_dpkg_query_format_is_one_argument() {
        let runner = Recorder::new("install ok installed");
        let pm = PackageManager::new(PackageFamily::Apt);
        assert!(pm.is_installed(&runner, "curl").unwrap());
        assert_eq!(
            runner.calls.lock().unwrap()[0],
            vec!["dpkg-query", "-W", "--showformat=${Status}", "--", "curl"]
        );
    }

    #[test]
    fn test_removed_package_with_config_is_not_installed() {
        let runner = Recorder::new("deinstall ok config-files");
        let pm = PackageManager::new(PackageFamily::Apt);
        assert_eq!(
            pm.missing(&runner, &["gnupg", "curl"]).unwrap(),
            vec!["gnupg", "curl"]
        );
    }

    #[test]
    fn test_rpm_query_separates_name() {
        let runner = Recorder::new("");
        let pm = PackageManager::new(PackageFamily::Dnf);
        assert!(pm.is_installed(&runner, "curl").unwrap());
        assert_eq!(
            runner.calls.lock().unwrap()[0],
            vec!["rpm", "-q", "--", "curl"]
        );
    }
}
