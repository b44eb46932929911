use super::StepContext;
use crate::error::{StepError, UnsupportedHostError};
use crate::error::ExecError;
use crate::exec::{CommandSpec, timeouts};
use dockhand_schema::{HostProfile, PackageFamily, StepId, StepResult};
use std::io::Write;
use tracing::{debug, info};

const ENGINE_PACKAGES: [&str; 3] = ["docker-ce", "docker-ce-cli", "containerd.io"];
const COMPOSE_PACKAGE: &str = "docker-compose-plugin";

const KEYRING_DIR: &str = "/etc/apt/keyrings";
const KEYRING_PATH: &str = "/etc/apt/keyrings/docker.asc";
const APT_SOURCE_PATH: &str = "/etc/apt/sources.list.d/docker.list";

pub(super) fn prerequisites(ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
    let pm = ctx.packages()?;
    let missing = pm.missing(ctx.runner, pm.prerequisites())?;
    if missing.is_empty() {
        return Ok(StepResult::skipped(
            StepId::Prerequisites,
            "all prerequisite packages are installed",
        ));
    }
    info!(packages = ?missing, "installing prerequisites");
    pm.refresh(ctx.runner)?;
    pm.install(ctx.runner, &missing)?;
    Ok(StepResult::success(
        StepId::Prerequisites,
        format!("installed {}", missing.join(", ")),
    ))
}

pub(super) fn engine(ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
    let pm = ctx.packages()?;
    if pm.missing(ctx.runner, &ENGINE_PACKAGES)?.is_empty() {
        return Ok(StepResult::skipped(
            StepId::Engine,
            "docker-ce, docker-ce-cli and containerd.io are installed",
        ));
    }

    match pm.family() {
        PackageFamily::Apt => add_apt_repository(ctx)?,
        PackageFamily::Dnf => add_dnf_repository(ctx)?,
    }
    pm.refresh(ctx.runner)?;
    pm.install(ctx.runner, &ENGINE_PACKAGES)?;
    Ok(StepResult::success(
        StepId::Engine,
        format!(
            "installed {} from {}",
            ENGINE_PACKAGES.join(", "),
            ctx.host.package_repo_url
        ),
    ))
}

/// The `deb` line for `docker.list`.
pub(crate) fn apt_source_line(host: &HostProfile) -> Result<String, StepError> {
    let codename = host.distribution.codename.as_deref().ok_or_else(|| {
        UnsupportedHostError::MissingCodename {
            distro: host.distribution.id.clone(),
        }
    })?;
    Ok(format!(
        "deb [arch={} signed-by={KEYRING_PATH}] {} {codename} stable\n",
        host.architecture, host.package_repo_url
    ))
}

fn add_apt_repository(ctx: &StepContext<'_>) -> Result<(), StepError> {
    let source_line = apt_source_line(ctx.host)?;

    let mkdir = CommandSpec::new("install")
        .args(["-m", "0755", "-d", KEYRING_DIR])
        .privileged();
    ctx.runner.run(&mkdir)?.check(&mkdir)?;

    let key_url = format!("{}/gpg", ctx.host.package_repo_url);
    let fetch = CommandSpec::new("curl")
        .args(["-fsSL", "--proto", "=https,http", "-o", KEYRING_PATH, "--"])
        .arg(key_url)
        .privileged()
        .timeout(timeouts::DOWNLOAD);
    ctx.runner.run(&fetch)?.check(&fetch)?;

    let chmod = CommandSpec::new("chmod")
        .args(["a+r", KEYRING_PATH])
        .privileged();
    ctx.runner.run(&chmod)?.check(&chmod)?;

    // Staged unprivileged, then installed by root with fixed permissions
    let mut staged = tempfile::NamedTempFile::new()
        .map_err(|e| StepError::io("failed to stage apt source list", e))?;
    staged
        .write_all(source_line.as_bytes())
        .and_then(|()| staged.flush())
        .map_err(|e| StepError::io("failed to stage apt source list", e))?;
    let staged_path = staged.path().to_string_lossy().into_owned();
    debug!(line = source_line.trim_end(), path = APT_SOURCE_PATH, "writing apt source");

    let place = CommandSpec::new("install")
        .args(["-m", "0644"])
        .arg(staged_path)
        .arg(APT_SOURCE_PATH)
        .privileged();
    ctx.runner.run(&place)?.check(&place)?;
    Ok(())
}

fn add_dnf_repository(ctx: &StepContext<'_>) -> Result<(), StepError> {
    let repo_file = format!("{}/docker-ce.repo", ctx.host.package_repo_url);
    let dnf4 = CommandSpec::new("dnf")
        .args(["config-manager", "--add-repo"])
        .arg(repo_file.clone())
        .privileged()
        .timeout(timeouts::DOWNLOAD);
    if ctx.runner.run(&dnf4)?.success() {
        return Ok(());
    }
    // dnf5 renamed the subcommand
    let dnf5 = CommandSpec::new("dnf")
        .args(["config-manager", "addrepo"])
        .arg(format!("--from-repofile={repo_file}"))
        .privileged()
        .timeout(timeouts::DOWNLOAD);
    ctx.runner.run(&dnf5)?.check(&dnf5)?;
    Ok(())
}

pub(super) fn compose(ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
    let query = CommandSpec::new("docker")
        .args(["compose", "version"])
        .timeout(timeouts::QUERY);
    match ctx.runner.run(&query) {
        Ok(current) if current.success() => {
            return Ok(StepResult::skipped(
                StepId::Compose,
                format!("{} already available", current.stdout.trim()),
            ));
        }
        // no docker binary yet (engine step skipped or disabled)
        Ok(_) | Err(ExecError::Spawn { .. }) => {}
        Err(err) => return Err(err.into()),
    }
    ctx.packages()?.install(ctx.runner, &[COMPOSE_PACKAGE])?;
    Ok(StepResult::success(
        StepId::Compose,
        format!("installed {COMPOSE_PACKAGE}"),
    ))
}

pub(super) fn tools(ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
    let wanted = ctx.config.additional_packages();
    if wanted.is_empty() {
        return Ok(StepResult::skipped(
            StepId::Tools,
            "no additional packages configured",
        ));
    }
    let pm = ctx.packages()?;
    let missing = pm.missing(ctx.runner, wanted)?;
    if missing.is_empty() {
        return Ok(StepResult::skipped(
            StepId::Tools,
            "all additional packages are installed",
        ));
    }
    pm.install(ctx.runner, &missing)?;
    Ok(StepResult::success(
        StepId::Tools,
        format!("installed {}", missing.join(", ")),
    ))
}
