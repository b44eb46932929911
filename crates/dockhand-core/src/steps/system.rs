use super::StepContext;
use crate::error::StepError;
use crate::exec::{CommandRunner, CommandSpec, timeouts};
use dockhand_schema::{StepId, StepResult};
use tracing::info;

const DOCKER_GROUP: &str = "docker";

pub(super) fn service(ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
    let enabled = ctx
        .runner
        .run(&CommandSpec::new("systemctl").args(["is-enabled", "--quiet", "docker"]))?
        .success();
    let active = ctx
        .runner
        .run(&CommandSpec::new("systemctl").args(["is-active", "--quiet", "docker"]))?
        .success();
    if enabled && active {
        return Ok(StepResult::skipped(
            StepId::Service,
            "docker service is enabled and running",
        ));
    }

    let start = CommandSpec::new("systemctl")
        .args(["enable", "--now", "docker"])
        .privileged()
        .timeout(timeouts::SERVICE);
    ctx.runner.run(&start)?.check(&start)?;
    Ok(StepResult::success(
        StepId::Service,
        "docker service enabled and started",
    ))
}

pub(super) fn group(ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
    let user = match ctx.user {
        Some(user) => user.to_string(),
        None => invoking_user(ctx.runner)?,
    };
    if user == "root" {
        return Ok(StepResult::skipped(
            StepId::Group,
            "running as root; no group membership needed",
        ));
    }

    let groups = ctx
        .runner
        .run(&CommandSpec::new("id").args(["-nG", "--"]).arg(user.clone()))?;
    if groups.success() && groups.stdout.split_whitespace().any(|g| g == DOCKER_GROUP) {
        return Ok(StepResult::skipped(
            StepId::Group,
            format!("{user} is already in the {DOCKER_GROUP} group"),
        ));
    }

    let exists = ctx
        .runner
        .run(&CommandSpec::new("getent").args(["group", DOCKER_GROUP]))?
        .success();
    if !exists {
        let create = CommandSpec::new("groupadd").arg(DOCKER_GROUP).privileged();
        ctx.runner.run(&create)?.check(&create)?;
    }

    let add = CommandSpec::new("usermod")
        .args(["-aG", DOCKER_GROUP, "--"])
        .arg(user.clone())
        .privileged();
    ctx.runner.run(&add)?.check(&add)?;
    info!(user = %user, "added user to docker group");
    Ok(StepResult::success(
        StepId::Group,
        format!("added {user} to the {DOCKER_GROUP} group; log out and back in for it to take effect"),
    ))
}

/// The user who invoked the installer: `SUDO_USER`, else `USER`, else `id -un`.
pub fn invoking_user(runner: &dyn CommandRunner) -> Result<String, StepError> {
    for var in ["SUDO_USER", "USER"] {
        if let Ok(value) = std::env::var(var) {
            let value = value.trim();
            if !value.is_empty() {
                return Ok(value.to_string());
            }
        }
    }
    let whoami = CommandSpec::new("id").arg("-un");
    let result = runner.run(&whoami)?.check(&whoami)?;
    Ok(result.stdout.trim().to_string())
}
