use super::StepContext;
use crate::error::StepError;
use crate::exec::{CommandSpec, timeouts};
use dockhand_schema::{StepId, StepResult};
use tracing::warn;

pub(super) fn verify(ctx: &StepContext<'_>) -> Result<StepResult, StepError> {
    let version_spec = CommandSpec::new("docker").arg("--version");
    let version = ctx.runner.run(&version_spec)?.check(&version_spec)?;

    let info_spec = CommandSpec::new("docker")
        .args(["info", "--format", "{{.ServerVersion}}"])
        .privileged()
        .timeout(timeouts::SERVICE);
    let server = ctx.runner.run(&info_spec)?.check(&info_spec)?;

    let mut warnings = Vec::new();

    let compose = ctx
        .runner
        .run(&CommandSpec::new("docker").args(["compose", "version"]))?;
    if !compose.success() {
        warnings.push("docker compose is not available".to_string());
    }

    let hello = ctx.runner.run(
        &CommandSpec::new("docker")
            .args(["run", "--rm", "hello-world"])
            .privileged()
            .timeout(timeouts::CONTAINER),
    )?;
    if !hello.success() {
        let why = if hello.timed_out {
            "timed out".to_string()
        } else {
            hello
                .stderr
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("no output")
                .to_string()
        };
        warnings.push(format!("test container did not run: {why}"));
    }

    for warning in &warnings {
        warn!(%warning, "verification warning");
    }

    let mut detail = format!(
        "{} (daemon {})",
        version.stdout.trim(),
        server.stdout.trim()
    );
    if !warnings.is_empty() {
        detail.push_str("; warnings: ");
        detail.push_str(&warnings.join("; "));
    }
    Ok(StepResult::success(StepId::Verify, detail))
}
