//! `corral run` command: provision a target, run a workload command against
//! it, and tear the target down on every exit path.

use anyhow::{Context, Result, bail};

use corral_core::config::RunConfig;
use corral_core::target::{Target, create_target};

use crate::spec_file;

/// Run the workload command with the target's endpoint in `REDIS_URL`.
pub async fn run_workload(
    config: &RunConfig,
    spec_path: &str,
    command: &[String],
) -> Result<()> {
    let spec = spec_file::load_spec(spec_path)?;
    let mut target = create_target(config, &spec)
        .with_context(|| format!("invalid target spec in {spec_path}"))?;

    println!("Setting up target: {}", target.name());
    if let Err(err) = target.setup().await {
        target.teardown().await?;
        return Err(err).context("target setup failed");
    }

    let url = target.connection_url();
    println!("Target ready at {url}");

    let workload_result = run_command(command, &url).await;

    // Guaranteed release: the target goes away before the workload's
    // outcome is surfaced.
    target.teardown().await?;
    println!("Target torn down.");

    let status = workload_result?;
    if !status.success() {
        bail!("workload exited with {status}");
    }
    Ok(())
}

async fn run_command(command: &[String], redis_url: &str) -> Result<std::process::ExitStatus> {
    let (program, args) = command
        .split_first()
        .context("workload command must not be empty")?;
    let status = tokio::process::Command::new(program)
        .args(args)
        .env("REDIS_URL", redis_url)
        .status()
        .await
        .with_context(|| format!("failed to run workload command {program:?}"))?;
    tracing::debug!(%status, "workload command finished");
    Ok(status)
}
