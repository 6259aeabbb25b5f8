//! `corral check` command: provision a target, verify readiness, tear down.
//!
//! A smoke test for target definitions: the target either comes up and
//! answers the liveness probe, or the command fails with the probe's error.

use anyhow::{Context, Result};

use corral_core::config::RunConfig;
use corral_core::target::{Target, create_target};

use crate::spec_file;

/// Run the check command.
pub async fn run_check(config: &RunConfig, spec_path: &str) -> Result<()> {
    let spec = spec_file::load_spec(spec_path)?;
    let mut target = create_target(config, &spec)
        .with_context(|| format!("invalid target spec in {spec_path}"))?;

    println!("Setting up target: {}", target.name());
    let setup_result = target.setup().await;

    // Teardown runs on the failure path too; a half-started process must
    // not outlive the command.
    match setup_result {
        Ok(()) => {
            println!("Target ready at {}", target.connection_url());
            target.teardown().await?;
            println!("Target torn down.");
            Ok(())
        }
        Err(err) => {
            target.teardown().await?;
            Err(err).context("target setup failed")
        }
    }
}
