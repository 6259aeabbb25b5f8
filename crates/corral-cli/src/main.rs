mod check_cmd;
mod config;
mod run_cmd;
mod spec_file;

use clap::{Parser, Subcommand};

use corral_core::config::RunConfig;

use config::CorralConfig;

#[derive(Parser)]
#[command(name = "corral", about = "Provision and retire ephemeral test targets")]
struct Cli {
    /// Target port (overrides CORRAL_PORT env var)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Results directory for target artifacts (overrides CORRAL_RESULTS_DIR)
    #[arg(long, global = true)]
    results_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a corral config file
    Init {
        /// Default target port to record
        #[arg(long, default_value_t = RunConfig::DEFAULT_PORT)]
        default_port: u16,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Provision a target, verify readiness, and tear it down
    Check {
        /// Path to the target spec JSON file
        #[arg(long)]
        spec: String,
    },
    /// Provision a target, run a workload command against it, tear down
    Run {
        /// Path to the target spec JSON file
        #[arg(long)]
        spec: String,
        /// Workload command and its arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },
}

/// Execute the `corral init` command: write the config file.
fn cmd_init(port: u16, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        target: config::TargetSection { port },
        results: config::ResultsSection {
            dir: "results".to_string(),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  target.port = {port}");
    println!("  results.dir = results");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { default_port, force } => {
            cmd_init(default_port, force)?;
        }
        Commands::Check { spec } => {
            let resolved = CorralConfig::resolve(cli.port, cli.results_dir.as_deref())?;
            check_cmd::run_check(&resolved.run_config, &spec).await?;
        }
        Commands::Run { spec, command } => {
            let resolved = CorralConfig::resolve(cli.port, cli.results_dir.as_deref())?;
            run_cmd::run_workload(&resolved.run_config, &spec, &command).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test_util;
