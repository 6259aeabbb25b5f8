//! Configuration file management for corral.
//!
//! Provides a TOML-based config file at `~/.config/corral/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use corral_core::config::RunConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub target: TargetSection,
    pub results: ResultsSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TargetSection {
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResultsSection {
    pub dir: String,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the corral config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/corral` or `~/.config/corral`.
/// We intentionally ignore the platform-specific `dirs::config_dir()`
/// (which returns `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("corral");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("corral")
}

/// Return the path to the corral config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct CorralConfig {
    pub run_config: RunConfig,
}

impl CorralConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Port: `cli_port` > `CORRAL_PORT` env > `config_file.target.port` > `RunConfig::DEFAULT_PORT`
    /// - Results dir: `cli_results_dir` > `CORRAL_RESULTS_DIR` env > `config_file.results.dir` > `results`
    ///
    /// The results directory is created if it does not exist.
    pub fn resolve(cli_port: Option<u16>, cli_results_dir: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        // Port resolution.
        let port = if let Some(port) = cli_port {
            port
        } else if let Ok(raw) = std::env::var("CORRAL_PORT") {
            raw.parse::<u16>()
                .with_context(|| format!("CORRAL_PORT env var is not a valid port: {raw:?}"))?
        } else if let Some(ref cfg) = file_config {
            cfg.target.port
        } else {
            RunConfig::DEFAULT_PORT
        };

        // Results dir resolution.
        let results_dir = if let Some(dir) = cli_results_dir {
            PathBuf::from(dir)
        } else if let Ok(dir) = std::env::var("CORRAL_RESULTS_DIR") {
            PathBuf::from(dir)
        } else if let Some(ref cfg) = file_config {
            PathBuf::from(&cfg.results.dir)
        } else {
            PathBuf::from("results")
        };

        std::fs::create_dir_all(&results_dir).with_context(|| {
            format!("failed to create results directory {}", results_dir.display())
        })?;

        Ok(Self {
            run_config: RunConfig::new(port, results_dir),
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
