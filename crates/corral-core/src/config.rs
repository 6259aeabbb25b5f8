//! Run configuration consumed by targets.

use std::path::PathBuf;

/// Ports and paths a target needs at construction time.
///
/// Consumed, not owned, by targets: the factory borrows it and each target
/// copies the fields it needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Loopback port a spawned process target binds.
    pub redis_process_port: u16,
    /// Directory where run artifacts (the target's log file) land.
    pub results_dir: PathBuf,
}

impl RunConfig {
    /// Default bind port used when nothing is configured.
    pub const DEFAULT_PORT: u16 = 6379;

    pub fn new(redis_process_port: u16, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            redis_process_port,
            results_dir: results_dir.into(),
        }
    }

    /// Endpoint URL for the configured port.
    ///
    /// Derived from the same port the process is launched with, so the
    /// probe and the caller's workload connection always agree.
    pub fn redis_url(&self) -> String {
        format!("redis://127.0.0.1:{}", self.redis_process_port)
    }

    /// Log file the spawned process writes into the results directory.
    pub fn redis_log_path(&self) -> PathBuf {
        self.results_dir.join("redis.log")
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PORT, "results")
    }
}
