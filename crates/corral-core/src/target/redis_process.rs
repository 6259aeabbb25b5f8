//! Process-backed Redis target.
//!
//! Owns one spawned OS process, its resolved argument vector, and a cached
//! probe connection. Setup gates on a dual-layer bounded retry: an outer
//! liveness loop whose single attempt may itself run the inner dial loop.
//! Connection refused right after a spawn (the process is still binding its
//! socket) and an accepted connection that answers badly are distinct
//! failures with distinct budgets.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::trait_def::Target;
use super::types::{TargetError, TargetSpec, TargetState};
use crate::config::RunConfig;
use crate::probe::{Connection, ProbeError, RetryPolicy};

/// Settle delay granted to targets that opt out of probing.
const SKIP_PING_SETTLE: Duration = Duration::from_secs(1);

/// Implements a local Redis process target.
#[derive(Debug)]
pub struct RedisProcessTarget {
    name: String,
    binary: Option<String>,
    /// Resolved argument vector. Binary first when one is configured, then
    /// caller args in original order, then injected operational flags, with
    /// the logfile flag always last.
    args: Vec<String>,
    port: u16,
    skip_ping: bool,
    dial_policy: RetryPolicy,
    ping_policy: RetryPolicy,
    state: TargetState,
    /// Spawned with `kill_on_drop` so an owner that never calls
    /// [`teardown`](Target::teardown) cannot leak the process.
    process: Option<Child>,
    /// Cached probe connection, reused across liveness attempts.
    conn: Option<Connection>,
}

impl RedisProcessTarget {
    /// Resolve the argument vector and capture what the spec and config
    /// provide. Nothing is spawned until [`setup`](Target::setup).
    pub fn new(config: &RunConfig, spec: TargetSpec) -> Self {
        let mut args: Vec<String> = match (&spec.binary, &spec.args) {
            (Some(binary), Some(user_args)) => {
                let mut v = Vec::with_capacity(user_args.len() + 7);
                v.push(binary.clone());
                v.extend(user_args.iter().cloned());
                v
            }
            _ => Vec::new(),
        };

        // Caller args first so last-wins parsing still lets them override;
        // the logfile flag goes last so it is never shadowed.
        if spec.auto_port_bind_args {
            args.push("--port".to_string());
            args.push(config.redis_process_port.to_string());
            args.push("--bind".to_string());
            args.push("127.0.0.1".to_string());
        }
        args.push("--logfile".to_string());
        args.push(config.redis_log_path().display().to_string());

        Self {
            name: spec.name,
            binary: spec.binary,
            args,
            port: config.redis_process_port,
            skip_ping: spec.skip_ping_on_setup,
            dial_policy: RetryPolicy::dial(),
            ping_policy: RetryPolicy::ping(),
            state: TargetState::Constructed,
            process: None,
            conn: None,
        }
    }

    /// Override both retry schedules.
    ///
    /// Useful for tests that need failure paths to resolve quickly.
    pub fn with_policies(mut self, dial: RetryPolicy, ping: RetryPolicy) -> Self {
        self.dial_policy = dial;
        self.ping_policy = ping;
        self
    }

    /// Resolved argument vector, binary first when one is configured.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// OS pid of the spawned process, if one is running.
    pub fn process_id(&self) -> Option<u32> {
        self.process.as_ref().and_then(Child::id)
    }

    fn probe_addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// One liveness attempt: obtain (or reuse) the cached connection and
    /// issue `PING`.
    async fn ping_once(&mut self) -> Result<(), ProbeError> {
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => Connection::dial(&self.probe_addr(), &self.dial_policy).await?,
        };
        match conn.ping().await {
            Ok(()) => {
                // Cache for later probes and the workload phase.
                self.conn = Some(conn);
                Ok(())
            }
            Err(err) => {
                // A dead socket is discarded so the next attempt re-dials;
                // protocol-level failures retry over the same connection.
                if !matches!(err, ProbeError::Io(_)) {
                    self.conn = Some(conn);
                }
                Err(err)
            }
        }
    }

    /// Liveness probe: bounded retries of [`ping_once`](Self::ping_once).
    ///
    /// Exhaustion propagates the last underlying error.
    pub async fn ping(&mut self) -> Result<(), ProbeError> {
        let mut remaining = self.ping_policy.attempts.max(1);
        loop {
            match self.ping_once().await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    remaining -= 1;
                    if remaining == 0 {
                        return Err(err);
                    }
                    debug!(
                        target_name = %self.name,
                        remaining,
                        error = %err,
                        "liveness probe failed, retrying"
                    );
                    tokio::time::sleep(self.ping_policy.interval).await;
                }
            }
        }
    }

    fn spawn_process(&mut self) -> Result<(), TargetError> {
        let Some(binary) = self.binary.clone() else {
            return Ok(());
        };
        debug!(command = %self.args.join(" "), "starting target process");

        let mut cmd = Command::new(&binary);
        cmd.args(&self.args[1..]);
        // Captured, not inherited: target output must not interleave with
        // harness logs. The process writes its own logfile anyway.
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| TargetError::Spawn {
            binary: binary.clone(),
            source,
        })?;
        info!(target_name = %self.name, pid = ?child.id(), "target process started");
        self.process = Some(child);
        Ok(())
    }
}

#[async_trait]
impl Target for RedisProcessTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> TargetState {
        self.state
    }

    async fn setup(&mut self) -> Result<(), TargetError> {
        if self.state == TargetState::TornDown {
            return Err(TargetError::Retired(self.name.clone()));
        }
        self.state = TargetState::Starting;

        if self.process.is_none() {
            self.spawn_process()?;
        }

        if self.skip_ping {
            tokio::time::sleep(SKIP_PING_SETTLE).await;
        } else {
            self.ping().await.map_err(|source| TargetError::Probe {
                name: self.name.clone(),
                source,
            })?;
        }

        self.state = TargetState::Ready;
        info!(target_name = %self.name, url = %self.connection_url(), "target ready");
        Ok(())
    }

    async fn teardown(&mut self) -> Result<(), TargetError> {
        if let Some(mut child) = self.process.take() {
            terminate(&mut child);
            // No forced-kill escalation: wait as long as the process takes.
            match child.wait().await {
                Ok(status) => {
                    debug!(target_name = %self.name, %status, "target process exited");
                }
                Err(err) => {
                    warn!(target_name = %self.name, error = %err, "wait for target process failed");
                }
            }
        }
        self.conn = None;
        self.state = TargetState::TornDown;
        Ok(())
    }

    fn connection_url(&self) -> String {
        // Same port the argument vector was resolved against.
        format!("redis://127.0.0.1:{}", self.port)
    }
}

impl Drop for RedisProcessTarget {
    /// Safety net for owners that never called `teardown()`. SIGTERM goes
    /// out first; `kill_on_drop` reaps whatever ignores it.
    fn drop(&mut self) {
        if let Some(mut child) = self.process.take() {
            warn!(
                target_name = %self.name,
                "target dropped without teardown, terminating process"
            );
            terminate(&mut child);
        }
    }
}

/// Ask the process to exit gracefully.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    if let Some(pid) = child.id() {
        // SAFETY: pid belongs to a child this target spawned.
        let ret = unsafe { libc::kill(pid as i32, libc::SIGTERM) };
        if ret != 0 {
            warn!(pid, "SIGTERM delivery failed");
        }
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    if let Err(err) = child.start_kill() {
        warn!(error = %err, "kill delivery failed");
    }
}
