//! Shared types for target construction and lifecycle.

use serde::Deserialize;
use thiserror::Error;

use crate::probe::ProbeError;

/// Declarative description of a single test target.
///
/// Deserialized from a generic field mapping supplied by the harness's spec
/// source. The spec is read-only input; a target copies what it needs.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSpec {
    /// Identifies the target instance.
    pub name: String,

    /// Path to the executable to spawn. When absent, no process is spawned
    /// and the target is assumed externally managed.
    #[serde(default)]
    pub binary: Option<String>,

    /// Arguments appended after the binary. Required iff `binary` is set;
    /// ignored otherwise.
    #[serde(default)]
    pub args: Option<Vec<String>>,

    /// Assume readiness after a fixed settle delay instead of probing.
    /// The caller vouches the target comes up within that window.
    #[serde(default)]
    pub skip_ping_on_setup: bool,

    /// Inject `--port`/`--bind` flags for loopback operation.
    #[serde(default = "default_auto_port_bind_args")]
    pub auto_port_bind_args: bool,
}

fn default_auto_port_bind_args() -> bool {
    true
}

/// Lifecycle states of a target.
///
/// There is no transition out of [`TornDown`](Self::TornDown).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Constructed,
    Starting,
    Ready,
    TornDown,
}

/// Errors from target construction and lifecycle operations.
#[derive(Debug, Error)]
pub enum TargetError {
    /// Malformed or incomplete target description. Fatal at construction.
    #[error("invalid target spec: {0}")]
    Config(String),

    /// The OS refused to create the process. Fatal, not retried.
    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The readiness probe exhausted its budget without success.
    #[error("target {name} never became ready: {source}")]
    Probe {
        name: String,
        #[source]
        source: ProbeError,
    },

    /// Lifecycle misuse: the target was already torn down.
    #[error("target {0} was already torn down")]
    Retired(String),
}
