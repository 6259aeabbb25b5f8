//! Target factory: open dispatch from a generic spec mapping.
//!
//! The factory selects the concrete variant on the `kind` discriminator so
//! adding a new target kind never breaks existing specs. A mapping without
//! `kind` builds the process-backed Redis target.

use std::str::FromStr;

use serde_json::Value;

use super::redis_process::RedisProcessTarget;
use super::trait_def::Target;
use super::types::{TargetError, TargetSpec};
use crate::config::RunConfig;

/// Known target variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A locally spawned Redis-shaped process.
    RedisProcess,
}

impl TargetKind {
    const KNOWN: &'static [&'static str] = &["redis-process"];
}

impl FromStr for TargetKind {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "redis-process" => Ok(Self::RedisProcess),
            other => Err(TargetError::Config(format!(
                "unknown target kind {other:?} (known kinds: {})",
                TargetKind::KNOWN.join(", ")
            ))),
        }
    }
}

/// Build a target from a generic field mapping.
///
/// Pure construction: nothing is spawned or dialed until `setup()`.
pub fn create_target(
    config: &RunConfig,
    spec: &Value,
) -> Result<Box<dyn Target>, TargetError> {
    let Some(mapping) = spec.as_object() else {
        return Err(TargetError::Config(
            "target spec must be a field mapping".to_string(),
        ));
    };

    let kind = match mapping.get("kind").and_then(Value::as_str) {
        Some(s) => s.parse::<TargetKind>()?,
        None => TargetKind::RedisProcess,
    };

    let parsed: TargetSpec =
        serde_json::from_value(spec.clone()).map_err(|e| TargetError::Config(e.to_string()))?;
    validate(&parsed)?;

    match kind {
        TargetKind::RedisProcess => Ok(Box::new(RedisProcessTarget::new(config, parsed))),
    }
}

/// Validate the parsed spec beyond what deserialization enforces.
fn validate(spec: &TargetSpec) -> Result<(), TargetError> {
    if spec.name.trim().is_empty() {
        return Err(TargetError::Config("target name must not be empty".to_string()));
    }
    if spec.binary.is_some() && spec.args.is_none() {
        return Err(TargetError::Config(format!(
            "target {:?} sets a binary but no args",
            spec.name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::types::TargetState;
    use serde_json::json;

    fn config() -> RunConfig {
        RunConfig::new(6390, "/tmp/corral-results")
    }

    #[test]
    fn minimal_mapping_builds_a_process_target() {
        let target = create_target(&config(), &json!({"name": "t1"})).unwrap();
        assert_eq!(target.name(), "t1");
        assert_eq!(target.state(), TargetState::Constructed);
    }

    #[test]
    fn explicit_kind_is_accepted() {
        let spec = json!({"kind": "redis-process", "name": "t1"});
        let target = create_target(&config(), &spec).unwrap();
        assert_eq!(target.name(), "t1");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let spec = json!({"kind": "managed-cloud", "name": "t1"});
        let err = create_target(&config(), &spec).unwrap_err();
        assert!(
            matches!(err, TargetError::Config(ref msg) if msg.contains("unknown target kind")),
            "expected Config, got: {err}"
        );
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = create_target(&config(), &json!({"binary": "/bin/true"})).unwrap_err();
        assert!(matches!(err, TargetError::Config(_)), "got: {err}");
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = create_target(&config(), &json!({"name": "  "})).unwrap_err();
        assert!(
            matches!(err, TargetError::Config(ref msg) if msg.contains("empty")),
            "got: {err}"
        );
    }

    #[test]
    fn binary_without_args_is_rejected() {
        let spec = json!({"name": "t1", "binary": "/bin/fake-redis"});
        let err = create_target(&config(), &spec).unwrap_err();
        assert!(
            matches!(err, TargetError::Config(ref msg) if msg.contains("no args")),
            "got: {err}"
        );
    }

    #[test]
    fn binary_with_empty_args_is_accepted() {
        let spec = json!({"name": "t1", "binary": "/bin/fake-redis", "args": []});
        assert!(create_target(&config(), &spec).is_ok());
    }

    #[test]
    fn non_object_spec_is_rejected() {
        let err = create_target(&config(), &json!(["not", "a", "mapping"])).unwrap_err();
        assert!(
            matches!(err, TargetError::Config(ref msg) if msg.contains("field mapping")),
            "got: {err}"
        );
    }

    #[test]
    fn endpoint_reflects_configured_port() {
        let target = create_target(&config(), &json!({"name": "t1"})).unwrap();
        assert_eq!(target.connection_url(), "redis://127.0.0.1:6390");
    }
}
