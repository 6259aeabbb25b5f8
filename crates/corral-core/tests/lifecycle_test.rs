//! End-to-end lifecycle tests for the process-backed target.
//!
//! Shell scripts stand in for real server binaries so the tests exercise
//! actual spawn/terminate paths without a Redis installation.

use std::path::Path;
use std::time::{Duration, Instant};

use corral_core::config::RunConfig;
use corral_core::probe::RetryPolicy;
use corral_core::target::{
    RedisProcessTarget, Target, TargetError, TargetSpec, TargetState, create_target,
};
use corral_test_utils::{FakeRedis, unused_port};

fn spec(name: &str, binary: Option<&str>, args: Option<Vec<&str>>) -> TargetSpec {
    TargetSpec {
        name: name.to_string(),
        binary: binary.map(str::to_string),
        args: args.map(|a| a.into_iter().map(str::to_string).collect()),
        skip_ping_on_setup: false,
        auto_port_bind_args: true,
    }
}

fn fast() -> RetryPolicy {
    RetryPolicy {
        attempts: 2,
        interval: Duration::from_millis(10),
    }
}

/// Write an executable shell script into `dir` and return its path.
fn write_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("failed to write script");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("failed to chmod script");
    }

    path.to_str().expect("script path is not utf-8").to_string()
}

#[tokio::test]
async fn no_binary_never_spawns_and_teardown_is_noop() {
    let fake = FakeRedis::start().await;
    let config = RunConfig::new(fake.port(), "/tmp/corral-results");

    let mut target = RedisProcessTarget::new(&config, spec("t1", None, None));
    target.setup().await.expect("setup should succeed");

    assert!(target.process_id().is_none());
    assert_eq!(target.state(), TargetState::Ready);

    target.teardown().await.expect("teardown should succeed");
    assert_eq!(target.state(), TargetState::TornDown);
}

#[tokio::test]
async fn skip_ping_spawns_and_settles_without_network() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "fake-redis.sh", "sleep 30");

    // Nothing listens on this port; success proves no probe was attempted.
    let config = RunConfig::new(unused_port().await, tmp.path());
    let mut s = spec("t1", Some(&script), Some(vec![]));
    s.skip_ping_on_setup = true;

    let mut target = RedisProcessTarget::new(&config, s);
    let started = Instant::now();
    target.setup().await.expect("setup should succeed");

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(target.process_id().is_some());
    assert_eq!(target.state(), TargetState::Ready);

    target.teardown().await.expect("teardown should succeed");
    assert!(target.process_id().is_none());
}

#[tokio::test]
async fn teardown_twice_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_script(tmp.path(), "fake-redis.sh", "sleep 30");

    let config = RunConfig::new(unused_port().await, tmp.path());
    let mut s = spec("t1", Some(&script), Some(vec![]));
    s.skip_ping_on_setup = true;

    let mut target = RedisProcessTarget::new(&config, s);
    target.setup().await.expect("setup should succeed");
    assert!(target.process_id().is_some());

    target.teardown().await.expect("first teardown should succeed");
    assert!(target.process_id().is_none());
    assert_eq!(target.state(), TargetState::TornDown);

    // Second call is a no-op with identical observable effect.
    target.teardown().await.expect("second teardown should succeed");
    assert!(target.process_id().is_none());
    assert_eq!(target.state(), TargetState::TornDown);
}

#[tokio::test]
async fn teardown_without_setup_is_a_noop() {
    let config = RunConfig::new(6390, "/tmp/corral-results");
    let mut target = RedisProcessTarget::new(&config, spec("t1", None, None));
    target.teardown().await.expect("teardown should succeed");
    assert_eq!(target.state(), TargetState::TornDown);
}

#[tokio::test]
async fn setup_after_teardown_is_rejected() {
    let config = RunConfig::new(6390, "/tmp/corral-results");
    let mut target = RedisProcessTarget::new(&config, spec("t1", None, None));
    target.teardown().await.unwrap();

    let err = target.setup().await.unwrap_err();
    assert!(
        matches!(err, TargetError::Retired(ref name) if name == "t1"),
        "expected Retired, got: {err}"
    );
    assert_eq!(target.state(), TargetState::TornDown);
}

#[tokio::test]
async fn spawn_failure_surfaces_immediately() {
    let config = RunConfig::new(6390, "/tmp/corral-results");
    let mut s = spec("t1", Some("/nonexistent/path/to/redis-server"), Some(vec![]));
    s.skip_ping_on_setup = true;

    let mut target = RedisProcessTarget::new(&config, s);
    let err = target.setup().await.unwrap_err();
    assert!(
        matches!(err, TargetError::Spawn { ref binary, .. }
            if binary == "/nonexistent/path/to/redis-server"),
        "expected Spawn, got: {err}"
    );
    assert_ne!(target.state(), TargetState::Ready);
}

#[tokio::test]
async fn spawned_process_receives_resolved_args() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("argv.txt");
    let script = write_script(
        tmp.path(),
        "fake-redis.sh",
        &format!("echo \"$@\" > {}", out.display()),
    );

    let config = RunConfig::new(6402, tmp.path());
    let mut s = spec("t1", Some(&script), Some(vec!["--maxmemory", "1gb"]));
    s.skip_ping_on_setup = true;

    let mut target = RedisProcessTarget::new(&config, s);
    target.setup().await.expect("setup should succeed");
    target.teardown().await.expect("teardown should succeed");

    let argv = std::fs::read_to_string(&out).expect("script should have written argv");
    let expected = format!(
        "--maxmemory 1gb --port 6402 --bind 127.0.0.1 --logfile {}",
        tmp.path().join("redis.log").display()
    );
    assert_eq!(argv.trim_end(), expected);
}

#[tokio::test]
async fn factory_built_target_runs_the_same_lifecycle() {
    let fake = FakeRedis::start().await;
    let config = RunConfig::new(fake.port(), "/tmp/corral-results");

    let mut target = create_target(&config, &serde_json::json!({"name": "t1"}))
        .expect("spec should be valid");
    target.setup().await.expect("setup should succeed");
    assert_eq!(target.state(), TargetState::Ready);
    assert_eq!(
        target.connection_url(),
        format!("redis://127.0.0.1:{}", fake.port())
    );
    target.teardown().await.expect("teardown should succeed");
}

#[tokio::test]
async fn probing_a_dead_endpoint_fails_fast_with_small_budgets() {
    let config = RunConfig::new(unused_port().await, "/tmp/corral-results");
    let mut target =
        RedisProcessTarget::new(&config, spec("t2", None, None)).with_policies(fast(), fast());

    let err = target.setup().await.unwrap_err();
    assert!(
        matches!(err, TargetError::Probe { ref name, .. } if name == "t2"),
        "expected Probe, got: {err}"
    );
    assert_ne!(target.state(), TargetState::Ready);
}
