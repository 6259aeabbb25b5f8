//! The `Target` trait -- the capability set every target variant implements.
//!
//! Each concrete variant (today a local process; future variants may wrap
//! managed or remote databases) implements this trait. The trait is
//! intentionally object-safe so the factory can hand back `Box<dyn Target>`.

use async_trait::async_trait;

use super::types::{TargetError, TargetState};

/// A test target the harness can set up, use, and tear down.
///
/// Every instance is owned and driven by exactly one caller at a time; the
/// `&mut self` operations encode that, so no locking is needed.
#[async_trait]
pub trait Target: Send + std::fmt::Debug {
    /// Instance name from the spec.
    fn name(&self) -> &str;

    /// Current lifecycle state.
    fn state(&self) -> TargetState;

    /// Bring the target to readiness: spawn the process if one is
    /// configured, then gate on the liveness probe.
    ///
    /// On failure the target is unusable and the caller must not proceed
    /// to the workload phase. A spawned process is kept around for
    /// [`teardown`](Self::teardown); setup failure never auto-tears-down.
    async fn setup(&mut self) -> Result<(), TargetError>;

    /// Retire the target. Idempotent; safe to call in any state.
    async fn teardown(&mut self) -> Result<(), TargetError>;

    /// Endpoint the workload should connect to.
    fn connection_url(&self) -> String;
}

// Compile-time assertion: Target must be object-safe.
// If this line compiles, the trait can be used as `dyn Target`.
const _: () = {
    fn _assert_object_safe(_: &mut dyn Target) {}
};
