//! Test-target lifecycle: factory, trait, and the process-backed target.
//!
//! # Architecture
//!
//! ```text
//! Harness
//!     |
//!     v
//! factory::create_target(config, spec) --> Box<dyn Target>
//!     |
//!     |   setup() ----------- spawn + readiness gate, Constructed -> Ready
//!     |   connection_url() -- redis://127.0.0.1:<configured port>
//!     |   teardown() -------- SIGTERM + wait, idempotent, -> TornDown
//! ```
//!
//! The factory dispatches on an explicit `kind` discriminator in the spec
//! mapping so future variants (managed databases, remote targets) can be
//! added without touching call sites.

pub mod factory;
pub mod redis_process;
pub mod trait_def;
pub mod types;

// Re-export the primary public API at the module level.
pub use factory::{TargetKind, create_target};
pub use redis_process::RedisProcessTarget;
pub use trait_def::Target;
pub use types::{TargetError, TargetSpec, TargetState};
