//! Core library for corral: provisioning and retiring ephemeral test
//! targets.
//!
//! A harness asks the [`target::factory`] for a [`target::Target`] from a
//! declarative spec mapping, calls `setup()` to bring it to readiness, runs
//! its workload against `connection_url()`, and calls `teardown()` when done.
//! Targets that are dropped without an explicit teardown are still reaped.

pub mod config;
pub mod probe;
pub mod target;
