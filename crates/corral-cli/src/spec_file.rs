//! Loading the declarative target spec mapping from disk.

use anyhow::{Context, Result};

/// Read and parse a target spec JSON file into a generic field mapping.
///
/// Validation of the mapping's contents is the factory's job.
pub fn load_spec(path: &str) -> Result<serde_json::Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read target spec at {path}"))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse target spec at {path}"))
}
