//! Test-only helpers.

use std::sync::{Mutex, MutexGuard, OnceLock};

/// Serialises tests that mutate process environment variables.
pub fn lock_env() -> MutexGuard<'static, ()> {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}
