//! Process-wide default configuration.
//!
//! Guarded calls that are not bound to an explicit [`GuardClient`](crate::GuardClient)
//! read this store on every invocation. Readers take a cloned snapshot, so an
//! in-flight call never sees the key of one configuration paired with the URL
//! of another.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Result;
use crate::types::GuardConfig;

static DEFAULT_CONFIG: RwLock<Option<GuardConfig>> = RwLock::new(None);

/// Configure the SDK with your API key and base URL.
///
/// Overwrites any previous configuration. No validation is done here; empty
/// values surface as a configuration error on the next guarded call.
///
/// ```rust,no_run
/// soteria::configure("your-api-key", "https://api.soteriainfra.com");
/// ```
pub fn configure(api_key: impl Into<String>, api_base: impl Into<String>) {
    let config = GuardConfig::new(api_key, api_base);
    tracing::debug!(api_base = %config.api_base, "soteria configured");
    *write_lock() = Some(config);
}

/// Configure the SDK from `SOTERIA_API_KEY` and `SOTERIA_API_BASE`.
pub fn configure_from_env() -> Result<()> {
    let config = GuardConfig::from_env()?;
    configure(config.api_key, config.api_base);
    Ok(())
}

/// Snapshot of the current default configuration.
pub fn current_config() -> Option<GuardConfig> {
    read_lock().clone()
}

/// Forget the default configuration.
pub fn reset() {
    *write_lock() = None;
}

// The store only holds plain data, so a panic mid-write cannot leave it inconsistent.
fn read_lock() -> RwLockReadGuard<'static, Option<GuardConfig>> {
    DEFAULT_CONFIG
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock() -> RwLockWriteGuard<'static, Option<GuardConfig>> {
    DEFAULT_CONFIG
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
