//! Tracing bootstrap.

use cgx_domain::error::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, defaulting to `info`. With
/// `json` the subscriber emits structured JSON lines for log shippers.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    result.map_err(|e| Error::config(format!("Failed to initialise tracing: {e}")))
}
