//! Tracing subscriber setup for applications embedding the voting core

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by RUST_LOG, or `default_filter`
/// when RUST_LOG is unset or invalid.
///
/// Fails if a global subscriber is already installed.
pub fn init(default_filter: &str) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}
