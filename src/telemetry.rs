//! Tracing subscriber setup.
//!
//! The library itself only emits events; binaries and tests that want to see
//! them call [`init_tracing`]. Levels come from `RUST_LOG`, e.g.
//! `RUST_LOG=computesim=debug` shows unknown filters and dry-run outcomes,
//! `RUST_LOG=computesim=trace` adds every store write.

use tracing_subscriber::EnvFilter;

/// Installs a compact fmt subscriber filtered by `RUST_LOG`.
///
/// Returns false if a global subscriber was already installed, so calling it
/// from every test is harmless.
pub fn init_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .try_init()
        .is_ok()
}
