//! Tracing and logging setup shared by the PVZ binaries.

/// Tracing configuration (filters, formats).
pub mod tracing;

pub use self::tracing::{LogFormat, TracingConfig};

/// Initialize tracing for a deployment environment (`local`, `dev`, `prod`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init_for_env(env: &str) {
    tracing::init_with(&TracingConfig::for_env(env));
}
