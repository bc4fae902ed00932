//! Tracing/logging initialization.
//!
//! `RUST_LOG` always wins over the configured default directive.

use tracing_subscriber::EnvFilter;

/// Output format of the fmt subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, with timestamps.
    Json,
    /// Multi-line human readable output for local runs.
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset, e.g. `"info"` or `"pvz_infra=debug,info"`.
    pub default_directive: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            default_directive: "info".to_string(),
        }
    }
}

impl TracingConfig {
    /// `local` gets pretty debug output, `dev` JSON at debug, everything else JSON at info.
    pub fn for_env(env: &str) -> Self {
        match env {
            "local" => Self {
                format: LogFormat::Pretty,
                default_directive: "debug".to_string(),
            },
            "dev" => Self {
                format: LogFormat::Json,
                default_directive: "debug".to_string(),
            },
            _ => Self::default(),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.default_directive))
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_with(config: &TracingConfig) {
    let filter = config.filter();

    let _ = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .try_init(),
    };
}
