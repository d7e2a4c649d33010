//! Tracing bootstrap.
//!
//! Filter precedence: `LoggingConfig::filter`, then the `SWITCHYARD_LOG`
//! environment variable, then `info`.

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Environment variable consulted when the config sets no filter.
pub const LOG_ENV_VAR: &str = "SWITCHYARD_LOG";

const DEFAULT_FILTER: &str = "info";

/// Build the `EnvFilter` the subscriber will use.
pub fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    if let Some(directive) = config.filter.as_deref().filter(|d| !d.trim().is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(directive) {
            return filter;
        }
    }
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// Returns `false` when a global subscriber was already set; the existing
/// one is kept.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = build_env_filter(config);
    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    result.is_ok()
}
