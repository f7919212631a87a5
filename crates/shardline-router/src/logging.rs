//! Structured logging for shardline.
//!
//! Logs are emitted with the `tracing` crate and filtered through the
//! `SHARDLINE_LOG` environment variable.
//!
//! # Environment Variables
//!
//! - `SHARDLINE_LOG=info` - Default log level (info)
//! - `SHARDLINE_LOG=debug` - Layout facts of every loaded table
//! - `SHARDLINE_LOG=shardline_router::sharding::router=trace` - Every routed value
//!
//! # Example
//!
//! ```ignore
//! use shardline_router::logging;
//!
//! // Initialize logging (call once at startup)
//! logging::init();
//! ```

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_ENV: &str = "SHARDLINE_LOG";

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initializes the global tracing subscriber with default settings.
///
/// Subsequent calls are ignored (tracing only allows one subscriber).
pub fn init() {
    init_with_default("info");
}

/// Initializes the global tracing subscriber with a custom default level.
///
/// `default_level` applies when `SHARDLINE_LOG` is not set.
pub fn init_with_default(default_level: &str) {
    let subscriber = fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let _ = subscriber.try_init();
}

/// Initializes logging with JSON output format.
pub fn init_json() {
    let subscriber = fmt()
        .with_env_filter(env_filter("info"))
        .with_target(true)
        .json();

    let _ = subscriber.try_init();
}

/// Initializes logging as described by a [`LoggingConfig`].
pub fn init_from_config(config: &LoggingConfig) {
    if config.json {
        let subscriber = fmt()
            .with_env_filter(env_filter(&config.level))
            .with_target(true)
            .json();
        let _ = subscriber.try_init();
    } else {
        init_with_default(&config.level);
    }
}
