//! Structured logging setup.
//!
//! Library code only emits `tracing` events; binaries and test harnesses
//! that want to see them call [`init_logging`] once at startup. All output
//! goes to stderr, either human-readable or as JSON lines.
//!
//! ```ignore
//! use rr_core::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::from_env(None, None));
//! ```

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel, ENV_LOG_FORMAT, ENV_LOG_LEVEL};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events are enabled at the configured level.
const LOG_TARGETS: [&str; 3] = ["rr_core", "rr_math", "rr_config"];

fn default_filter(level: LogLevel) -> EnvFilter {
    let directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect();
    EnvFilter::new(directives.join(","))
}

/// Install the global subscriber.
///
/// `RUST_LOG`, when it holds a valid filter, replaces the per-crate default.
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config.level));

    let installed = match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .flatten_event(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
        }
    };
    installed.is_ok()
}

/// [`init_logging`] with [`LogConfig::from_env`] and no overrides.
pub fn init_default_logging() -> bool {
    init_logging(&LogConfig::from_env(None, None))
}
