//! Logging configuration.
//!
//! Read from `RR_LOG` (falling back to `RUST_LOG`) and `RR_LOG_FORMAT`;
//! explicit overrides from the caller win over both.

use serde::{Deserialize, Serialize};

/// Env var holding the log level.
pub const ENV_LOG_LEVEL: &str = "RR_LOG";
/// Env var holding the log format.
pub const ENV_LOG_FORMAT: &str = "RR_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "console" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" | "structured" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    /// Sizes, likelihood values, Hessian backend decisions.
    Debug,
    #[default]
    Info,
    /// Degenerate fits and pseudoinverse fallbacks.
    Warn,
    Error,
    Off,
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" | "none" | "quiet" => Ok(LogLevel::Off),
            _ => Err(format!("unknown log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Off => write!(f, "off"),
        }
    }
}

impl From<LogLevel> for tracing_subscriber::filter::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
            LogLevel::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
            LogLevel::Info => tracing_subscriber::filter::LevelFilter::INFO,
            LogLevel::Warn => tracing_subscriber::filter::LevelFilter::WARN,
            LogLevel::Error => tracing_subscriber::filter::LevelFilter::ERROR,
            LogLevel::Off => tracing_subscriber::filter::LevelFilter::OFF,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Include timestamps in human output.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Build from the process environment, then apply caller overrides.
    pub fn from_env(level: Option<LogLevel>, format: Option<LogFormat>) -> Self {
        Self::from_vars(
            std::env::var(ENV_LOG_LEVEL).ok().as_deref(),
            std::env::var("RUST_LOG").ok().as_deref(),
            std::env::var(ENV_LOG_FORMAT).ok().as_deref(),
        )
        .with_overrides(level, format)
    }

    fn from_vars(rr_log: Option<&str>, rust_log: Option<&str>, rr_format: Option<&str>) -> Self {
        let mut config = LogConfig::default();

        if let Some(val) = rr_log {
            if let Ok(level) = val.parse::<LogLevel>() {
                config.level = level;
            }
        } else if let Some(val) = rust_log {
            // Coarse: pick the most verbose level mentioned anywhere.
            for (needle, level) in [
                ("trace", LogLevel::Trace),
                ("debug", LogLevel::Debug),
                ("warn", LogLevel::Warn),
                ("error", LogLevel::Error),
            ] {
                if val.contains(needle) {
                    config.level = level;
                    break;
                }
            }
        }

        if let Some(format) = rr_format.and_then(|v| v.parse::<LogFormat>().ok()) {
            config.format = format;
        }
        config
    }

    fn with_overrides(mut self, level: Option<LogLevel>, format: Option<LogFormat>) -> Self {
        if let Some(level) = level {
            self.level = level;
        }
        if let Some(format) = format {
            self.format = format;
        }
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }
}
