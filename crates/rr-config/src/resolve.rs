//! Configuration resolution and loading.
//!
//! Resolution order: explicit path → environment variables → XDG paths → defaults.

use std::path::{Path, PathBuf};

use crate::estimation::EstimationConfig;
use crate::validate::{validate_config, ValidationError, ValidationResult};

/// Where the configuration was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided by the caller.
    Explicit,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Explicit => write!(f, "explicit path"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A loaded, validated configuration with its provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: EstimationConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Environment variable names.
const ENV_CONFIG_PATH: &str = "RR_CONFIG";
const ENV_CONFIG_DIR: &str = "RR_CONFIG_DIR";

/// Standard config file names, in lookup order.
const CONFIG_FILENAMES: [&str; 2] = ["estimation.toml", "estimation.json"];

/// Application name for XDG directories.
const APP_NAME: &str = "replacement-estimation";

/// Resolve the configuration file path.
///
/// Resolution order:
/// 1. Explicit path (if provided and present)
/// 2. `RR_CONFIG` environment variable
/// 3. `RR_CONFIG_DIR` environment variable + standard filename
/// 4. XDG config directory (~/.config/replacement-estimation/)
/// 5. Built-in defaults (None)
pub fn resolve_config(explicit: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    let env_path = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
    let env_dir = std::env::var(ENV_CONFIG_DIR).ok().map(PathBuf::from);
    let xdg_dir = dirs::config_dir().map(|d| d.join(APP_NAME));
    resolve_from(explicit, env_path.as_deref(), env_dir.as_deref(), xdg_dir.as_deref())
}

fn resolve_from(
    explicit: Option<&Path>,
    env_path: Option<&Path>,
    env_dir: Option<&Path>,
    xdg_dir: Option<&Path>,
) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = explicit {
        if path.exists() {
            return (Some(path.to_path_buf()), ConfigSource::Explicit);
        }
    }

    if let Some(path) = env_path {
        if path.exists() {
            return (Some(path.to_path_buf()), ConfigSource::Environment);
        }
    }

    if let Some(found) = env_dir.and_then(find_in_dir) {
        return (Some(found), ConfigSource::Environment);
    }

    if let Some(found) = xdg_dir.and_then(find_in_dir) {
        return (Some(found), ConfigSource::XdgConfig);
    }

    (None, ConfigSource::BuiltinDefault)
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Resolve, parse and validate the configuration.
///
/// An explicit path that does not exist is an error rather than a silent
/// fall-through to defaults.
pub fn load_config(explicit: Option<&Path>) -> ValidationResult<ResolvedConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ValidationError::IoError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
    }

    let (path, source) = resolve_config(explicit);
    load_resolved(path, source)
}

fn load_resolved(path: Option<PathBuf>, source: ConfigSource) -> ValidationResult<ResolvedConfig> {
    let config = match &path {
        Some(p) => EstimationConfig::from_file(p)?,
        None => EstimationConfig::default(),
    };
    validate_config(&config)?;
    Ok(ResolvedConfig {
        config,
        path,
        source,
    })
}
