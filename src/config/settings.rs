//! TOML-based configuration for Prism.
//!
//! Supports a config file (prism.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [engine]
//! path = "${PRISM_HOME}/bin/olap-bridge"
//! args = ["--schema", "foodmart.xml"]
//! timeout_secs = 60
//!
//! # Or serve cubes from a JSON catalog instead of a live engine:
//! # catalog = "./catalog/foodmart.json"
//!
//! [query]
//! nonempty = true
//! sparse = true
//!
//! [cache]
//! enabled = true
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Where cubes come from and how queries are executed.
    pub engine: EngineSettings,

    /// Defaults applied to every aggregate request.
    pub query: QueryDefaults,

    /// Cube metadata cache.
    pub cache: CacheSettings,
}

/// Engine configuration.
///
/// Exactly one of `path` (an engine bridge speaking the worker protocol)
/// or `catalog` (a JSON catalog served in memory) should be set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Path to the engine bridge binary (supports ${ENV_VAR} expansion).
    pub path: Option<String>,

    /// Extra arguments passed to the bridge.
    pub args: Vec<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Path to a JSON catalog (supports ${ENV_VAR} expansion).
    pub catalog: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            path: None,
            args: vec![],
            timeout_secs: 30,
            catalog: None,
        }
    }
}

impl EngineSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default values for request options the caller leaves out.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct QueryDefaults {
    /// Drop rows whose measures are all empty.
    pub sparse: bool,

    /// Attach the generated MDX to results.
    pub debug: bool,

    /// Apply NON EMPTY to every axis.
    pub nonempty: bool,

    /// Apply DISTINCT to every drilldown axis.
    pub distinct: bool,

    /// Fetch ancestors of axis members.
    pub parents: bool,
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Keep cube metadata between requests.
    pub enabled: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `PRISM_CONFIG`
    /// 2. `./prism.toml`
    /// 3. `~/.config/prism/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("PRISM_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("prism.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("prism").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.engine.path.is_some() && self.engine.catalog.is_some() {
            return Err(SettingsError::InvalidConfig(
                "engine.path and engine.catalog are mutually exclusive".into(),
            ));
        }
        if self.engine.timeout_secs == 0 {
            return Err(SettingsError::InvalidConfig(
                "engine.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// The engine bridge binary, with environment variables expanded.
    pub fn engine_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.engine
            .path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }

    /// The catalog file, with environment variables expanded.
    pub fn catalog_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.engine
            .catalog
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.next_if_eq(&'{').is_some() {
            while let Some(ch) = chars.next_if(|&ch| ch != '}') {
                var_name.push(ch);
            }
            chars.next(); // '}'
        } else {
            // $VAR ends at the first non-alphanumeric/underscore
            while let Some(ch) = chars.next_if(|&ch| ch.is_alphanumeric() || ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
