//! Configuration module for Prism.
//!
//! Handles engine selection, request defaults and environment variables.

mod settings;

pub use settings::{
    expand_env_vars, CacheSettings, EngineSettings, QueryDefaults, Settings, SettingsError,
};
