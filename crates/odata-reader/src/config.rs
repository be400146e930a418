//! Configuration resolution for the reader.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`<config dir>/odata-reader/settings.json`)
//! 3. Project config (`.odata-reader/settings.json`)
//! 4. Environment variables
//!
//! File layers are merged key by key, so a file only needs the settings it
//! changes.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::path::{Path, PathBuf};
use tracing::warn;

use odata_protocol::MessageQuotas;

use crate::error::{Error, Result};

pub const ENV_INCLUDE_RESOURCE_TYPE: &str = "ODATA_READER_INCLUDE_RESOURCE_TYPE";
pub const ENV_MAX_MESSAGE_SIZE: &str = "ODATA_READER_MAX_MESSAGE_SIZE";
pub const ENV_MAX_NESTING_DEPTH: &str = "ODATA_READER_MAX_NESTING_DEPTH";
pub const ENV_MAX_BATCH_PARTS: &str = "ODATA_READER_MAX_BATCH_PARTS";
pub const ENV_MAX_CHANGESET_OPERATIONS: &str = "ODATA_READER_MAX_CHANGESET_OPERATIONS";
pub const ENV_LOG: &str = "ODATA_READER_LOG";

/// Complete reader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub quotas: MessageQuotas,
    #[serde(default)]
    pub log: LogConfig,
}

/// Defaults for [`crate::ReadOptions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReaderConfig {
    pub include_resource_type: bool,
}

/// Logging output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "odata_reader=info".to_string(),
            json: false,
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    let mut merged = serde_json::to_value(Config::default())?;

    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            merge_json(&mut merged, read_config_file(&global_path)?);
        }
    }

    if let Some(dir) = project_dir {
        let project_path = project_config_path(dir);
        if project_path.exists() {
            merge_json(&mut merged, read_config_file(&project_path)?);
        }
    }

    let mut config: Config = serde_json::from_value(merged)
        .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("odata-reader").join("settings.json"))
}

/// Get the project config file path under `dir`.
pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(".odata-reader").join("settings.json")
}

fn read_config_file(path: &Path) -> Result<Json> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Recursively overlay objects; any other value replaces the base.
fn merge_json(base: &mut Json, overlay: Json) {
    match (base, overlay) {
        (Json::Object(base), Json::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup(ENV_INCLUDE_RESOURCE_TYPE) {
        match parse_bool(&val) {
            Some(b) => config.reader.include_resource_type = b,
            None => warn!(var = ENV_INCLUDE_RESOURCE_TYPE, value = %val, "Ignoring invalid boolean"),
        }
    }
    if let Some(val) = lookup(ENV_MAX_MESSAGE_SIZE) {
        match val.parse() {
            Ok(n) => config.quotas.max_received_message_size = n,
            Err(_) => warn!(var = ENV_MAX_MESSAGE_SIZE, value = %val, "Ignoring invalid number"),
        }
    }
    if let Some(val) = lookup(ENV_MAX_NESTING_DEPTH) {
        match val.parse() {
            Ok(n) => config.quotas.max_nesting_depth = n,
            Err(_) => warn!(var = ENV_MAX_NESTING_DEPTH, value = %val, "Ignoring invalid number"),
        }
    }
    if let Some(val) = lookup(ENV_MAX_BATCH_PARTS) {
        match val.parse() {
            Ok(n) => config.quotas.max_parts_per_batch = n,
            Err(_) => warn!(var = ENV_MAX_BATCH_PARTS, value = %val, "Ignoring invalid number"),
        }
    }
    if let Some(val) = lookup(ENV_MAX_CHANGESET_OPERATIONS) {
        match val.parse() {
            Ok(n) => config.quotas.max_operations_per_changeset = n,
            Err(_) => {
                warn!(var = ENV_MAX_CHANGESET_OPERATIONS, value = %val, "Ignoring invalid number");
            }
        }
    }
    if let Some(val) = lookup(ENV_LOG) {
        config.log.filter = val;
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
