//! Build configuration module.
//!
//! Handles loading, validating, and merging `deepsight.toml`. The file is
//! optional: stock defaults are used for everything it leaves out.
//!
//! ## Config File Location
//!
//! `deepsight.toml` lives in the project root, next to the static directory:
//!
//! ```text
//! ./
//! ├── deepsight.toml       # optional, overrides stock defaults
//! ├── .env                 # DEEPSIGHT_PATH, DEEPSIGHT_ENVIRONMENT, PORT, HOSTNAME
//! ├── static/              # copied verbatim into the output directory
//! ├── docs/                # build output (docs/definitions/*.json)
//! └── definitions/         # published copy, compared against in prod
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! [paths]
//! static_dir = "static"
//! output_dir = "docs"
//! publish_dir = "definitions"
//! hash_cache = ".hash-cache.json"
//!
//! [links]
//! openapi_url = "https://raw.githubusercontent.com/Bungie-net/api/refs/heads/master/openapi.json"
//! # openapi_path = "openapi.json"   # read a local copy instead of fetching
//!
//! [server]
//! port = 8095
//!
//! [watch]
//! debounce_ms = 500
//!
//! [processing]
//! max_processes = 4         # omit for auto = CPU cores
//! ```
//!
//! Unknown keys are rejected to catch typos early. Environment variables
//! (`PORT`, …) take precedence over the file; see `main.rs`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file in the project root.
pub const CONFIG_FILENAME: &str = "deepsight.toml";

/// Subdirectory of the output directory holding the generated tables.
pub const DEFINITIONS_DIR: &str = "definitions";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Which deployment the build targets.
///
/// Dev builds tolerate unmapped assets and version against a local hash
/// cache; prod builds are strict and version against the published copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    #[default]
    Prod,
}

impl Environment {
    pub fn is_dev(self) -> bool {
        self == Environment::Dev
    }
}

/// Build configuration loaded from `deepsight.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub paths: PathsConfig,
    pub links: LinksConfig,
    pub server: ServerConfig,
    pub watch: WatchConfig,
    pub processing: ProcessingConfig,
}

impl BuildConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.output_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "paths.output_dir must not be empty".into(),
            ));
        }
        if self.paths.static_dir == self.paths.output_dir {
            return Err(ConfigError::Validation(
                "paths.static_dir and paths.output_dir must differ".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port must be non-zero".into()));
        }
        if self.links.openapi_url.is_empty() && self.links.openapi_path.is_none() {
            return Err(ConfigError::Validation(
                "links needs either openapi_url or openapi_path".into(),
            ));
        }
        Ok(())
    }

    /// `<output_dir>/definitions`, where tables are written.
    pub fn definitions_dir(&self) -> PathBuf {
        Path::new(&self.paths.output_dir).join(DEFINITIONS_DIR)
    }
}

/// Input and output locations, relative to the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub static_dir: String,
    pub output_dir: String,
    /// Published copy of the tables that prod builds diff against.
    pub publish_dir: String,
    /// Content hashes of the last seen output files (dev versioning, watch).
    pub hash_cache: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            static_dir: "static".into(),
            output_dir: "docs".into(),
            publish_dir: "definitions".into(),
            hash_cache: ".hash-cache.json".into(),
        }
    }
}

/// Where the OpenAPI schema for the links table comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinksConfig {
    pub openapi_url: String,
    /// Local schema file; takes precedence over the URL when set.
    pub openapi_path: Option<String>,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            openapi_url:
                "https://raw.githubusercontent.com/Bungie-net/api/refs/heads/master/openapi.json"
                    .into(),
            openapi_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8095 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Quiet period after the last change before rebuilding.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of table builders running at once.
    /// When absent, defaults to the number of CPU cores.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(BuildConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `deepsight.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BuildConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BuildConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `deepsight.toml` in the given directory.
pub fn load_config(root: &Path) -> Result<BuildConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `deepsight.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# deepsight-manifest configuration
# ================================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Environment variables (also read from .env):
#   DEEPSIGHT_PATH         manifest snapshot directory (required for builds)
#   DEEPSIGHT_ENVIRONMENT  dev | prod
#   PORT                   overrides server.port
#   HOSTNAME               prefix for generated image URLs
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Paths (relative to the working directory)
# ---------------------------------------------------------------------------
[paths]
# Copied verbatim into the output directory before every build.
static_dir = "static"

# Build output. Tables are written to <output_dir>/definitions.
output_dir = "docs"

# Published copy of the tables. Prod version bumps diff against it.
publish_dir = "definitions"

# Content hashes used by dev version bumps and the watcher.
hash_cache = ".hash-cache.json"

# ---------------------------------------------------------------------------
# Links table
# ---------------------------------------------------------------------------
[links]
# Bungie.net OpenAPI schema, walked to find hash links between components.
openapi_url = "https://raw.githubusercontent.com/Bungie-net/api/refs/heads/master/openapi.json"

# Read the schema from a local file instead of fetching it.
# openapi_path = "openapi.json"

# ---------------------------------------------------------------------------
# Development server
# ---------------------------------------------------------------------------
[server]
port = 8095

# ---------------------------------------------------------------------------
# Watch mode
# ---------------------------------------------------------------------------
[watch]
# Quiet period (milliseconds) after the last change before rebuilding.
debounce_ms = 500

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of table builders running in parallel.
# Omit to use all CPU cores. Values above the core count are clamped.
# max_processes = 4
"##
}
