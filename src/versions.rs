//! `bump-versions`: per-table version counters.
//!
//! The app caches every definition table and only refetches the ones whose
//! version moved, so a table's version must change exactly when its content
//! does. Versions live in `manifest.json`:
//!
//! ```text
//! {
//!   "DeepsightAdeptDefinition": 1736294400012,   ← one counter per table
//!   "Enums": 1736294400004,
//!   "deepsight": 1736294400031,                  ← bumped with any table
//!   "updated": "2025-01-08T00:00:00.000Z",
//!   "Destiny2/Manifest": "228000.25.01.01.0000-1"
//! }
//! ```
//!
//! How "changed" is decided depends on the environment:
//!
//! - **dev**: a table changed when its bytes hash differently from the last
//!   run ([`HashCache`]). Versions live next to the build output.
//! - **prod**: a table changed when its parsed JSON differs from the
//!   published copy. Changed tables are copied over the published copy, and
//!   versions live in the publish directory.
//!
//! A table seen for the first time starts from `now` in milliseconds in dev
//! and from `-1` (so its first version is `0`) in prod.

use crate::config::{BuildConfig, Environment};
use crate::hash_cache::HashCache;
use crate::tables::to_tab_json;
use crate::time;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const VERSIONS_FILE: &str = "manifest.json";
pub const PACKAGE_FILE: &str = "package.json";
pub const INTERFACES_FILE: &str = "Interfaces.d.ts";

const INJECT_MARKER: &str = "// @inject:versions";
const DEEPSIGHT_KEY: &str = "deepsight";
const UPDATED_KEY: &str = "updated";
const MANIFEST_KEY: &str = "Destiny2/Manifest";

/// Files in the definitions directory that are not versioned tables.
const UNVERSIONED: &[&str] = &[VERSIONS_FILE, PACKAGE_FILE, INTERFACES_FILE];

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("No output folder detected")]
    NoPublishDir,
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// What a bump changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BumpReport {
    /// Bumped tables and their new versions, in file order.
    pub bumped: Vec<(String, i64)>,
    pub deepsight: Option<i64>,
    pub package_version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VersionBumper {
    pub environment: Environment,
    /// Fresh build output, `docs/definitions`.
    pub definitions_dir: PathBuf,
    /// Published copy, compared against in prod.
    pub publish_dir: PathBuf,
    pub hash_cache: PathBuf,
    pub now: DateTime<Utc>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Table name of a definitions file: everything before the first dot.
pub fn table_name(file_name: &str) -> &str {
    file_name.split_once('.').map_or(file_name, |(name, _)| name)
}

/// Upper-case base 36, the form versions are shown in.
pub fn base36(value: i64) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut n = value.unsigned_abs();
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    if value < 0 {
        digits.push(b'-');
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[derive(Debug, PartialEq)]
enum Data {
    Json(Value),
    Text(String),
}

fn read_data(path: &Path) -> Result<Data, VersionError> {
    let text = fs::read_to_string(path)?;
    if path.extension().is_some_and(|ext| ext == "json") {
        let value = serde_json::from_str(&text).map_err(|source| VersionError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Data::Json(value))
    } else {
        Ok(Data::Text(text))
    }
}

fn read_object(path: &Path) -> Map<String, Value> {
    fs::read_to_string(path)
        .ok()
        .and_then(|text| serde_json::from_str::<Value>(&text).ok())
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default()
}

/// Replace the versions marker with one `'Table': number` member per table.
pub fn inject_versions(interfaces: &str, tables: &BTreeSet<String>) -> String {
    let members = tables
        .iter()
        .map(|table| format!("\t'{table}': number"))
        .collect::<Vec<_>>()
        .join("\n");
    // the marker is already indented
    interfaces.replacen(INJECT_MARKER, members.strip_prefix('\t').unwrap_or(&members), 1)
}

/// `"1.0.7"` with deepsight version 12 → `"1.0.12"`.
pub fn package_version(current: &str, deepsight: i64) -> String {
    let minor = current.rsplit_once('.').map_or(current, |(minor, _)| minor);
    format!("{minor}.{deepsight}")
}

fn is_versioned(file_name: &str) -> bool {
    !UNVERSIONED.contains(&file_name)
        && (file_name.ends_with(".json") || file_name.ends_with(".d.ts"))
        && !file_name.starts_with('.')
}

// ============================================================================
// Bump
// ============================================================================

impl VersionBumper {
    pub fn from_config(config: &BuildConfig, environment: Environment, now: DateTime<Utc>) -> Self {
        Self {
            environment,
            definitions_dir: config.definitions_dir(),
            publish_dir: PathBuf::from(&config.paths.publish_dir),
            hash_cache: PathBuf::from(&config.paths.hash_cache),
            now,
        }
    }

    /// Where `manifest.json` and `package.json` live.
    pub fn versions_dir(&self) -> &Path {
        match self.environment {
            Environment::Dev => &self.definitions_dir,
            Environment::Prod => &self.publish_dir,
        }
    }

    fn default_version(&self) -> i64 {
        match self.environment {
            Environment::Dev => self.now.timestamp_millis(),
            Environment::Prod => -1,
        }
    }

    /// Whether `file_name` in the build output differs from what was seen or
    /// published before. In prod a changed file is also published.
    fn changed(&self, file_name: &str, cache: &mut HashCache) -> Result<bool, VersionError> {
        let new_path = self.definitions_dir.join(file_name);
        match self.environment {
            Environment::Prod => {
                let old_path = self.publish_dir.join(file_name);
                let old = read_data(&old_path).ok();
                let new = read_data(&new_path)?;
                if old.as_ref() == Some(&new) {
                    return Ok(false);
                }
                fs::copy(&new_path, &old_path)?;
                Ok(true)
            }
            Environment::Dev => {
                read_data(&new_path)?;
                Ok(cache.file_changed(&new_path)?)
            }
        }
    }

    /// Bump every changed table. `manifest_version` is the snapshot's
    /// manifest version, recorded as `Destiny2/Manifest`.
    pub fn run(&self, manifest_version: Option<&str>) -> Result<BumpReport, VersionError> {
        if !self.environment.is_dev() && !self.publish_dir.exists() {
            return Err(VersionError::NoPublishDir);
        }

        let versions_path = self.versions_dir().join(VERSIONS_FILE);
        let mut versions = read_object(&versions_path);
        let mut cache = match self.environment {
            Environment::Dev => HashCache::load(&self.hash_cache),
            Environment::Prod => HashCache::empty(),
        };

        let mut files: Vec<String> = fs::read_dir(&self.definitions_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_versioned(name))
            .collect();
        files.sort();

        let mut report = BumpReport::default();
        let mut bumped = BTreeSet::new();
        for file_name in &files {
            if !self.changed(file_name, &mut cache)? {
                continue;
            }
            let table = table_name(file_name).to_string();
            if !bumped.insert(table.clone()) {
                continue;
            }
            let version = bump(&mut versions, &table, self.default_version());
            log::info!("Bumped {table} version to {}", base36(version));
            report.bumped.push((table, version));
        }

        let tables: BTreeSet<String> = versions
            .keys()
            .filter(|key| ![DEEPSIGHT_KEY, UPDATED_KEY, MANIFEST_KEY].contains(&key.as_str()))
            .cloned()
            .collect();
        self.write_interfaces(&tables)?;

        if !report.bumped.is_empty() {
            let deepsight = bump(&mut versions, DEEPSIGHT_KEY, self.default_version());
            versions.insert(UPDATED_KEY.into(), json!(time::iso(self.now)));
            report.deepsight = Some(deepsight);
            report.package_version = Some(self.write_package(deepsight)?);
        }

        if let Some(manifest_version) = manifest_version {
            versions.insert(MANIFEST_KEY.into(), json!(manifest_version));
        }
        fs::create_dir_all(self.versions_dir())?;
        fs::write(&versions_path, to_tab_json(&versions)?)?;

        if self.environment.is_dev() {
            cache.save(&self.hash_cache)?;
        }
        Ok(report)
    }

    fn write_interfaces(&self, tables: &BTreeSet<String>) -> Result<(), VersionError> {
        let path = self.definitions_dir.join(INTERFACES_FILE);
        let Ok(interfaces) = fs::read_to_string(&path) else {
            log::warn!(
                "No {INTERFACES_FILE} in {}, versions not injected",
                self.definitions_dir.display()
            );
            return Ok(());
        };
        let injected = inject_versions(&interfaces, tables);
        fs::write(&path, &injected)?;
        if self.environment == Environment::Prod {
            fs::write(self.publish_dir.join(INTERFACES_FILE), injected)?;
        }
        Ok(())
    }

    fn write_package(&self, deepsight: i64) -> Result<String, VersionError> {
        let path = self.versions_dir().join(PACKAGE_FILE);
        let mut package = read_object(&path);
        if package.is_empty() {
            package.insert("name".into(), json!("deepsight.gg"));
            package.insert("version".into(), json!("1.0.0"));
            package.insert("types".into(), json!(INTERFACES_FILE));
        }
        let current = package.get("version").and_then(Value::as_str).unwrap_or("1.0.0");
        let version = package_version(current, deepsight);
        package.insert("version".into(), json!(version));
        fs::write(&path, to_tab_json(&package)?)?;
        Ok(version)
    }
}

fn bump(versions: &mut Map<String, Value>, key: &str, default: i64) -> i64 {
    let version = versions.get(key).and_then(Value::as_i64).unwrap_or(default) + 1;
    versions.insert(key.to_string(), json!(version));
    version
}
