//! Content hashes of files seen by earlier runs.
//!
//! Dev version bumps and the watcher both need to know whether a file's bytes
//! actually changed since they last looked at it. Timestamps are useless for
//! this: every build rewrites every table, and a rebuild that produces the
//! same bytes must not count as a change.
//!
//! ## Storage
//!
//! The cache is a JSON file (`paths.hash_cache`, `.hash-cache.json` by
//! default) mapping each path to the SHA-256 of its contents:
//!
//! ```text
//! {
//!   "version": 1,
//!   "entries": {
//!     "docs/definitions/DeepsightAdeptDefinition.json": "9f86d0…"
//!   }
//! }
//! ```
//!
//! A missing, unreadable or outdated cache file loads as empty, which makes
//! every file look changed once.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// Version of the cache file format. Bump this to invalidate existing caches
/// when the format or hashing changes.
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashCache {
    pub version: u32,
    pub entries: BTreeMap<String, String>,
}

impl Default for HashCache {
    fn default() -> Self {
        Self::empty()
    }
}

impl HashCache {
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Load from `path`. Returns an empty cache if the file doesn't exist or
    /// can't be parsed.
    pub fn load(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::empty();
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(cache) if cache.version == CACHE_VERSION => cache,
            _ => Self::empty(),
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Whether `path`'s contents differ from the last recorded hash.
    /// Records the new hash either way.
    pub fn file_changed(&mut self, path: &Path) -> io::Result<bool> {
        let hash = hash_file(path)?;
        Ok(self.record(&cache_key(path), hash))
    }

    /// Record `hash` under `key`, returning whether it differs from the
    /// previous entry.
    pub fn record(&mut self, key: &str, hash: String) -> bool {
        match self.entries.get(key) {
            Some(previous) if *previous == hash => false,
            _ => {
                self.entries.insert(key.to_string(), hash);
                true
            }
        }
    }
}

/// Forward-slash path, so a cache written on one platform reads on another.
fn cache_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hash_bytes(&bytes))
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn first_sighting_is_a_change() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.json");
        fs::write(&file, "{}").unwrap();

        let mut cache = HashCache::empty();
        assert!(cache.file_changed(&file).unwrap());
        assert!(!cache.file_changed(&file).unwrap());
    }

    #[test]
    fn rewriting_same_bytes_is_not_a_change() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.json");
        fs::write(&file, "{\"a\": 1}").unwrap();
        let mut cache = HashCache::empty();
        cache.file_changed(&file).unwrap();

        fs::write(&file, "{\"a\": 1}").unwrap();
        assert!(!cache.file_changed(&file).unwrap());
        fs::write(&file, "{\"a\": 2}").unwrap();
        assert!(cache.file_changed(&file).unwrap());
    }

    #[test]
    fn save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/.hash-cache.json");
        let mut cache = HashCache::empty();
        cache.record("docs/definitions/A.json", hash_bytes(b"a"));
        cache.save(&path).unwrap();

        let loaded = HashCache::load(&path);
        assert_eq!(loaded, cache);
    }

    #[test]
    fn corrupt_or_outdated_cache_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".hash-cache.json");
        fs::write(&path, "not json").unwrap();
        assert!(HashCache::load(&path).entries.is_empty());

        fs::write(&path, r#"{"version": 99, "entries": {"a": "b"}}"#).unwrap();
        assert!(HashCache::load(&path).entries.is_empty());

        assert!(HashCache::load(&tmp.path().join("missing.json")).entries.is_empty());
    }

    #[test]
    fn hex_digest() {
        assert_eq!(
            hash_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
