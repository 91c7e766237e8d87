//! Shared test utilities for the table builders.
//!
//! Provides an in-memory manifest builder and record shorthands, so tests only
//! spell out the handful of fields a builder actually reads.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fixture = Fixture::new()
//!     .item(10, item("Fatebringer").weapon(KINETIC_BUCKET).watermark("/wm/vog.png"))
//!     .with(Component::Activity, 5, json!({ "pgcrImage": "/pgcr/vog.jpg" }));
//!
//! let ctx = fixture.context();
//! let collections = ctx.collections().unwrap();
//! ```
//!
//! Every component starts out as an empty table, so builders never trip over
//! a missing component unless a test removes one with [`Fixture::without`].

use crate::config::Environment;
use crate::context::{BuildContext, BuildSettings, OpenApiSource};
use crate::hashes::{item_category, tier};
use crate::manifest::{Component, Manifest, MemorySource};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const KINETIC_BUCKET: u32 = 1498876634;
pub const ENERGY_BUCKET: u32 = 2465295065;
pub const HELMET_BUCKET: u32 = 3448274439;

/// Wednesday 2025-01-08 00:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap()
}

// =========================================================================
// Manifest fixture
// =========================================================================

#[derive(Debug, Clone)]
pub struct Fixture {
    components: BTreeMap<Component, Map<String, Value>>,
    version: Option<String>,
    live_activities: Option<Value>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            components: Component::ALL
                .into_iter()
                .map(|c| (c, Map::new()))
                .collect(),
            version: None,
            live_activities: None,
        }
    }

    /// Add a record. Its `hash` field is filled in.
    pub fn with(mut self, component: Component, hash: u32, record: impl Into<Value>) -> Self {
        let mut record = record.into();
        if let Value::Object(map) = &mut record {
            map.insert("hash".into(), json!(hash));
        }
        self.components
            .entry(component)
            .or_default()
            .insert(hash.to_string(), record);
        self
    }

    pub fn item(self, hash: u32, record: impl Into<Value>) -> Self {
        self.with(Component::InventoryItem, hash, record)
    }

    /// Remove a component entirely.
    pub fn without(mut self, component: Component) -> Self {
        self.components.remove(&component);
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn live_activities(mut self, activities: Value) -> Self {
        self.live_activities = Some(activities);
        self
    }

    pub fn source(&self) -> MemorySource {
        let mut source = MemorySource::new();
        for (component, rows) in &self.components {
            source = source.with_component(*component, Value::Object(rows.clone()));
        }
        if let Some(version) = &self.version {
            source = source.with_version(version.clone());
        }
        if let Some(activities) = &self.live_activities {
            source = source.with_live_activities(activities.clone());
        }
        source
    }

    pub fn manifest(&self) -> Manifest {
        Manifest::new(self.source())
    }

    /// A dev build context pinned to [`fixed_now`].
    pub fn context(&self) -> BuildContext {
        self.context_with(test_settings())
    }

    pub fn context_with(&self, settings: BuildSettings) -> BuildContext {
        BuildContext::new(self.manifest(), settings)
    }
}

pub fn test_settings() -> BuildSettings {
    BuildSettings {
        environment: Environment::Dev,
        hostname: "https://deepsight.test/".into(),
        now: fixed_now(),
        openapi: OpenApiSource::Inline(Value::Null),
        static_dir: PathBuf::from("static-does-not-exist"),
    }
}

// =========================================================================
// Inventory item records
// =========================================================================

/// Builder for an inventory item record.
#[derive(Debug, Clone)]
pub struct ItemRecord(Value);

pub fn item(name: &str) -> ItemRecord {
    ItemRecord(json!({
        "displayProperties": { "name": name, "description": "" },
        "itemCategoryHashes": [],
    }))
}

impl ItemRecord {
    fn set(mut self, key: &str, value: Value) -> Self {
        if let Value::Object(map) = &mut self.0 {
            map.insert(key.into(), value);
        }
        self
    }

    fn add_categories(mut self, categories: &[u32]) -> Self {
        if let Some(list) = self.0["itemCategoryHashes"].as_array_mut() {
            list.extend(categories.iter().map(|c| json!(c)));
        }
        self
    }

    /// Legendary weapon in `bucket` with a collectible.
    pub fn weapon(self, bucket: u32) -> Self {
        self.inventory(bucket, tier::LEGENDARY)
            .add_categories(&[item_category::WEAPON])
            .set("collectibleHash", json!(1))
            .set("classType", json!(3))
            .set("screenshot", json!("/screenshot.jpg"))
    }

    /// Legendary armour piece in `bucket` with a collectible.
    pub fn armor(self, bucket: u32, class_type: u32) -> Self {
        self.inventory(bucket, tier::LEGENDARY)
            .add_categories(&[item_category::ARMOR])
            .set("collectibleHash", json!(1))
            .set("classType", json!(class_type))
            .set("screenshot", json!("/screenshot.jpg"))
    }

    pub fn inventory(self, bucket: u32, tier_hash: u32) -> Self {
        self.set(
            "inventory",
            json!({ "bucketTypeHash": bucket, "tierTypeHash": tier_hash }),
        )
    }

    pub fn tier(mut self, tier_hash: u32) -> Self {
        self.0["inventory"]["tierTypeHash"] = json!(tier_hash);
        self
    }

    pub fn categories(self, categories: &[u32]) -> Self {
        self.add_categories(categories)
    }

    pub fn watermark(self, watermark: &str) -> Self {
        self.set("iconWatermark", json!(watermark))
    }

    pub fn shelved(self, watermark: &str) -> Self {
        self.set("iconWatermarkShelved", json!(watermark))
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.0["displayProperties"]["icon"] = json!(icon);
        self
    }

    pub fn icon_hash(mut self, icon_hash: u32) -> Self {
        self.0["displayProperties"]["iconHash"] = json!(icon_hash);
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.0["displayProperties"]["description"] = json!(description);
        self
    }

    pub fn secondary_icon(self, icon: &str) -> Self {
        self.set("secondaryIcon", json!(icon))
    }

    pub fn type_name(self, name: &str) -> Self {
        self.set("itemTypeDisplayName", json!(name))
    }

    pub fn class(self, class_type: u32) -> Self {
        self.set("classType", json!(class_type))
    }

    pub fn collectible(self, hash: Option<u32>) -> Self {
        self.set("collectibleHash", json!(hash))
    }

    pub fn no_screenshot(self) -> Self {
        self.set("screenshot", Value::Null)
    }

    pub fn no_inventory(self) -> Self {
        self.set("inventory", Value::Null)
    }

    pub fn holofoil(self) -> Self {
        self.set("isHolofoil", json!(true))
    }

    /// An equippable placeholder in the dummies category.
    pub fn dummy(self) -> Self {
        self.add_categories(&[item_category::DUMMIES])
            .set("equippable", json!(true))
    }

    /// `(socketTypeHash, singleInitialItemHash)` pairs.
    pub fn sockets(self, sockets: &[(u32, u32)]) -> Self {
        let entries: Vec<Value> = sockets
            .iter()
            .map(|(socket_type, plug)| {
                json!({ "socketTypeHash": socket_type, "singleInitialItemHash": plug })
            })
            .collect();
        self.set("sockets", json!({ "socketEntries": entries }))
    }
}

impl From<ItemRecord> for Value {
    fn from(record: ItemRecord) -> Self {
        record.0
    }
}

// =========================================================================
// Other records
// =========================================================================

pub fn display(name: &str) -> Value {
    json!({ "displayProperties": { "name": name, "description": format!("{name} description") } })
}

/// Vendor with `(identifier, [item hashes])` display categories.
pub fn vendor(name: &str, categories: &[(&str, &[u32])]) -> Value {
    let display_categories: Vec<Value> = categories
        .iter()
        .map(|(identifier, _)| json!({ "identifier": identifier, "displayProperties": { "name": identifier } }))
        .collect();
    let item_list: Vec<Value> = categories
        .iter()
        .enumerate()
        .flat_map(|(index, (_, items))| {
            items
                .iter()
                .map(move |hash| json!({ "itemHash": hash, "displayCategoryIndex": index }))
        })
        .collect();
    json!({
        "displayProperties": { "name": name, "description": "" },
        "displayCategories": display_categories,
        "itemList": item_list,
    })
}

// =========================================================================
// Output lookups, panicking on a miss
// =========================================================================

/// Field of a JSON object keyed by hash. Panics if not found.
pub fn entry<'a>(table: &'a Value, hash: u32) -> &'a Value {
    table.get(hash.to_string()).unwrap_or_else(|| {
        let keys: Vec<&String> = table
            .as_object()
            .map(|m| m.keys().collect())
            .unwrap_or_default();
        panic!("entry {hash} not found. Available: {keys:?}")
    })
}
