//! Variant groups: reprints of the same weapon or armour piece.
//!
//! Items are grouped by a dedupe key, `{classType}: {bucket}: {name}`, where
//! adept copies use their base name. Collections items seed the groups in
//! collections order; every other item may then join an existing group, but
//! never start one:
//!
//! ```text
//! collections items ──► groups (in order)
//! other items       ──► skip generic items without a collectible
//!                   ──► skip non-dummies without a screenshot
//!                   ──► join the group with the same key, if any
//! ```
//!
//! Groups with a single member are dropped. Each member is tagged with the
//! first matching [`VariantTag`], in the order the enum declares them.

use crate::context::BuildContext;
use crate::manifest::{InventoryItem, Manifest, SocketType, Table};
use crate::tables::adept::{AdeptTable, adept_base_name};
use crate::tables::collections::{Collections, is_equippable_dummy};
use crate::tables::{Artifact, BuildError};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const FILE_NAME: &str = "DeepsightVariantDefinition.json";

/// Canonical plug category of the artifice armour socket.
const ARTIFICE_PLUG_CATEGORY: &str = "enhancementsartifice";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantTag {
    Dummy,
    Holofoil,
    Artifice,
    Adept,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepsightVariantDefinitionEntry {
    pub hash: u32,
    #[serde(rename = "type")]
    pub tag: VariantTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moment: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantTable {
    pub variant_group_lookup_table: BTreeMap<u32, usize>,
    pub groups: Vec<Vec<DeepsightVariantDefinitionEntry>>,
}

/// Lowercase alphanumerics only.
fn canonical_category(identifier: &str) -> String {
    identifier
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Whether the item has a populated artifice socket.
pub fn is_artifice(item: &InventoryItem, socket_types: &Table<SocketType>) -> bool {
    item.socket_entries().iter().any(|socket| {
        socket.single_initial_item_hash != 0
            && socket_types.get(socket.socket_type_hash).is_some_and(|socket_type| {
                socket_type
                    .plug_whitelist
                    .iter()
                    .any(|plug| canonical_category(&plug.category_identifier) == ARTIFICE_PLUG_CATEGORY)
            })
    })
}

struct Classifier<'a> {
    socket_types: &'a Table<SocketType>,
    adept: &'a AdeptTable,
    collections: &'a Collections,
}

impl Classifier<'_> {
    fn tag(&self, item: &InventoryItem) -> VariantTag {
        if is_equippable_dummy(item) {
            VariantTag::Dummy
        } else if item.is_holofoil {
            VariantTag::Holofoil
        } else if is_artifice(item, self.socket_types) {
            VariantTag::Artifice
        } else if self.adept.contains_key(&item.hash) {
            VariantTag::Adept
        } else {
            VariantTag::Generic
        }
    }

    fn dedupe_key(&self, item: &InventoryItem) -> String {
        let name = item.name();
        let base_name = if self.adept.contains_key(&item.hash) {
            adept_base_name(name).unwrap_or(name)
        } else {
            name
        };
        // items without an inventory block never share a key with bucket 0
        let bucket = match item.bucket_hash() {
            Some(bucket) => bucket.to_string(),
            None => "undefined".to_string(),
        };
        format!("{}: {bucket}: {base_name}", item.class_type)
    }

    fn entry(&self, item: &InventoryItem, tag: VariantTag) -> DeepsightVariantDefinitionEntry {
        DeepsightVariantDefinitionEntry {
            hash: item.hash,
            tag,
            moment: item
                .watermark()
                .and_then(|wm| self.collections.moment_for_watermark(wm)),
        }
    }
}

pub fn compute(
    manifest: &Manifest,
    collections: &Collections,
    adept: &AdeptTable,
) -> Result<VariantTable, BuildError> {
    let items = manifest.inventory_items()?;
    let socket_types = manifest.socket_types()?;
    let classifier = Classifier {
        socket_types: &socket_types,
        adept,
        collections,
    };

    let mut groups: Vec<Vec<DeepsightVariantDefinitionEntry>> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for item in collections.item_hashes().iter().filter_map(|h| items.get(*h)) {
        let key = classifier.dedupe_key(item);
        let entry = classifier.entry(item, classifier.tag(item));
        match index_by_key.get(&key) {
            Some(index) => groups[*index].push(entry),
            None => {
                index_by_key.insert(key, groups.len());
                groups.push(vec![entry]);
            }
        }
    }

    for item in items.values() {
        if collections.contains(item.hash) {
            continue;
        }
        let tag = classifier.tag(item);
        if tag == VariantTag::Generic && item.collectible_hash.is_none() {
            continue;
        }
        if tag != VariantTag::Dummy && !item.has_screenshot() {
            continue;
        }
        if let Some(index) = index_by_key.get(&classifier.dedupe_key(item)) {
            groups[*index].push(classifier.entry(item, tag));
        }
    }

    groups.retain(|group| group.len() > 1);

    let mut variant_group_lookup_table = BTreeMap::new();
    for (index, group) in groups.iter().enumerate() {
        for entry in group {
            variant_group_lookup_table.insert(entry.hash, index);
        }
    }

    Ok(VariantTable {
        variant_group_lookup_table,
        groups,
    })
}

pub fn build(ctx: &BuildContext) -> Result<Vec<Artifact>, BuildError> {
    let variants = ctx.variants()?;
    Ok(vec![Artifact::json(FILE_NAME, &*variants)?])
}
