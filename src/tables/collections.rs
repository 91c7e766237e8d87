//! Collections: which weapons and armour belong to which moment.
//!
//! An item is collectable when it has a collectible, is a weapon or armour
//! piece, and is not one of the dummy placeholders. It lands in a moment when
//!
//! 1. the moment lists it explicitly in `itemHashes`, or
//! 2. its icon watermark is one of the moment's watermarks (main, shelved or
//!    subsumed).
//!
//! Explicit listings win, so a moment can claim items whose watermark points
//! at a neighbouring season.
//!
//! The same data answers two questions other tables ask constantly:
//!
//! - which moment does a watermark belong to ([`Collections::moment_for_watermark`]);
//! - which collections item is a reprint the "canonical" copy of
//!   ([`Collections::canonicalize`]), keyed by `name/classType/watermark`.

use crate::context::BuildContext;
use crate::hashes::item_category;
use crate::manifest::{InventoryItem, Manifest, Table};
use crate::tables::moments::MomentTable;
use crate::tables::{Artifact, BuildError};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const FILE_NAME: &str = "DeepsightCollectionsDefinition.json";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepsightCollectionsDefinition {
    pub hash: u32,
    /// Inventory bucket → item hashes.
    pub buckets: BTreeMap<u32, Vec<u32>>,
}

#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub moments: BTreeMap<u32, DeepsightCollectionsDefinition>,
    watermark_to_moment: HashMap<String, u32>,
    canonical: HashMap<String, u32>,
    members: BTreeSet<u32>,
    ordered: Vec<u32>,
}

/// Key two reprints of the same item share. Items without a name or a
/// watermark have none.
pub fn canonical_key(item: &InventoryItem) -> Option<String> {
    let watermark = item.watermark()?;
    if item.name().is_empty() {
        return None;
    }
    Some(format!("{}/{}/{watermark}", item.name(), item.class_type))
}

/// Weapon or armour with a collectible, excluding dummies.
pub fn is_collectable(item: &InventoryItem) -> bool {
    item.collectible_hash.is_some()
        && (item.in_category(item_category::WEAPON) || item.in_category(item_category::ARMOR))
        && !item.in_category(item_category::DUMMIES)
}

/// Placeholder items that can be equipped for preview.
pub fn is_equippable_dummy(item: &InventoryItem) -> bool {
    item.in_category(item_category::DUMMIES) && item.equippable
}

impl Collections {
    pub fn moment_for_watermark(&self, watermark: &str) -> Option<u32> {
        self.watermark_to_moment.get(watermark).copied()
    }

    pub fn contains(&self, hash: u32) -> bool {
        self.members.contains(&hash)
    }

    /// Every collections item, by moment then bucket then hash.
    pub fn item_hashes(&self) -> &[u32] {
        &self.ordered
    }

    /// The collections copy of `item`, if any.
    ///
    /// Items already in collections are their own canonical copy.
    pub fn canonicalize(&self, item: &InventoryItem) -> Option<u32> {
        if self.contains(item.hash) {
            return Some(item.hash);
        }
        let key = canonical_key(item)?;
        self.canonical.get(&key).copied()
    }

    pub fn canonicalize_hash(&self, items: &Table<InventoryItem>, hash: u32) -> Option<u32> {
        if self.contains(hash) {
            return Some(hash);
        }
        items.get(hash).and_then(|item| self.canonicalize(item))
    }

    /// Canonical copies of `hashes`, in order, skipping items without one.
    pub fn copies(
        &self,
        items: &Table<InventoryItem>,
        hashes: impl IntoIterator<Item = u32>,
    ) -> Vec<u32> {
        hashes
            .into_iter()
            .filter_map(|hash| self.canonicalize_hash(items, hash))
            .collect()
    }
}

pub fn compute(manifest: &Manifest, moments: &MomentTable) -> Result<Collections, BuildError> {
    let items = manifest.inventory_items()?;

    let mut watermark_to_moment = HashMap::new();
    let mut explicit = HashMap::new();
    for moment in moments.values() {
        for watermark in moment.watermarks() {
            watermark_to_moment
                .entry(watermark.to_string())
                .or_insert(moment.hash);
        }
        for item_hash in &moment.item_hashes {
            explicit.entry(*item_hash).or_insert(moment.hash);
        }
    }

    let mut definitions: BTreeMap<u32, DeepsightCollectionsDefinition> = moments
        .keys()
        .map(|hash| {
            (
                *hash,
                DeepsightCollectionsDefinition {
                    hash: *hash,
                    buckets: BTreeMap::new(),
                },
            )
        })
        .collect();

    for item in items.values() {
        let moment = match explicit.get(&item.hash) {
            Some(moment) if !item.in_category(item_category::DUMMIES) => Some(*moment),
            _ if is_collectable(item) => item
                .watermark()
                .and_then(|wm| watermark_to_moment.get(wm).copied()),
            _ => None,
        };
        let (Some(moment), Some(bucket)) = (moment, item.bucket_hash()) else {
            continue;
        };
        if let Some(definition) = definitions.get_mut(&moment) {
            definition.buckets.entry(bucket).or_default().push(item.hash);
        }
    }

    let mut ordered = Vec::new();
    let mut members = BTreeSet::new();
    for definition in definitions.values() {
        for hash in definition.buckets.values().flatten() {
            if members.insert(*hash) {
                ordered.push(*hash);
            }
        }
    }

    let mut canonical = HashMap::new();
    for hash in &ordered {
        if let Some(key) = items.get(*hash).and_then(canonical_key) {
            canonical.entry(key).or_insert(*hash);
        }
    }

    log::debug!(
        "Collections: {} items across {} moments",
        ordered.len(),
        definitions.len()
    );

    Ok(Collections {
        moments: definitions,
        watermark_to_moment,
        canonical,
        members,
        ordered,
    })
}

pub fn build(ctx: &BuildContext) -> Result<Vec<Artifact>, BuildError> {
    let collections = ctx.collections()?;
    Ok(vec![Artifact::json(FILE_NAME, &collections.moments)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashes::item as items;
    use crate::tables::moments::MomentHash;
    use crate::test_helpers::*;
    use serde_json::json;

    const RECLAMATION_WM: &str = "/wm/reclamation.png";
    const SUBSUMED_WM: &str = "/wm/submersion.png";

    fn fixture() -> Fixture {
        Fixture::new()
            // watermark sources for the reclamation moment
            .item(items::THIRD_ITERATION_SCOUT_RIFLE, item("Third Iteration").weapon(KINETIC_BUCKET).watermark(RECLAMATION_WM))
            .item(items::SUBMERSION_COMBAT_BOW, item("Submersion").weapon(ENERGY_BUCKET).watermark(SUBSUMED_WM))
            .item(10, item("Scout").weapon(KINETIC_BUCKET).watermark(RECLAMATION_WM))
            .item(11, item("Bow").weapon(ENERGY_BUCKET).watermark(SUBSUMED_WM))
            .item(12, item("Helm").armor(HELMET_BUCKET, 0).watermark(RECLAMATION_WM))
            // reprint of 10 without a collectible
            .item(13, item("Scout").weapon(KINETIC_BUCKET).watermark(RECLAMATION_WM).collectible(None))
            // dummy
            .item(14, item("Scout").weapon(KINETIC_BUCKET).watermark(RECLAMATION_WM).dummy())
            // unknown watermark
            .item(15, item("Other").weapon(KINETIC_BUCKET).watermark("/wm/unknown.png"))
            // explicitly listed by the revelry
            .item(items::ARBALEST_LINEAR_FUSION_RIFLE, item("Arbalest").weapon(ENERGY_BUCKET).watermark(RECLAMATION_WM))
    }

    fn collections(fixture: &Fixture) -> std::sync::Arc<Collections> {
        fixture.context().collections().unwrap()
    }

    #[test]
    fn items_grouped_by_moment_and_bucket() {
        let collections = collections(&fixture());
        let reclamation = &collections.moments[&MomentHash::SeasonReclamation.hash()];
        assert_eq!(
            reclamation.buckets[&KINETIC_BUCKET],
            vec![10, items::THIRD_ITERATION_SCOUT_RIFLE]
        );
        assert_eq!(reclamation.buckets[&HELMET_BUCKET], vec![12]);
        assert!(reclamation.buckets[&ENERGY_BUCKET].contains(&11));
        assert!(!collections.contains(13));
        assert!(!collections.contains(14));
        assert!(!collections.contains(15));
    }

    #[test]
    fn explicit_item_hashes_win_over_watermark() {
        let collections = collections(&fixture());
        let revelry = &collections.moments[&MomentHash::TheRevelry.hash()];
        assert_eq!(
            revelry.buckets[&ENERGY_BUCKET],
            vec![items::ARBALEST_LINEAR_FUSION_RIFLE]
        );
        let reclamation = &collections.moments[&MomentHash::SeasonReclamation.hash()];
        assert!(!reclamation.buckets[&ENERGY_BUCKET].contains(&items::ARBALEST_LINEAR_FUSION_RIFLE));
    }

    #[test]
    fn watermark_lookup_includes_subsumed() {
        let collections = collections(&fixture());
        let reclamation = MomentHash::SeasonReclamation.hash();
        assert_eq!(collections.moment_for_watermark(RECLAMATION_WM), Some(reclamation));
        assert_eq!(collections.moment_for_watermark(SUBSUMED_WM), Some(reclamation));
        assert_eq!(collections.moment_for_watermark("/wm/unknown.png"), None);
    }

    #[test]
    fn canonicalize_is_idempotent_for_collections_items() {
        let fixture = fixture();
        let ctx = fixture.context();
        let collections = ctx.collections().unwrap();
        let table = ctx.manifest().inventory_items().unwrap();
        for hash in collections.item_hashes() {
            assert_eq!(collections.canonicalize_hash(&table, *hash), Some(*hash));
        }
    }

    #[test]
    fn reprints_fold_into_the_collections_copy() {
        let fixture = fixture();
        let ctx = fixture.context();
        let collections = ctx.collections().unwrap();
        let table = ctx.manifest().inventory_items().unwrap();
        assert_eq!(collections.canonicalize_hash(&table, 13), Some(10));
        assert_eq!(collections.copies(&table, [13, 15, 404, 12]), vec![10, 12]);
    }

    #[test]
    fn items_without_name_or_watermark_have_no_canonical_copy() {
        let fixture = Fixture::new()
            // collected through the revelry's explicit list, no watermark
            .item(
                items::ARBALEST_LINEAR_FUSION_RIFLE,
                item("Arbalest").weapon(ENERGY_BUCKET),
            )
            .item(20, item("Arbalest").weapon(ENERGY_BUCKET).collectible(None))
            .item(
                21,
                item("").weapon(KINETIC_BUCKET).watermark(RECLAMATION_WM).collectible(None),
            );
        let ctx = fixture.context();
        let collections = ctx.collections().unwrap();
        let table = ctx.manifest().inventory_items().unwrap();

        assert!(collections.contains(items::ARBALEST_LINEAR_FUSION_RIFLE));
        assert_eq!(canonical_key(table.get(20).unwrap()), None);
        assert_eq!(canonical_key(table.get(21).unwrap()), None);
        assert_eq!(collections.canonicalize_hash(&table, 20), None);
        assert_eq!(collections.canonicalize_hash(&table, 21), None);
        assert_eq!(
            canonical_key(table.get(items::ARBALEST_LINEAR_FUSION_RIFLE).unwrap()),
            None
        );
    }

    #[test]
    fn every_moment_has_an_entry() {
        let ctx = Fixture::new().context();
        let artifacts = build(&ctx).unwrap();
        let json = artifacts[0].as_json().unwrap();
        let entry = entry(json, MomentHash::TheDawning.hash());
        assert_eq!(entry, &json!({ "hash": MomentHash::TheDawning.hash(), "buckets": {} }));
        assert_eq!(artifacts[0].file_name, FILE_NAME);
    }
}
