//! Adept weapons and the base weapon each one upgrades.
//!
//! Adept copies are named `<base> (<suffix>)`, e.g. `Fatebringer (Timelost)`.
//! The base is the collections item with the same (overridden) name and the
//! same watermark. Pairing is best effort: adepts without a unique match are
//! skipped without complaint.

use crate::context::BuildContext;
use crate::hashes::tier;
use crate::manifest::Manifest;
use crate::tables::collections::{Collections, is_equippable_dummy};
use crate::tables::{Artifact, BuildError};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const FILE_NAME: &str = "DeepsightAdeptDefinition.json";

static ADEPT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?) \(.*?\)\s*$").expect("adept name pattern is valid"));

/// Names that differ between an adept and its base.
const NAME_OVERRIDES: &[(&str, &str)] = &[("Judgement", "Judgment")];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeepsightAdeptDefinition {
    pub hash: u32,
    pub base: u32,
}

pub type AdeptTable = BTreeMap<u32, DeepsightAdeptDefinition>;

/// The base name of an adept-style name, or `None` if it has no suffix.
///
/// ```text
/// "Fatebringer (Timelost)"  → Some("Fatebringer")
/// "Fatebringer"             → None
/// ```
pub fn adept_base_name(name: &str) -> Option<&str> {
    ADEPT_NAME
        .captures(name)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .filter(|base| !base.is_empty())
}

fn override_name(name: &str) -> &str {
    NAME_OVERRIDES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .unwrap_or(name)
}

pub fn compute(manifest: &Manifest, collections: &Collections) -> Result<AdeptTable, BuildError> {
    let items = manifest.inventory_items()?;
    let candidates: Vec<_> = collections
        .item_hashes()
        .iter()
        .filter_map(|hash| items.get(*hash))
        .collect();

    let mut table = AdeptTable::new();
    for adept in &candidates {
        if adept.name().is_empty() || is_equippable_dummy(adept) {
            continue;
        }
        if adept.tier_hash() != Some(tier::LEGENDARY) {
            continue;
        }
        let Some(base_name) = adept_base_name(adept.name()) else {
            continue;
        };

        let base_name = override_name(base_name);
        let base = candidates.iter().find(|item| {
            override_name(item.name()) == base_name
                && !is_equippable_dummy(item)
                && item.watermark() == adept.watermark()
        });

        if let Some(base) = base {
            table.insert(
                adept.hash,
                DeepsightAdeptDefinition {
                    hash: adept.hash,
                    base: base.hash,
                },
            );
        }
    }
    Ok(table)
}

pub fn build(ctx: &BuildContext) -> Result<Vec<Artifact>, BuildError> {
    let adept = ctx.adept()?;
    Ok(vec![Artifact::json(FILE_NAME, &*adept)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashes::item as items;
    use crate::test_helpers::*;

    const WM: &str = "/wm/reclamation.png";

    fn fixture() -> Fixture {
        // the moment's watermark comes from this item
        Fixture::new().item(
            items::THIRD_ITERATION_SCOUT_RIFLE,
            item("Third Iteration").weapon(KINETIC_BUCKET).watermark(WM),
        )
    }

    #[test]
    fn base_name_pattern() {
        assert_eq!(adept_base_name("Fatebringer (Timelost)"), Some("Fatebringer"));
        assert_eq!(adept_base_name("Judgement (Harrowed) "), Some("Judgement"));
        assert_eq!(adept_base_name("Fatebringer"), None);
        assert_eq!(adept_base_name("(Adept)"), None);
    }

    #[test]
    fn pairs_adept_with_same_watermark_base() {
        let ctx = fixture()
            .item(10, item("Fatebringer").weapon(KINETIC_BUCKET).watermark(WM))
            .item(11, item("Fatebringer (Timelost)").weapon(KINETIC_BUCKET).watermark(WM))
            .context();
        let adept = ctx.adept().unwrap();
        assert_eq!(adept[&11], DeepsightAdeptDefinition { hash: 11, base: 10 });
        assert!(!adept.contains_key(&10));
    }

    #[test]
    fn name_override_applies_to_both_sides() {
        let ctx = fixture()
            .item(20, item("Judgment").weapon(KINETIC_BUCKET).watermark(WM))
            .item(21, item("Judgement (Harrowed)").weapon(KINETIC_BUCKET).watermark(WM))
            .context();
        assert_eq!(ctx.adept().unwrap()[&21].base, 20);
    }

    #[test]
    fn dummies_and_exotics_are_skipped() {
        let ctx = fixture()
            .item(30, item("Vision").weapon(KINETIC_BUCKET).watermark(WM))
            .item(31, item("Vision (Adept)").weapon(KINETIC_BUCKET).watermark(WM).tier(tier::EXOTIC))
            .item(40, item("Mirror").weapon(KINETIC_BUCKET).watermark(WM).dummy())
            .item(41, item("Mirror (Adept)").weapon(KINETIC_BUCKET).watermark(WM))
            .context();
        let adept = ctx.adept().unwrap();
        assert!(!adept.contains_key(&31));
        // the only base candidate is a dummy, and dummies never make it into collections
        assert!(!adept.contains_key(&41));
    }

    #[test]
    fn no_base_is_silently_skipped() {
        let ctx = fixture()
            .item(50, item("Lonely (Adept)").weapon(KINETIC_BUCKET).watermark(WM))
            .context();
        assert!(ctx.adept().unwrap().is_empty());
    }
}
