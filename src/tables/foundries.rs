//! Weapon foundries and the overlay image each one stamps on its weapons.
//!
//! Every foundry names an exemplar weapon; the foundry's overlay is that
//! weapon's `secondaryIcon`. Any weapon overlay in the manifest that no
//! foundry claims means the table is out of date: a warning in dev, an
//! error in prod.

use crate::context::BuildContext;
use crate::hashes::{item, item_category, record};
use crate::manifest::Component;
use crate::reference::{self, DeepsightDisplayProperties, DisplayPropertiesRef, Field, Reference};
use crate::tables::{Artifact, BuildError, exported_enum};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const FILE_NAME: &str = "DeepsightWeaponFoundryDefinition.json";

/// Prefix for manifest image paths in messages.
const BUNGIE_NET: &str = "https://www.bungie.net";

exported_enum! {
    pub enum FoundryHash as "FoundryHashes" {
        FieldForged = 1,
        Cassoid = 2,
        Nadir = 3,
        TexMechanica = 4,
        Suros = 5,
        Hakke = 6,
        Veist = 7,
        Omolon = 8,
        BlackArmory = 9,
        Brave = 10,
        Daito = 11,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepsightWeaponFoundryDefinition {
    pub hash: FoundryHash,
    pub display_properties: DeepsightDisplayProperties,
    pub overlay: String,
}

pub type FoundryTable = BTreeMap<u32, DeepsightWeaponFoundryDefinition>;

pub struct FoundryData {
    pub hash: FoundryHash,
    pub display: DisplayPropertiesRef,
    /// Weapon whose secondary icon is the foundry overlay.
    pub overlay: Reference,
}

fn foundry(hash: FoundryHash, name: &str, icon: Reference, overlay_weapon: u32) -> FoundryData {
    FoundryData {
        hash,
        display: DisplayPropertiesRef::new().name(name).icon(icon),
        overlay: Reference::hash(Component::InventoryItem, overlay_weapon),
    }
}

fn plug(hash: u32) -> Reference {
    Reference::hash(Component::InventoryItem, hash)
}

/// The foundry table. Daito's icon is a generated image served by the app.
pub fn foundry_data(hostname: &str) -> Vec<FoundryData> {
    let hostname = hostname.to_string();
    let daito_icon = Reference::custom(Component::InventoryItem, item::THE_FATE_OF_ALL_FOOLS_INTRINSIC, move |plug| {
        let icon_hash = plug.get("displayProperties")?.get("iconHash")?.as_u64()?;
        Some(format!("{hostname}image/generated/{icon_hash}.png"))
    });

    vec![
        foundry(
            FoundryHash::FieldForged,
            "Field-Forged",
            plug(item::FIELD_TESTED_ORIGIN_TRAIT),
            item::HAWTHORNES_FIELD_FORGED_SHOTGUN,
        ),
        foundry(
            FoundryHash::Cassoid,
            "Cassoid",
            plug(item::WILD_CARD_ORIGIN_TRAIT),
            item::NOX_PERENNIAL_FUSION_RIFLE,
        ),
        foundry(FoundryHash::Nadir, "Nadir", plug(item::NADIR_FOCUS_ORIGIN_TRAIT), item::GEODETIC_HSM_SWORD),
        foundry(
            FoundryHash::TexMechanica,
            "Tex Mechanica",
            plug(item::TEX_BALANCED_STOCK_ORIGIN_TRAIT),
            item::BOONDOGGLE_MK55_SUBMACHINE_GUN,
        ),
        foundry(FoundryHash::Suros, "SUROS", plug(item::SUROS_SYNERGY_ORIGIN_TRAIT), item::CANTATA_57_HAND_CANNON),
        foundry(
            FoundryHash::Hakke,
            "Häkke",
            plug(item::HAKKE_BREACH_ARMAMENTS_ORIGIN_TRAIT),
            item::PERSES_D_SCOUT_RIFLE,
        ),
        foundry(
            FoundryHash::Veist,
            "VEIST",
            plug(item::VEIST_STINGER_ORIGIN_TRAIT),
            item::SUSPECTUM_4FR_LINEAR_FUSION_RIFLE,
        ),
        foundry(
            FoundryHash::Omolon,
            "Omolon",
            plug(item::OMOLON_FLUID_DYNAMICS_ORIGIN_TRAIT),
            item::AURVANDIL_FR6_FUSION_RIFLE,
        ),
        foundry(
            FoundryHash::BlackArmory,
            "Black Armory",
            Reference::hash(Component::Record, record::EDZ_BLACK_ARMORY_SMITH),
            item::TATARA_GAZE_SNIPER_RIFLE,
        ),
        foundry(
            FoundryHash::Brave,
            "BRAVE",
            Reference::hash(Component::Record, record::BRAVE_COLLECTOR),
            item::HAMMERHEAD_MACHINE_GUN,
        ),
        foundry(FoundryHash::Daito, "Daito", daito_icon, item::THE_JADE_RABBIT_SCOUT_RIFLE),
    ]
}

pub fn build(ctx: &BuildContext) -> Result<Vec<Artifact>, BuildError> {
    let manifest = ctx.manifest();

    let mut table = FoundryTable::new();
    for data in foundry_data(&ctx.settings().hostname) {
        let overlay = reference::resolve(manifest, Some(&data.overlay), Field::SecondaryIcon, &[])?
            .ok_or_else(|| {
                BuildError::Unresolved(format!("Unable to resolve foundry overlay icon for {}", data.hash.name()))
            })?;
        table.insert(
            data.hash.value(),
            DeepsightWeaponFoundryDefinition {
                hash: data.hash,
                display_properties: reference::resolve_all(manifest, Some(&data.display), &[])?,
                overlay,
            },
        );
    }

    let overlays: BTreeSet<&str> = table.values().map(|foundry| foundry.overlay.as_str()).collect();
    let items = manifest.inventory_items()?;
    let weapon_overlays: BTreeSet<&str> = items
        .values()
        .filter(|item| item.in_category(item_category::WEAPON))
        .filter_map(|item| item.secondary_icon())
        .collect();

    for image in weapon_overlays.difference(&overlays) {
        if ctx.is_dev() {
            log::warn!("Foundry overlay image without definition: {BUNGIE_NET}{image}");
        } else {
            return Err(BuildError::Unresolved(format!(
                "No foundry definition for overlay image {BUNGIE_NET}{image}"
            )));
        }
    }

    Ok(vec![Artifact::json(FILE_NAME, &table)?])
}
