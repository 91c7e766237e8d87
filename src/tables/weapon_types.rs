//! Weapon type categories, named and iconed after the Gunsmith's orders.
//!
//! The manifest's own weapon category names are singular ("Hand Cannon") and
//! often lack icons. Gunsmith Order items carry the plural name and a proper
//! icon, so each category borrows from the order whose simplified name
//! contains the category's, preferring the closest name length.

use crate::context::BuildContext;
use crate::hashes::item_category;
use crate::manifest::{DisplayProperties, Icon, InventoryItem, ItemCategory, Table};
use crate::tables::{Artifact, BuildError};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const FILE_NAME: &str = "DeepsightWeaponTypeDefinition.json";

const GUNSMITH_ORDER: &str = "Gunsmith Order";

/// Categories every weapon carries that are not weapon types.
const EXCLUDED_CATEGORIES: &[u32] = &[
    item_category::WEAPON,
    item_category::DUMMIES,
    item_category::INVENTORY,
    item_category::WEAPON_MODS,
    item_category::WEAPON_MODS_ORNAMENTS,
    item_category::MODS_VISIBLE_FALSE,
    item_category::MODS_VISIBLE_TRUE,
    item_category::KINETIC_WEAPON,
    item_category::ENERGY_WEAPON,
    item_category::POWER_WEAPON,
    item_category::BREAKER_DISRUPTION,
    item_category::BREAKER_PIERCING,
    item_category::BREAKER_STAGGER,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepsightWeaponTypeDefinition {
    pub hash: u32,
    pub display_properties: DisplayProperties,
}

pub type WeaponTypeTable = BTreeMap<u32, DeepsightWeaponTypeDefinition>;

/// Lowercase, word characters only.
fn simplify(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// The order naming `category`, closest name length first.
fn closest_order<'a>(category: &str, orders: &[&'a InventoryItem]) -> Option<&'a InventoryItem> {
    let simplified = simplify(category);
    let length = category.chars().count();
    orders
        .iter()
        .filter(|order| simplify(order.name()).contains(&simplified))
        .min_by_key(|order| order.name().chars().count().abs_diff(length))
        .copied()
}

pub fn compute(
    items: &Table<InventoryItem>,
    categories: &Table<ItemCategory>,
    icons: &Table<Icon>,
) -> Result<WeaponTypeTable, BuildError> {
    let weapon_categories: BTreeSet<u32> = items
        .values()
        .filter(|item| item.in_category(item_category::WEAPON))
        .flat_map(|item| item.item_category_hashes.iter().copied())
        .filter(|hash| !EXCLUDED_CATEGORIES.contains(hash))
        .collect();

    let orders = items.filter(|item| item.item_type_display_name == GUNSMITH_ORDER);

    let mut table = WeaponTypeTable::new();
    for category in weapon_categories.iter().filter_map(|hash| categories.get(*hash)) {
        let order = closest_order(&category.display_properties.name, &orders);

        let mut display_properties = category.display_properties.clone();
        if let Some(order) = order {
            display_properties.name = order.name().to_string();
            let icon = icons
                .get_opt(order.display_properties.icon_hash)
                .and_then(|icon| icon.foreground.clone())
                .or_else(|| order.display_properties.icon.clone());
            if icon.is_some() {
                display_properties.icon = icon;
            }
        }

        table.insert(
            category.hash,
            DeepsightWeaponTypeDefinition {
                hash: category.hash,
                display_properties,
            },
        );
    }

    let hand_cannons = table
        .get(&item_category::HAND_CANNON)
        .map(|definition| definition.display_properties.name.as_str());
    if hand_cannons != Some("Hand Cannons") {
        return Err(BuildError::Validation("DeepsightWeaponTypeDefinition"));
    }

    Ok(table)
}

pub fn build(ctx: &BuildContext) -> Result<Vec<Artifact>, BuildError> {
    let manifest = ctx.manifest();
    let table = compute(
        &*manifest.inventory_items()?,
        &*manifest.item_categories()?,
        &*manifest.icons()?,
    )?;
    Ok(vec![Artifact::json(FILE_NAME, &table)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Component;
    use crate::test_helpers::*;
    use serde_json::json;

    const ORDER_ICON: u32 = 4000;

    fn category(name: &str) -> serde_json::Value {
        json!({ "displayProperties": { "name": name, "description": format!("{name}s"), "icon": "/category.png" } })
    }

    fn fixture() -> Fixture {
        Fixture::new()
            .item(
                1,
                item("Fatebringer")
                    .weapon(KINETIC_BUCKET)
                    .categories(&[item_category::KINETIC_WEAPON, item_category::HAND_CANNON]),
            )
            .item(
                2,
                item("Jade Rabbit")
                    .weapon(KINETIC_BUCKET)
                    .categories(&[item_category::SCOUT_RIFLE, item_category::BREAKER_PIERCING]),
            )
            .item(3, item("Ghost").categories(&[item_category::AUTO_RIFLE]))
            .item(10, item("Hand Cannons").type_name(GUNSMITH_ORDER).icon("/order/hc.png").icon_hash(ORDER_ICON))
            .item(11, item("Hand Cannons and Sidearms").type_name(GUNSMITH_ORDER))
            .item(12, item("Scout Rifles").type_name(GUNSMITH_ORDER).icon("/order/scout.png"))
            .item(13, item("Hand Cannons").type_name("Bounty"))
            .with(Component::Icon, ORDER_ICON, json!({ "foreground": "/icon/hc-foreground.png" }))
            .with(Component::ItemCategory, item_category::HAND_CANNON, category("Hand Cannon"))
            .with(Component::ItemCategory, item_category::SCOUT_RIFLE, category("Scout Rifle"))
            .with(Component::ItemCategory, item_category::AUTO_RIFLE, category("Auto Rifle"))
            .with(Component::ItemCategory, item_category::KINETIC_WEAPON, category("Kinetic Weapon"))
    }

    fn compute_fixture(fixture: &Fixture) -> Result<WeaponTypeTable, BuildError> {
        let manifest = fixture.manifest();
        compute(
            &manifest.inventory_items().unwrap(),
            &manifest.item_categories().unwrap(),
            &manifest.icons().unwrap(),
        )
    }

    #[test]
    fn only_weapon_type_categories() {
        let table = compute_fixture(&fixture()).unwrap();
        let hashes: Vec<u32> = table.keys().copied().collect();
        assert_eq!(hashes, vec![item_category::HAND_CANNON, item_category::SCOUT_RIFLE]);
    }

    #[test]
    fn closest_order_names_and_icons() {
        let table = compute_fixture(&fixture()).unwrap();
        let hand_cannon = &table[&item_category::HAND_CANNON].display_properties;
        assert_eq!(hand_cannon.name, "Hand Cannons");
        assert_eq!(hand_cannon.icon.as_deref(), Some("/icon/hc-foreground.png"));
        assert_eq!(hand_cannon.description, "Hand Cannons");

        // no icon definition, falls back to the order's own icon
        let scout = &table[&item_category::SCOUT_RIFLE].display_properties;
        assert_eq!(scout.name, "Scout Rifles");
        assert_eq!(scout.icon.as_deref(), Some("/order/scout.png"));
    }

    #[test]
    fn hand_cannon_validation() {
        let fixture = fixture().item(10, item("Sidearms").type_name(GUNSMITH_ORDER));
        // only the combined order is left, which still names hand cannons
        let table = compute_fixture(&fixture);
        assert!(matches!(table, Err(BuildError::Validation("DeepsightWeaponTypeDefinition"))));
    }

    #[test]
    fn simplified_matching() {
        assert_eq!(simplify("Linear Fusion-Rifles!"), "linearfusionrifles");
        let a = item_record("Sidearms");
        let b = item_record("Sidearm Ornaments and Orders");
        let orders = [&a, &b];
        assert_eq!(closest_order("Sidearm", &orders).map(|o| o.name()), Some("Sidearms"));
        assert!(closest_order("Bow", &orders).is_none());
    }

    fn item_record(name: &str) -> InventoryItem {
        serde_json::from_value(item(name).into()).unwrap()
    }
}
