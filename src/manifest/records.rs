//! Serde models of the manifest records the builders read.
//!
//! Only the fields in use are modelled; everything else in the upstream JSON
//! is ignored. All structs default missing fields so partial fixtures (and
//! older snapshots) still parse.

use super::{Component, Definition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Treat `""` the same as an absent string.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayProperties {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_hash: Option<u32>,
    #[serde(skip_serializing_if = "is_false")]
    pub has_icon: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub icon_sequences: Vec<IconSequence>,
}

impl DisplayProperties {
    pub fn icon(&self) -> Option<&str> {
        non_empty(&self.icon)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconSequence {
    pub frames: Vec<String>,
}

// ============================================================================
// Inventory items
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InventoryItem {
    pub hash: u32,
    pub display_properties: DisplayProperties,
    pub icon_watermark: Option<String>,
    pub icon_watermark_shelved: Option<String>,
    pub icon_watermark_featured: Option<String>,
    pub secondary_icon: Option<String>,
    pub screenshot: Option<String>,
    pub class_type: u32,
    pub inventory: Option<ItemInventory>,
    pub item_category_hashes: Vec<u32>,
    pub sockets: Option<ItemSockets>,
    pub collectible_hash: Option<u32>,
    pub is_holofoil: bool,
    pub item_type_display_name: String,
    pub equippable: bool,
    pub plug: Option<ItemPlug>,
}

impl Definition for InventoryItem {
    const COMPONENT: Component = Component::InventoryItem;
}

impl InventoryItem {
    pub fn name(&self) -> &str {
        &self.display_properties.name
    }

    pub fn watermark(&self) -> Option<&str> {
        non_empty(&self.icon_watermark)
    }

    pub fn watermark_shelved(&self) -> Option<&str> {
        non_empty(&self.icon_watermark_shelved)
    }

    pub fn secondary_icon(&self) -> Option<&str> {
        non_empty(&self.secondary_icon)
    }

    pub fn has_screenshot(&self) -> bool {
        non_empty(&self.screenshot).is_some()
    }

    pub fn in_category(&self, category: u32) -> bool {
        self.item_category_hashes.contains(&category)
    }

    pub fn bucket_hash(&self) -> Option<u32> {
        self.inventory.as_ref().map(|i| i.bucket_type_hash)
    }

    pub fn tier_hash(&self) -> Option<u32> {
        self.inventory.as_ref().map(|i| i.tier_type_hash)
    }

    pub fn socket_entries(&self) -> &[SocketEntry] {
        self.sockets
            .as_ref()
            .map(|s| s.socket_entries.as_slice())
            .unwrap_or_default()
    }

    /// Initial plug of every socket, skipping empty sockets.
    pub fn initial_plugs(&self) -> impl Iterator<Item = u32> + '_ {
        self.socket_entries()
            .iter()
            .map(|s| s.single_initial_item_hash)
            .filter(|hash| *hash != 0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemInventory {
    pub bucket_type_hash: u32,
    pub tier_type_hash: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemSockets {
    pub socket_entries: Vec<SocketEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SocketEntry {
    pub socket_type_hash: u32,
    pub single_initial_item_hash: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemPlug {
    pub plug_category_identifier: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SocketType {
    pub hash: u32,
    pub plug_whitelist: Vec<PlugWhitelistEntry>,
}

impl Definition for SocketType {
    const COMPONENT: Component = Component::SocketType;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlugWhitelistEntry {
    pub category_identifier: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemCategory {
    pub hash: u32,
    pub display_properties: DisplayProperties,
}

impl Definition for ItemCategory {
    const COMPONENT: Component = Component::ItemCategory;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Icon {
    pub hash: u32,
    pub foreground: Option<String>,
}

impl Definition for Icon {
    const COMPONENT: Component = Component::Icon;
}

// ============================================================================
// Activities
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Activity {
    pub hash: u32,
    pub display_properties: DisplayProperties,
    pub original_display_properties: DisplayProperties,
    pub selection_screen_display_properties: Option<DisplayProperties>,
    pub pgcr_image: Option<String>,
    pub activity_type_hash: u32,
    pub activity_mode_hashes: Vec<u32>,
    pub rewards: Vec<ActivityReward>,
}

impl Definition for Activity {
    const COMPONENT: Component = Component::Activity;
}

impl Activity {
    pub fn selection_name(&self) -> Option<&str> {
        self.selection_screen_display_properties
            .as_ref()
            .map(|d| d.name.as_str())
    }

    pub fn reward_item_hashes(&self) -> impl Iterator<Item = u32> + '_ {
        self.rewards
            .iter()
            .flat_map(|r| r.reward_items.iter().map(|i| i.item_hash))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityReward {
    pub reward_items: Vec<ItemQuantity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemQuantity {
    pub item_hash: u32,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityType {
    pub hash: u32,
    pub display_properties: DisplayProperties,
}

impl Definition for ActivityType {
    const COMPONENT: Component = Component::ActivityType;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityGraph {
    pub hash: u32,
    pub nodes: Vec<ActivityGraphNode>,
}

impl Definition for ActivityGraph {
    const COMPONENT: Component = Component::ActivityGraph;
}

impl ActivityGraph {
    pub fn activity_hashes(&self) -> impl Iterator<Item = u32> + '_ {
        self.nodes
            .iter()
            .flat_map(|n| n.activities.iter().map(|a| a.activity_hash))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityGraphNode {
    pub node_id: u32,
    pub activities: Vec<ActivityGraphNodeActivity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityGraphNodeActivity {
    pub activity_hash: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FireteamFinderActivityGraph {
    pub hash: u32,
    pub display_properties: DisplayProperties,
    pub self_and_all_descendant_hashes: Vec<u32>,
    pub related_director_nodes: Vec<RelatedDirectorNode>,
}

impl Definition for FireteamFinderActivityGraph {
    const COMPONENT: Component = Component::FireteamFinderActivityGraph;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelatedDirectorNode {
    pub activity_graph_hash: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalConstants {
    pub hash: u32,
    /// Fireteam finder graph hash (as a string key) → portal icon path.
    pub portal_activity_graph_root_nodes_with_icons: BTreeMap<String, String>,
}

impl Definition for GlobalConstants {
    const COMPONENT: Component = Component::GlobalConstants;
}

/// One entry of the snapshot's live activity list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveActivity {
    pub activity_hash: u32,
    pub visible_rewards: Vec<LiveReward>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveReward {
    pub reward_items: Vec<LiveRewardItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveRewardItem {
    pub item_quantity: ItemQuantity,
    pub ui_style: String,
}

// ============================================================================
// Vendors, seasons, events
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Vendor {
    pub hash: u32,
    pub display_properties: DisplayProperties,
    pub display_categories: Vec<VendorDisplayCategory>,
    pub item_list: Vec<VendorItem>,
}

impl Definition for Vendor {
    const COMPONENT: Component = Component::Vendor;
}

impl Vendor {
    pub fn sells(&self, item_hash: u32) -> bool {
        self.item_list.iter().any(|i| i.item_hash == item_hash)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VendorDisplayCategory {
    pub identifier: String,
    pub display_properties: DisplayProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VendorItem {
    pub item_hash: u32,
    pub display_category_index: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Season {
    pub hash: u32,
    pub display_properties: DisplayProperties,
    pub season_number: u32,
    pub season_pass_list: Vec<SeasonPassReference>,
}

impl Definition for Season {
    const COMPONENT: Component = Component::Season;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeasonPassReference {
    pub season_pass_hash: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeImages {
    pub theme_background_image_path: Option<String>,
}

impl ThemeImages {
    pub fn background(&self) -> Option<&str> {
        non_empty(&self.theme_background_image_path)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeasonPass {
    pub hash: u32,
    pub display_properties: DisplayProperties,
    pub images: Option<ThemeImages>,
}

impl Definition for SeasonPass {
    const COMPONENT: Component = Component::SeasonPass;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventCard {
    pub hash: u32,
    pub display_properties: DisplayProperties,
    pub images: Option<ThemeImages>,
}

impl Definition for EventCard {
    const COMPONENT: Component = Component::EventCard;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inventory_item_parses_partial_record() {
        let item: InventoryItem = serde_json::from_value(json!({
            "hash": 1,
            "displayProperties": { "name": "Thing", "iconSequences": [{ "frames": ["/a.png"] }] },
            "iconWatermark": "",
            "inventory": { "bucketTypeHash": 7, "tierTypeHash": 9 },
            "sockets": { "socketEntries": [
                { "socketTypeHash": 3, "singleInitialItemHash": 0 },
                { "socketTypeHash": 4, "singleInitialItemHash": 55 }
            ] }
        }))
        .unwrap();
        assert_eq!(item.name(), "Thing");
        assert_eq!(item.watermark(), None);
        assert_eq!(item.bucket_hash(), Some(7));
        assert_eq!(item.initial_plugs().collect::<Vec<_>>(), vec![55]);
        assert_eq!(item.display_properties.icon_sequences[0].frames[0], "/a.png");
    }

    #[test]
    fn display_properties_serialize_compactly() {
        let display = DisplayProperties {
            name: "A".into(),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&display).unwrap(),
            json!({ "name": "A", "description": "" })
        );
    }
}
