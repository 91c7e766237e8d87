//! Drop tables: what raids, dungeons, exotic missions and portal activities
//! reward.
//!
//! Three sources feed the table:
//!
//! ```text
//! static data   ──► display resolved against the activity, raid/dungeon
//!                   names from originalDisplayProperties, availability,
//!                   rotation bookkeeping
//! live data     ──► this week's exotic mission (normal + legend pair)
//!               ──► portal "bonus focus" activities
//! ```
//!
//! Live data comes from the snapshot's `activities.json`. Without it the
//! exotic mission and bonus focus entries are skipped; with it, failing to
//! find the exotic mission pair fails the build.

use crate::context::BuildContext;
use crate::hashes::{
    activity, activity_graph, activity_mode, activity_type, global_constants, item, presentation_node, record, traits,
};
use crate::manifest::{Activity, Component, LiveActivity, Manifest};
use crate::reference::{self, DeepsightDisplayProperties, DisplayPropertiesRef, DisplaySource, Field, Reference};
use crate::tables::collections::Collections;
use crate::tables::{Artifact, BuildError};
use crate::time::{self, Interval};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const FILE_NAME: &str = "DeepsightDropTableDefinition.json";

/// Reward ui style marking a portal activity's focused drops.
const BONUS_FOCUS_UI_STYLE: &str = "daily_grind";

/// Exotic missions whose reward list does not name the exotic weapon.
const EXOTIC_MISSION_WEAPONS: &[(&str, u32)] = &[
    ("Starcrossed", item::WISH_KEEPER_COMBAT_BOW),
    ("AVALON", item::VEXCALIBUR_GLAIVE),
    ("Encore", item::CHOIR_OF_ONE_AUTO_RIFLE),
    ("Kell's Fall", item::SLAYERS_FANG_SHOTGUN),
];

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Rotator,
    Repeatable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DropTableType {
    ExoticMission,
    Raid,
    Dungeon,
    BonusFocus,
}

/// Per-item drop details. Currently always empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DropTableItem {}

pub type DropTable = BTreeMap<u32, DropTableItem>;

fn drop_table(items: &[u32]) -> DropTable {
    items.iter().map(|hash| (*hash, DropTableItem::default())).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepsightDropTableMaster {
    pub activity_hash: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_table: Option<DropTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepsightDropTableRotations {
    pub anchor: String,
    pub interval: Interval,
    pub drops: Vec<u32>,
    /// Rotations elapsed since the anchor.
    pub current: i64,
    /// Start of the next rotation.
    pub next: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepsightDropTableDefinition {
    pub hash: u32,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<DropTableType>,
    pub display_properties: DeepsightDisplayProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_display_properties: Option<DeepsightDisplayProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_activity_hash: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_table: Option<DropTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master: Option<DeepsightDropTableMaster>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotations: Option<DeepsightDropTableRotations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pgcr_image: Option<String>,
}

pub type DropTableTable = BTreeMap<u32, DeepsightDropTableDefinition>;

// ============================================================================
// Static data
// ============================================================================

#[derive(Debug, Clone)]
pub struct RotationData {
    pub anchor: &'static str,
    pub interval: Interval,
    pub drops: &'static [u32],
}

#[derive(Debug, Clone)]
pub struct DropTableData {
    pub hash: u32,
    pub display: Option<DisplayPropertiesRef>,
    pub drops: &'static [u32],
    pub master: Option<(u32, &'static [u32])>,
    pub rotations: Option<RotationData>,
    pub rotation_activity_hash: Option<u32>,
    pub availability: Option<Availability>,
}

impl DropTableData {
    pub fn new(hash: u32, drops: &'static [u32]) -> Self {
        Self {
            hash,
            display: None,
            drops,
            master: None,
            rotations: None,
            rotation_activity_hash: None,
            availability: None,
        }
    }

    pub fn display(mut self, display: DisplayPropertiesRef) -> Self {
        self.display = Some(display);
        self
    }

    pub fn master(mut self, activity_hash: u32, drops: &'static [u32]) -> Self {
        self.master = Some((activity_hash, drops));
        self
    }

    pub fn rotations(mut self, anchor: &'static str, interval: Interval, drops: &'static [u32]) -> Self {
        self.rotations = Some(RotationData {
            anchor,
            interval,
            drops,
        });
        self
    }

    pub fn rotation_activity(mut self, activity_hash: u32) -> Self {
        self.rotation_activity_hash = Some(activity_hash);
        self
    }

    pub fn availability(mut self, availability: Availability) -> Self {
        self.availability = Some(availability);
        self
    }
}

pub fn drop_table_data() -> Vec<DropTableData> {
    vec![
        DropTableData::new(activity::LAST_WISH, &[]),
        DropTableData::new(activity::GARDEN_OF_SALVATION, &[]),
        DropTableData::new(activity::DEEP_STONE_CRYPT, &[]),
        DropTableData::new(activity::VOW_OF_THE_DISCIPLE, &[]),
        DropTableData::new(activity::ROOT_OF_NIGHTMARES, &[]),
        DropTableData::new(activity::SALVATIONS_EDGE, &[]),
        DropTableData::new(activity::THE_DESERT_PERPETUAL_STANDARD, &[item::WHIRLING_OVATION_ROCKET_LAUNCHER])
            .master(activity::THE_DESERT_PERPETUAL_EPIC_STANDARD, &[item::WHIRLING_OVATION_ROCKET_LAUNCHER]),
        DropTableData::new(activity::EQUILIBRIUM_STANDARD, &[item::HEIRLOOM_COMBAT_BOW]).rotations(
            "2025-07-15T17:00:00.000Z",
            Interval::Weekly,
            &[item::HEIRLOOM_COMBAT_BOW],
        ),
    ]
}

// ============================================================================
// Static tweaks
// ============================================================================

fn type_display(
    manifest: &Manifest,
    activity_type_hash: u32,
) -> Result<Option<(DropTableType, DeepsightDisplayProperties)>, BuildError> {
    let (kind, display) = match activity_type_hash {
        activity_type::RAID => (
            DropTableType::Raid,
            DisplayPropertiesRef::all_from(Reference::hash(Component::ActivityType, activity_type::RAID)),
        ),
        activity_type::DUNGEON => (
            DropTableType::Dungeon,
            DisplayPropertiesRef::new()
                .name(Reference::hash(Component::ActivityType, activity_type::DUNGEON))
                .description(Reference::hash(Component::ActivityType, activity_type::DUNGEON))
                .icon(Reference::hash(Component::ActivityMode, activity_mode::DUNGEON)),
        ),
        _ => return Ok(None),
    };
    Ok(Some((kind, reference::resolve_all(manifest, Some(&display), &[])?)))
}

fn rotations(
    data: &RotationData,
    now: DateTime<Utc>,
) -> Result<DeepsightDropTableRotations, BuildError> {
    let anchor = DateTime::parse_from_rfc3339(data.anchor)
        .map_err(|e| {
            BuildError::Unresolved(format!("Invalid rotation anchor {}: {e}", data.anchor))
        })?
        .with_timezone(&Utc);
    let next = time::next_rotation(anchor, data.interval, now).ok_or_else(|| {
        BuildError::Unresolved(format!("Next rotation after {} is out of range", data.anchor))
    })?;
    Ok(DeepsightDropTableRotations {
        anchor: data.anchor.to_string(),
        interval: data.interval,
        drops: data.drops.to_vec(),
        current: time::rotation_index(anchor, data.interval, now),
        next: time::iso(next),
    })
}

/// Resolve the static drop tables against the manifest.
pub fn resolve_static(
    manifest: &Manifest,
    data: &[DropTableData],
    now: DateTime<Utc>,
) -> Result<DropTableTable, BuildError> {
    let activities = manifest.activities()?;
    let mut table = DropTableTable::new();

    for data in data {
        let activity = activities
            .get(data.hash)
            .or_else(|| activities.get_opt(data.rotation_activity_hash));
        let alternatives: Vec<&dyn DisplaySource> = activity.iter().map(|a| *a as &dyn DisplaySource).collect();
        let mut display_properties = reference::resolve_all(manifest, data.display.as_ref(), &alternatives)?;

        let mut kind = None;
        let mut type_display_properties = None;
        if let Some(activity) = activity
            && let Some((activity_kind, type_props)) = type_display(manifest, activity.activity_type_hash)?
        {
            display_properties.name = activity.original_display_properties.name.clone();
            if data.availability.is_none() {
                kind = Some(activity_kind);
                type_display_properties = Some(type_props);
            }
        }

        let availability = data.availability.unwrap_or(Availability::Repeatable);
        let master = data.master.map(|(activity_hash, drops)| DeepsightDropTableMaster {
            activity_hash,
            availability: data.availability.is_none().then_some(Availability::Repeatable),
            drop_table: Some(drop_table(drops)),
        });

        let rotations = data.rotations.as_ref().map(|r| rotations(r, now)).transpose()?;

        table.insert(
            data.hash,
            DeepsightDropTableDefinition {
                hash: data.hash,
                kind,
                display_properties,
                type_display_properties,
                rotation_activity_hash: data.rotation_activity_hash,
                drop_table: Some(drop_table(data.drops)),
                master,
                rotations,
                availability: Some(availability),
                end_time: None,
                pgcr_image: None,
            },
        );
    }

    Ok(table)
}

// ============================================================================
// Exotic mission
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Normal,
    Legend,
}

/// Difficulty named exactly by a selection screen name.
fn selection_difficulty(name: &str) -> Option<Difficulty> {
    match name {
        "Standard" | "Normal" => Some(Difficulty::Normal),
        "Legend" | "Expert" => Some(Difficulty::Legend),
        _ => None,
    }
}

/// Difficulty mentioned anywhere in a display name.
fn display_difficulty(name: &str) -> Option<Difficulty> {
    if name.contains("Normal") || name.contains("Standard") {
        Some(Difficulty::Normal)
    } else if name.contains("Legend") || name.contains("Expert") {
        Some(Difficulty::Legend)
    } else {
        None
    }
}

fn looks_legend(activity: &Activity) -> bool {
    let names = [Some(activity.display_properties.name.as_str()), activity.selection_name()];
    names
        .into_iter()
        .flatten()
        .any(|name| name.contains("Legend") || name.contains("Expert"))
}

/// Pick the normal and legend difficulties of this week's exotic mission.
///
/// Precedence, each pass only running while a difficulty is still missing:
///
/// 1. exact selection screen names (`Standard`/`Normal`, `Legend`/`Expert`);
/// 2. display names containing those words;
/// 3. with only a legend found, any mission that does not look like a legend.
///
/// Later matches overwrite earlier ones within a pass.
pub fn classify_exotic_missions<'a>(missions: &[&'a Activity]) -> Option<(&'a Activity, &'a Activity)> {
    let mut normal = None;
    let mut legend = None;
    fn assign<'a>(
        normal: &mut Option<&'a Activity>,
        legend: &mut Option<&'a Activity>,
        mission: &'a Activity,
        difficulty: Option<Difficulty>,
    ) {
        match difficulty {
            Some(Difficulty::Normal) => *normal = Some(mission),
            Some(Difficulty::Legend) => *legend = Some(mission),
            None => {}
        }
    }

    for mission in missions {
        assign(&mut normal, &mut legend, mission, mission.selection_name().and_then(selection_difficulty));
    }
    if normal.is_none() || legend.is_none() {
        for mission in missions {
            assign(&mut normal, &mut legend, mission, display_difficulty(&mission.display_properties.name));
        }
    }
    if normal.is_none() && legend.is_some() {
        for mission in missions {
            if !looks_legend(mission) {
                normal = Some(*mission);
            }
        }
    }

    normal.zip(legend)
}

fn exotic_mission(
    manifest: &Manifest,
    collections: &Collections,
    live: &[LiveActivity],
    now: DateTime<Utc>,
) -> Result<DeepsightDropTableDefinition, BuildError> {
    let graphs = manifest.activity_graphs()?;
    let activities = manifest.activities()?;
    let items = manifest.inventory_items()?;

    let node_activities: Vec<u32> = graphs
        .get(activity_graph::LEGENDS)
        .and_then(|graph| {
            graph
                .nodes
                .iter()
                .find(|node| node.node_id == activity_graph::LEGENDS_EXOTIC_MISSIONS_NODE)
        })
        .map(|node| node.activities.iter().map(|a| a.activity_hash).collect())
        .unwrap_or_default();

    let missions: Vec<&Activity> = live
        .iter()
        .filter(|live| node_activities.contains(&live.activity_hash))
        .filter_map(|live| activities.get(live.activity_hash))
        .collect();

    let (normal, legend) = classify_exotic_missions(&missions)
        .ok_or_else(|| BuildError::Unresolved("Failed to get the current exotic mission".into()))?;

    let mut weapon = collections.copies(&items, normal.reward_item_hashes()).first().copied();
    if let Some((_, hash)) = EXOTIC_MISSION_WEAPONS
        .iter()
        .find(|(name, _)| normal.display_properties.name.contains(name))
    {
        weapon = collections.canonicalize_hash(&items, *hash);
    }
    let weapon = weapon.ok_or_else(|| {
        BuildError::Unresolved("Failed to get the exotic weapon from the current exotic mission".into())
    })?;

    log::info!("Exotic Mission: {} {}", normal.display_properties.name, normal.hash);

    let quest_exotic = Reference::hash(Component::Trait, traits::ITEM_QUEST_EXOTIC);
    let display = DisplayPropertiesRef::new()
        .name(Reference::literal(normal.original_display_properties.name.clone()))
        .description(Reference::literal(normal.original_display_properties.description.clone()))
        .icon(quest_exotic.clone());
    let type_display = DisplayPropertiesRef::new()
        .name(Reference::hash(Component::PresentationNode, presentation_node::EXOTIC_MISSION))
        .description(Reference::hash(Component::ActivityType, activity_type::DUNGEON))
        .icon(quest_exotic);

    Ok(DeepsightDropTableDefinition {
        hash: normal.hash,
        kind: Some(DropTableType::ExoticMission),
        display_properties: reference::resolve_all(manifest, Some(&display), &[])?,
        type_display_properties: Some(reference::resolve_all(manifest, Some(&type_display), &[])?),
        rotation_activity_hash: None,
        drop_table: Some(drop_table(&[weapon])),
        master: Some(DeepsightDropTableMaster {
            activity_hash: legend.hash,
            availability: Some(Availability::Rotator),
            drop_table: None,
        }),
        rotations: None,
        availability: Some(Availability::Rotator),
        end_time: Some(time::iso(time::next_weekly_reset(now))),
        pgcr_image: None,
    })
}

// ============================================================================
// Portal bonus focus
// ============================================================================

fn bonus_focus(manifest: &Manifest, live: &[LiveActivity]) -> Result<Vec<DeepsightDropTableDefinition>, BuildError> {
    let constants = manifest.global_constants()?;
    let finder_graphs = manifest.fireteam_finder_graphs()?;
    let graphs = manifest.activity_graphs()?;
    let activities = manifest.activities()?;

    let Some(constants) = constants.get(global_constants::SINGLETON) else {
        return Ok(Vec::new());
    };

    let focus_icon = reference::resolve(
        manifest,
        Some(&Reference::hash(Component::Record, record::THIS_ORDERLY_CONDUCT)),
        Field::Icon,
        &[],
    )?;
    let twilight_gap = activities
        .get(activity::TWILIGHT_GAP)
        .and_then(|a| a.pgcr_image.clone());

    let mut entries = Vec::new();
    for (root, icon) in &constants.portal_activity_graph_root_nodes_with_icons {
        let Some(finder_graph) = root.parse::<u32>().ok().and_then(|hash| finder_graphs.get(hash)) else {
            continue;
        };
        let Some(graph) = finder_graph
            .self_and_all_descendant_hashes
            .iter()
            .filter_map(|hash| finder_graphs.get(*hash))
            .filter_map(|linked| match linked.related_director_nodes.as_slice() {
                [node] => graphs.get(node.activity_graph_hash),
                _ => None,
            })
            .find(|graph| graph.activity_hashes().count() > 2)
        else {
            continue;
        };

        let type_display = DisplayPropertiesRef::new()
            .name(Reference::hash(Component::FireteamFinderActivityGraph, finder_graph.hash))
            .description(Reference::hash(Component::FireteamFinderActivityGraph, finder_graph.hash))
            .icon(Reference::literal(icon.clone()));
        let type_display_properties = reference::resolve_all(manifest, Some(&type_display), &[])?;

        for node in &graph.nodes {
            let available: Vec<&LiveActivity> = live
                .iter()
                .filter(|live| node.activities.iter().any(|a| a.activity_hash == live.activity_hash))
                .collect();

            let mut hashes: Vec<u32> = Vec::new();
            for live in &available {
                if !hashes.contains(&live.activity_hash) {
                    hashes.push(live.activity_hash);
                }
            }
            if hashes.is_empty() || hashes.len() > 2 {
                continue;
            }

            let definitions: Vec<Option<&Activity>> =
                available.iter().map(|live| activities.get(live.activity_hash)).collect();
            let names: BTreeSet<Option<&str>> = definitions
                .iter()
                .map(|d| d.map(|d| d.original_display_properties.name.as_str()))
                .collect();
            if names.len() != 1 {
                continue;
            }

            let activity_hash = hashes[0];
            let definition = definitions[0];
            let main_activity = match node.activities.as_slice() {
                [only] => activities.get(only.activity_hash).or(definition),
                _ => definition,
            };
            let Some(main_activity) = main_activity else {
                continue;
            };

            let focus: Vec<u32> = available
                .iter()
                .flat_map(|live| &live.visible_rewards)
                .flat_map(|reward| &reward.reward_items)
                .filter(|item| item.ui_style.starts_with(BONUS_FOCUS_UI_STYLE))
                .map(|item| item.item_quantity.item_hash)
                .collect();
            if focus.is_empty() {
                continue;
            }

            let is_crucible = definition
                .is_some_and(|d| d.activity_mode_hashes.contains(&activity_mode::CRUCIBLE));

            let original = &main_activity.original_display_properties;
            entries.push(DeepsightDropTableDefinition {
                hash: activity_hash,
                kind: Some(DropTableType::BonusFocus),
                display_properties: DeepsightDisplayProperties {
                    name: original.name.clone(),
                    subtitle: None,
                    description: original.description.clone(),
                    icon: focus_icon.clone(),
                },
                type_display_properties: Some(type_display_properties.clone()),
                rotation_activity_hash: None,
                drop_table: Some(drop_table(&focus)),
                master: None,
                rotations: None,
                availability: Some(Availability::Rotator),
                end_time: None,
                pgcr_image: if is_crucible { twilight_gap.clone() } else { None },
            });
        }
    }

    Ok(entries)
}

// ============================================================================
// Build
// ============================================================================

pub fn compute(ctx: &BuildContext) -> Result<DropTableTable, BuildError> {
    let manifest = ctx.manifest();
    let now = ctx.settings().now;
    let mut table = resolve_static(manifest, &drop_table_data(), now)?;

    let live = manifest.live_activities()?;
    let Some(live) = live.as_ref() else {
        log::warn!("No live activity data, skipping the exotic mission and bonus focus drop tables");
        return Ok(table);
    };

    let collections = ctx.collections()?;
    let mission = exotic_mission(manifest, &collections, live, now)?;
    table.insert(mission.hash, mission);

    for entry in bonus_focus(manifest, live)? {
        table.insert(entry.hash, entry);
    }

    Ok(table)
}

pub fn build(ctx: &BuildContext) -> Result<Vec<Artifact>, BuildError> {
    let table = compute(ctx)?;
    Ok(vec![Artifact::json(FILE_NAME, &table)?])
}
