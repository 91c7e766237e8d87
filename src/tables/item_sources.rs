//! Where each weapon and armour piece can be earned.
//!
//! Every [`ItemSourceType`] declares an [`ItemSpec`] describing how to find
//! its items in the manifest, plus display references for the source itself:
//!
//! ```text
//! Items([..])               explicit hashes, used as-is
//! VendorCategories          display categories of fixed vendors
//! SeasonVendors("query")    vendors whose name contains the query
//! OriginTraitVendors(src)   vendors whose items roll exactly src's origin traits
//! ExoticArmour(moment)      exotic armour carrying the moment's watermark
//! ActivityGraphs([..])      rewards of every activity in the graphs
//! Union([..])               all of the above, concatenated
//! ```
//!
//! Vendor and activity items are folded into their collections copy (see
//! [`Collections::canonicalize`]) and deduplicated. Season vendors prefer
//! vendors selling at least one item with the current season's watermark.
//!
//! After resolution, Crucible Ops loses every item Trials of Osiris also
//! drops, so the two never share an item.

use crate::context::BuildContext;
use crate::hashes::{
    activity, activity_mode, event_card, fireteam_finder, item, item_category, presentation_node, season_pass, tier,
    vendor,
};
use crate::manifest::{Activity, ActivityGraph, Component, InventoryItem, Manifest, Table, Vendor};
use crate::reference::{self, DeepsightDisplayProperties, DisplayPropertiesRef, Reference};
use crate::tables::collections::Collections;
use crate::tables::moments::{DeepsightMomentDefinition, MomentHash, MomentTable};
use crate::tables::{Artifact, BuildError, exported_enum};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

pub const LIST_FILE_NAME: &str = "DeepsightItemSourceListDefinition.json";
pub const FILE_NAME: &str = "DeepsightItemSourceDefinition.json";

exported_enum! {
    /// Every place items can come from.
    pub enum ItemSourceType as "DeepsightItemSourceType" {
        CommanderZavalaLegacyGear = 0,
        LordShaxxLegacyGear = 1,
        DrifterLegacyGear = 2,
        Saint14LegacyGear = 3,
        ExoticKioskLegacyGear = 4,
        BansheeFocusedDecoding = 5,
        BansheeFeatured = 6,
        XurStrangeGear = 7,
        VanguardOpsActivityReward = 8,
        PinnacleOps = 9,
        CrucibleOpsActivityReward = 10,
        TrialsOfOsiris = 11,
        ArmsWeekEvent = 12,
        SolsticeEvent = 13,
        HeavyMetalEvent = 14,
        IronBannerEvent = 15,
        ValusSaladinLegacyGear = 16,
        FestivalOfTheLost = 17,
        CallToArmsEvent = 18,
        TheDawning = 19,
        Kepler = 20,
        TheEdgeOfFate = 21,
        Renegades = 22,
        LawlessFrontier = 23,
        SeasonReclamation = 24,
        SeasonLawless = 25,
        Heliostat = 26,
        FireAndIce = 27,
        TheDesertPerpetual = 28,
        TheDesertPerpetualEpic = 29,
        Equilibrium = 30,
    }
}

exported_enum! {
    pub enum ItemSourceCategory as "DeepsightItemSourceCategory" {
        Vendor = 0,
        ActivityReward = 1,
        EventReward = 2,
        EventVendor = 3,
        Destination = 4,
        Campaign = 5,
        SeasonPass = 6,
        ExoticMission = 7,
        Raid = 8,
        Dungeon = 9,
    }
}

/// Origin trait plugs that identify a source's engrams.
const ORIGIN_TRAITS: &[(ItemSourceType, &[u32])] = &[
    (
        ItemSourceType::PinnacleOps,
        &[item::PROBLEM_SOLVER_ORIGIN_TRAIT, item::PROBLEM_SOLVER_ENHANCED_ORIGIN_TRAIT],
    ),
    (
        ItemSourceType::TrialsOfOsiris,
        &[
            item::FLEET_FOOTED_ORIGIN_TRAIT,
            item::FLEET_FOOTED_ENHANCED_ORIGIN_TRAIT,
            item::ALACRITY_ORIGIN_TRAIT,
            item::ALACRITY_ENHANCED_ORIGIN_TRAIT,
        ],
    ),
    (
        ItemSourceType::CrucibleOpsActivityReward,
        &[
            item::ONE_QUIET_MOMENT_ORIGIN_TRAIT,
            item::ONE_QUIET_MOMENT_ENHANCED_ORIGIN_TRAIT,
            item::ROAR_OF_BATTLE_ORIGIN_TRAIT,
            item::ROAR_OF_BATTLE_ENHANCED_ORIGIN_TRAIT,
        ],
    ),
    (
        ItemSourceType::VanguardOpsActivityReward,
        &[
            item::VANGUARD_DETERMINATION_ORIGIN_TRAIT,
            item::VANGUARD_DETERMINATION_ENHANCED_ORIGIN_TRAIT,
            item::VANGUARDS_VINDICATION_ORIGIN_TRAIT,
            item::VANGUARDS_VINDICATION_ENHANCED_ORIGIN_TRAIT,
            item::STUNNING_RECOVERY_ORIGIN_TRAIT,
            item::STUNNING_RECOVERY_ENHANCED_ORIGIN_TRAIT,
        ],
    ),
    (
        ItemSourceType::IronBannerEvent,
        &[item::SKULKING_WOLF_ORIGIN_TRAIT, item::SKULKING_WOLF_ENHANCED_ORIGIN_TRAIT],
    ),
];

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepsightItemSourceListDefinition {
    pub hash: u32,
    pub sources: Vec<ItemSourceType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepsightItemSourceDefinition {
    pub hash: ItemSourceType,
    pub category: ItemSourceCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub rotates: bool,
    pub display_properties: DeepsightDisplayProperties,
}

// ============================================================================
// Declarations
// ============================================================================

/// Which vendor display categories to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(&'static str),
    Except(&'static str),
}

impl CategoryFilter {
    fn accepts(self, identifier: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => identifier == wanted,
            CategoryFilter::Except(unwanted) => identifier != unwanted,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ItemSpec {
    Items(&'static [u32]),
    VendorCategories {
        vendors: &'static [u32],
        filter: CategoryFilter,
    },
    SeasonVendors {
        query: &'static str,
        exclude: &'static [u32],
    },
    OriginTraitVendors(ItemSourceType),
    ExoticArmour(MomentHash),
    ActivityGraphs(&'static [u32]),
    Union(Vec<ItemSpec>),
}

impl ItemSpec {
    fn vendors(vendors: &'static [u32]) -> Self {
        ItemSpec::VendorCategories {
            vendors,
            filter: CategoryFilter::All,
        }
    }

    fn season_vendors(query: &'static str) -> Self {
        ItemSpec::SeasonVendors { query, exclude: &[] }
    }
}

#[derive(Debug, Clone)]
pub struct ItemSourceData {
    pub source: ItemSourceType,
    pub category: ItemSourceCategory,
    pub event: Option<u32>,
    pub rotates: bool,
    pub items: ItemSpec,
    pub display: DisplayPropertiesRef,
}

impl ItemSourceData {
    fn new(
        source: ItemSourceType,
        category: ItemSourceCategory,
        items: ItemSpec,
        display: DisplayPropertiesRef,
    ) -> Self {
        Self {
            source,
            category,
            event: None,
            rotates: false,
            items,
            display,
        }
    }

    fn event(mut self, card: u32) -> Self {
        self.event = Some(card);
        self
    }

    fn rotates(mut self) -> Self {
        self.rotates = true;
        self
    }
}

fn vendor_ref(hash: u32) -> Reference {
    Reference::hash(Component::Vendor, hash)
}

fn activity_ref(hash: u32) -> Reference {
    Reference::hash(Component::Activity, hash)
}

fn event_ref(hash: u32) -> Reference {
    Reference::hash(Component::EventCard, hash)
}

fn original_name(activity_hash: u32) -> Reference {
    Reference::path(Component::Activity, activity_hash, &["originalDisplayProperties", "name"])
}

fn original_description(activity_hash: u32) -> Reference {
    Reference::path(Component::Activity, activity_hash, &["originalDisplayProperties", "description"])
}

/// A tower vendor's legacy or featured stock.
fn tower_vendor(owner: u32, stock: u32) -> DisplayPropertiesRef {
    DisplayPropertiesRef::new()
        .name(vendor_ref(owner))
        .subtitle(vendor_ref(stock))
        .description(vendor_ref(owner))
        .icon(Reference::property(Component::Vendor, owner, "mapIcon"))
}

fn event_display(card: u32) -> DisplayPropertiesRef {
    DisplayPropertiesRef::new().name(event_ref(card)).icon(event_ref(card))
}

fn original_activity(activity_hash: u32, icon: Reference) -> DisplayPropertiesRef {
    DisplayPropertiesRef::new()
        .name(original_name(activity_hash))
        .subtitle(original_description(activity_hash))
        .icon(icon)
}

pub fn item_source_data() -> Vec<ItemSourceData> {
    use ItemSourceCategory as Category;
    use ItemSourceType::*;

    let kepler_icon = Reference::frame(Component::PresentationNode, presentation_node::KEPLER, 1, 0);
    let lawless_icon = Reference::hash(Component::ActivityMode, activity_mode::LAWLESS_FRONTIER);

    vec![
        // tower vendors
        ItemSourceData::new(
            CommanderZavalaLegacyGear,
            Category::Vendor,
            ItemSpec::VendorCategories {
                vendors: &[vendor::VANGUARD_ENGRAM_FOCUSING_LEGACY],
                filter: CategoryFilter::Except("category_legacy_nightfall"),
            },
            tower_vendor(vendor::TITAN_VANGUARD, vendor::VANGUARD_ENGRAM_FOCUSING_LEGACY),
        ),
        ItemSourceData::new(
            LordShaxxLegacyGear,
            Category::Vendor,
            ItemSpec::vendors(&[vendor::CRUCIBLE_ENGRAM_FOCUSING_LEGACY]),
            tower_vendor(vendor::CRUCIBLE, vendor::CRUCIBLE_ENGRAM_FOCUSING_LEGACY),
        ),
        ItemSourceData::new(
            DrifterLegacyGear,
            Category::Vendor,
            ItemSpec::vendors(&[vendor::GAMBIT_ENGRAM_FOCUSING_LEGACY]),
            tower_vendor(vendor::GAMBIT, vendor::GAMBIT_ENGRAM_FOCUSING_LEGACY),
        ),
        ItemSourceData::new(
            Saint14LegacyGear,
            Category::Vendor,
            ItemSpec::vendors(&[vendor::TRIALS_ENGRAM_FOCUSING_LEGACY]),
            tower_vendor(vendor::TOWER_SAINT_14, vendor::TRIALS_ENGRAM_FOCUSING_LEGACY),
        ),
        ItemSourceData::new(
            ExoticKioskLegacyGear,
            Category::Vendor,
            ItemSpec::vendors(&[vendor::TOWER_EXOTIC_ARCHIVE_PINNACLE]),
            tower_vendor(vendor::IRON_BANNER, vendor::IRON_BANNER_ENGRAM_FOCUSING_LEGACY),
        )
        .event(event_card::IRON_BANNER),
        ItemSourceData::new(
            BansheeFocusedDecoding,
            Category::Vendor,
            ItemSpec::vendors(&[vendor::GUNSMITH_FOCUSED_DECODING]),
            tower_vendor(vendor::GUNSMITH, vendor::GUNSMITH_FOCUSED_DECODING),
        )
        .rotates(),
        ItemSourceData::new(
            BansheeFeatured,
            Category::Vendor,
            ItemSpec::VendorCategories {
                vendors: &[vendor::GUNSMITH],
                filter: CategoryFilter::Only("category_weapon_meta"),
            },
            tower_vendor(vendor::GUNSMITH, vendor::GUNSMITH),
        )
        .rotates(),
        ItemSourceData::new(
            XurStrangeGear,
            Category::Vendor,
            ItemSpec::vendors(&[vendor::TOWER_NINE_GEAR]),
            tower_vendor(vendor::TOWER_NINE, vendor::TOWER_NINE_GEAR),
        )
        .rotates(),
        // portal
        ItemSourceData::new(
            VanguardOpsActivityReward,
            Category::ActivityReward,
            ItemSpec::OriginTraitVendors(VanguardOpsActivityReward),
            DisplayPropertiesRef::all_from(activity_ref(activity::VANGUARD_OPS)),
        ),
        ItemSourceData::new(
            PinnacleOps,
            Category::ActivityReward,
            ItemSpec::OriginTraitVendors(PinnacleOps),
            DisplayPropertiesRef::new()
                .name(activity_ref(activity::PINNACLE_OPS))
                .description(activity_ref(activity::PINNACLE_OPS))
                .icon(activity_ref(activity::STARCROSSED_CUSTOMIZE)),
        ),
        ItemSourceData::new(
            CrucibleOpsActivityReward,
            Category::ActivityReward,
            ItemSpec::OriginTraitVendors(CrucibleOpsActivityReward),
            DisplayPropertiesRef::new()
                .name(Reference::hash(Component::FireteamFinderActivityGraph, fireteam_finder::CRUCIBLE_OPS))
                .description(Reference::hash(
                    Component::FireteamFinderActivityGraph,
                    fireteam_finder::CRUCIBLE_OPS,
                ))
                .icon(activity_ref(activity::CUTTING_EDGE_RUMBLE_MATCHMADE)),
        ),
        ItemSourceData::new(
            TrialsOfOsiris,
            Category::ActivityReward,
            ItemSpec::season_vendors("Trials of Osiris Gear"),
            DisplayPropertiesRef::new()
                .name(activity_ref(activity::TRIALS_OF_OSIRIS))
                .description(activity_ref(activity::TRIALS_OF_OSIRIS))
                .icon(Reference::hash(Component::ActivityMode, activity_mode::TRIALS_OF_OSIRIS)),
        ),
        // events
        ItemSourceData::new(
            ArmsWeekEvent,
            Category::EventVendor,
            ItemSpec::Union(vec![
                ItemSpec::season_vendors("Arms Week"),
                ItemSpec::vendors(&[vendor::TOWER_SHOOTING_RANGE_ADA]),
            ]),
            DisplayPropertiesRef::new()
                .name(event_ref(event_card::ARMS_WEEK))
                .subtitle(Reference::property(Component::Vendor, vendor::TOWER_SHOOTING_RANGE_ADA, "name"))
                .icon(event_ref(event_card::ARMS_WEEK)),
        )
        .event(event_card::ARMS_WEEK),
        ItemSourceData::new(
            SolsticeEvent,
            Category::EventReward,
            ItemSpec::season_vendors("Solstice"),
            event_display(event_card::SOLSTICE),
        )
        .event(event_card::SOLSTICE),
        ItemSourceData::new(
            HeavyMetalEvent,
            Category::EventReward,
            ItemSpec::season_vendors("Heavy Metal"),
            event_display(event_card::HEAVY_METAL),
        )
        .event(event_card::HEAVY_METAL),
        ItemSourceData::new(
            IronBannerEvent,
            Category::EventReward,
            ItemSpec::Union(vec![
                ItemSpec::season_vendors("Iron Banner"),
                ItemSpec::OriginTraitVendors(IronBannerEvent),
            ]),
            event_display(event_card::IRON_BANNER),
        )
        .event(event_card::IRON_BANNER),
        ItemSourceData::new(
            ValusSaladinLegacyGear,
            Category::Vendor,
            ItemSpec::vendors(&[vendor::IRON_BANNER_ENGRAM_FOCUSING_LEGACY]),
            tower_vendor(vendor::IRON_BANNER, vendor::IRON_BANNER_ENGRAM_FOCUSING_LEGACY),
        )
        .event(event_card::IRON_BANNER),
        ItemSourceData::new(
            FestivalOfTheLost,
            Category::EventReward,
            ItemSpec::season_vendors("Eerie Weapons"),
            event_display(event_card::FESTIVAL_OF_THE_LOST),
        )
        .event(event_card::FESTIVAL_OF_THE_LOST),
        ItemSourceData::new(
            CallToArmsEvent,
            Category::EventReward,
            ItemSpec::season_vendors("Call to Arms"),
            event_display(event_card::CALL_TO_ARMS),
        )
        .event(event_card::CALL_TO_ARMS),
        ItemSourceData::new(
            TheDawning,
            Category::EventReward,
            ItemSpec::SeasonVendors {
                query: "Dawning",
                exclude: &[vendor::DAWNING_ENGRAM],
            },
            event_display(event_card::THE_DAWNING),
        )
        .event(event_card::THE_DAWNING),
        // campaigns
        ItemSourceData::new(
            Kepler,
            Category::Destination,
            ItemSpec::Union(vec![
                ItemSpec::vendors(&[vendor::FOCUSED_DECODING_KEPLER]),
                ItemSpec::Items(&[item::GRAVITON_SPIKE_HAND_CANNON]),
            ]),
            DisplayPropertiesRef::new()
                .name(Reference::hash(Component::PresentationNode, presentation_node::KEPLER))
                .subtitle(activity_ref(activity::THE_EDGE_OF_FATE))
                .icon(kepler_icon.clone()),
        ),
        ItemSourceData::new(
            TheEdgeOfFate,
            Category::Campaign,
            ItemSpec::ExoticArmour(MomentHash::EdgeOfFate),
            DisplayPropertiesRef::new()
                .name(activity_ref(activity::THE_EDGE_OF_FATE))
                .subtitle(activity_ref(activity::CAMPAIGN))
                .icon(kepler_icon),
        ),
        ItemSourceData::new(
            Renegades,
            Category::Campaign,
            ItemSpec::ExoticArmour(MomentHash::Renegades),
            DisplayPropertiesRef::new()
                .name(activity_ref(activity::RENEGADES))
                .subtitle(activity_ref(activity::CAMPAIGN))
                .icon(lawless_icon.clone()),
        ),
        ItemSourceData::new(
            LawlessFrontier,
            Category::Destination,
            ItemSpec::season_vendors("Lawless Frontier"),
            DisplayPropertiesRef::new()
                .name(lawless_icon.clone())
                .subtitle(activity_ref(activity::RENEGADES))
                .icon(lawless_icon.clone()),
        ),
        // seasons
        ItemSourceData::new(
            SeasonReclamation,
            Category::SeasonPass,
            ItemSpec::Items(&[item::THIRD_ITERATION_SCOUT_RIFLE, item::NEW_MALPAIS_PULSE_RIFLE]),
            DisplayPropertiesRef::new()
                .name(Reference::hash(Component::SeasonPass, season_pass::RECLAMATION))
                .icon(Reference::hash(Component::SeasonPass, season_pass::RECLAMATION)),
        ),
        ItemSourceData::new(
            SeasonLawless,
            Category::SeasonPass,
            ItemSpec::Items(&[item::SERVICE_OF_LUZAKU_MACHINE_GUN]),
            DisplayPropertiesRef::new()
                .name(Reference::hash(Component::SeasonPass, season_pass::LAWLESS))
                .icon(Reference::hash(Component::SeasonPass, season_pass::LAWLESS)),
        ),
        // exotic missions
        ItemSourceData::new(
            Heliostat,
            Category::ExoticMission,
            ItemSpec::Items(&[item::WOLFSBANE_SWORD]),
            original_activity(
                activity::HELIOSTAT_CUSTOMIZE,
                Reference::hash(Component::SeasonPass, season_pass::RECLAMATION),
            ),
        ),
        ItemSourceData::new(
            FireAndIce,
            Category::ExoticMission,
            ItemSpec::Items(&[item::PRAXIC_BLADE_SWORD]),
            original_activity(activity::FIRE_AND_ICE_BRAVE, lawless_icon),
        ),
        // raids and dungeons
        ItemSourceData::new(
            TheDesertPerpetual,
            Category::Raid,
            ItemSpec::Union(vec![
                ItemSpec::vendors(&[vendor::THE_DESERT_PERPETUAL_GEAR]),
                ItemSpec::Items(&[item::WHIRLING_OVATION_ROCKET_LAUNCHER]),
            ]),
            original_activity(
                activity::THE_DESERT_PERPETUAL_STANDARD,
                Reference::hash(Component::InventoryItem, item::FRAME_OF_REFERENCE_ORIGIN_TRAIT),
            ),
        ),
        ItemSourceData::new(
            TheDesertPerpetualEpic,
            Category::Raid,
            ItemSpec::Union(vec![
                ItemSpec::vendors(&[vendor::THE_DESERT_PERPETUAL_EPIC_GEAR]),
                ItemSpec::Items(&[item::WHIRLING_OVATION_ROCKET_LAUNCHER]),
            ]),
            original_activity(
                activity::THE_DESERT_PERPETUAL_EPIC_STANDARD,
                Reference::hash(Component::InventoryItem, item::FRAME_OF_REFERENCE_ORIGIN_TRAIT),
            ),
        ),
        ItemSourceData::new(
            Equilibrium,
            Category::Dungeon,
            ItemSpec::Union(vec![
                ItemSpec::season_vendors("Equilibrium"),
                ItemSpec::Items(&[item::HEIRLOOM_COMBAT_BOW]),
            ]),
            original_activity(
                activity::EQUILIBRIUM_STANDARD,
                Reference::hash(Component::InventoryItem, item::IMPERIAL_ALLEGIANCE_ORIGIN_TRAIT),
            ),
        ),
    ]
}

// ============================================================================
// Item resolution
// ============================================================================

/// Items of the chosen display categories of `vendors`, canonicalized and
/// deduplicated in first-seen order.
pub fn vendor_category_items<'a>(
    collections: &Collections,
    items: &Table<InventoryItem>,
    vendors: impl IntoIterator<Item = &'a Vendor>,
    filter: CategoryFilter,
) -> Vec<u32> {
    let mut hashes = Vec::new();
    for vendor in vendors {
        for (index, category) in vendor.display_categories.iter().enumerate() {
            if !filter.accepts(&category.identifier) {
                continue;
            }
            hashes.extend(
                vendor
                    .item_list
                    .iter()
                    .filter(|sale| usize::try_from(sale.display_category_index).ok() == Some(index))
                    .map(|sale| sale.item_hash),
            );
        }
    }
    dedupe(collections.copies(items, hashes))
}

fn dedupe(hashes: Vec<u32>) -> Vec<u32> {
    let mut seen = HashSet::new();
    hashes.into_iter().filter(|hash| seen.insert(*hash)).collect()
}

struct Resolver<'a> {
    items: &'a Table<InventoryItem>,
    vendors: &'a Table<Vendor>,
    activities: &'a Table<Activity>,
    activity_graphs: &'a Table<ActivityGraph>,
    collections: &'a Collections,
    moments: &'a MomentTable,
    /// Items carrying the current season's watermark.
    season_items: HashSet<u32>,
}

impl<'a> Resolver<'a> {
    fn resolve(&self, spec: &ItemSpec) -> Vec<u32> {
        match spec {
            ItemSpec::Items(hashes) => hashes.to_vec(),
            ItemSpec::VendorCategories { vendors, filter } => vendor_category_items(
                self.collections,
                self.items,
                vendors.iter().filter_map(|hash| self.vendors.get(*hash)),
                *filter,
            ),
            ItemSpec::SeasonVendors { query, exclude } => {
                let vendors = self.season_vendors(query);
                self.all_categories(vendors.into_iter().filter(|v| !exclude.contains(&v.hash)))
            }
            ItemSpec::OriginTraitVendors(source) => {
                let vendors = self.origin_trait_vendors(*source);
                self.all_categories(vendors)
            }
            ItemSpec::ExoticArmour(moment) => self.exotic_armour(*moment),
            ItemSpec::ActivityGraphs(graphs) => self.activity_graph_rewards(graphs),
            ItemSpec::Union(specs) => dedupe(specs.iter().flat_map(|spec| self.resolve(spec)).collect()),
        }
    }

    fn all_categories(&self, vendors: impl IntoIterator<Item = &'a Vendor>) -> Vec<u32> {
        vendor_category_items(self.collections, self.items, vendors, CategoryFilter::All)
    }

    /// Vendors whose name contains `query`, narrowed to those selling current
    /// season items when any do.
    fn season_vendors(&self, query: &str) -> Vec<&'a Vendor> {
        let query = query.to_lowercase();
        let vendors = self
            .vendors
            .filter(move |vendor| vendor.display_properties.name.to_lowercase().contains(&query));
        let from_season: Vec<&Vendor> = vendors
            .iter()
            .copied()
            .filter(|vendor| vendor.item_list.iter().any(|sale| self.season_items.contains(&sale.item_hash)))
            .collect();
        if from_season.is_empty() { vendors } else { from_season }
    }

    /// Season vendors selling items with the origin traits of `source`, and
    /// of no other source.
    fn origin_trait_vendors(&self, source: ItemSourceType) -> Vec<&'a Vendor> {
        self.season_vendors("")
            .into_iter()
            .filter(|vendor| {
                let plugs: HashSet<u32> = vendor
                    .item_list
                    .iter()
                    .filter_map(|sale| self.items.get(sale.item_hash))
                    .flat_map(|item| item.initial_plugs())
                    .collect();
                let matching: Vec<ItemSourceType> = ORIGIN_TRAITS
                    .iter()
                    .filter(|(_, traits)| traits.iter().any(|t| plugs.contains(t)))
                    .map(|(source, _)| *source)
                    .collect();
                matching == [source]
            })
            .collect()
    }

    fn exotic_armour(&self, moment: MomentHash) -> Vec<u32> {
        let Some(watermark) = self
            .moments
            .get(&moment.hash())
            .and_then(|m| m.icon_watermark.as_deref())
        else {
            log::warn!("No watermark for {}, skipping its exotic armour", moment.name());
            return Vec::new();
        };
        self.items
            .values()
            .filter(|item| {
                item.tier_hash() == Some(tier::EXOTIC)
                    && item.watermark() == Some(watermark)
                    && item.in_category(item_category::ARMOR)
                    && !item.in_category(item_category::DUMMIES)
            })
            .map(|item| item.hash)
            .collect()
    }

    fn activity_graph_rewards(&self, graphs: &[u32]) -> Vec<u32> {
        let rewards: Vec<u32> = graphs
            .iter()
            .filter_map(|hash| self.activity_graphs.get(*hash))
            .flat_map(|graph| graph.activity_hashes())
            .filter_map(|hash| self.activities.get(hash))
            .flat_map(|activity| activity.reward_item_hashes())
            .collect();
        dedupe(self.collections.copies(self.items, rewards))
    }
}

/// Item hashes per source, in declaration order, after the Crucible/Trials split.
/// The season moment with the highest season number, the first one on a tie.
pub fn current_season(moments: &MomentTable) -> Option<&DeepsightMomentDefinition> {
    moments
        .values()
        .filter(|moment| moment.season_hash.is_some())
        .rev()
        .max_by_key(|moment| moment.season.unwrap_or_default())
}

pub fn resolve_sources(
    manifest: &Manifest,
    moments: &MomentTable,
    collections: &Collections,
    data: &[ItemSourceData],
) -> Result<Vec<(ItemSourceType, Vec<u32>)>, BuildError> {
    let items = manifest.inventory_items()?;
    let vendors = manifest.vendors()?;
    let activities = manifest.activities()?;
    let activity_graphs = manifest.activity_graphs()?;

    let current_season = current_season(moments);
    let season_watermark = current_season.and_then(|moment| moment.icon_watermark.as_deref());
    if let Some(season) = current_season {
        log::debug!("Current season: {}", season.display_properties.name);
    }
    let season_items = match season_watermark {
        Some(watermark) => items
            .values()
            .filter(|item| item.watermark() == Some(watermark))
            .map(|item| item.hash)
            .collect(),
        None => HashSet::new(),
    };

    let resolver = Resolver {
        items: &items,
        vendors: &vendors,
        activities: &activities,
        activity_graphs: &activity_graphs,
        collections,
        moments,
        season_items,
    };

    let mut sources: Vec<(ItemSourceType, Vec<u32>)> = data
        .iter()
        .map(|source| (source.source, resolver.resolve(&source.items)))
        .collect();

    let trials: HashSet<u32> = sources
        .iter()
        .filter(|(source, _)| *source == ItemSourceType::TrialsOfOsiris)
        .flat_map(|(_, items)| items.iter().copied())
        .collect();
    for (source, items) in &mut sources {
        if *source == ItemSourceType::CrucibleOpsActivityReward {
            items.retain(|hash| !trials.contains(hash));
        }
    }

    Ok(sources)
}

/// Item → sources, with sources in declaration order.
pub fn source_list(
    sources: &[(ItemSourceType, Vec<u32>)],
) -> BTreeMap<u32, DeepsightItemSourceListDefinition> {
    let mut list: BTreeMap<u32, DeepsightItemSourceListDefinition> = BTreeMap::new();
    for (source, items) in sources {
        for hash in items {
            let entry = list.entry(*hash).or_insert_with(|| DeepsightItemSourceListDefinition {
                hash: *hash,
                sources: Vec::new(),
            });
            if !entry.sources.contains(source) {
                entry.sources.push(*source);
            }
        }
    }
    list
}

pub fn build(ctx: &BuildContext) -> Result<Vec<Artifact>, BuildError> {
    let manifest = ctx.manifest();
    let moments = ctx.moments()?;
    let collections = ctx.collections()?;
    let data = item_source_data();

    let sources = resolve_sources(manifest, &moments, &collections, &data)?;
    let list = source_list(&sources);

    let mut definitions = BTreeMap::new();
    for source in &data {
        definitions.insert(
            source.source.value(),
            DeepsightItemSourceDefinition {
                hash: source.source,
                category: source.category,
                event: source.event,
                rotates: source.rotates,
                display_properties: reference::resolve_all(manifest, Some(&source.display), &[])?,
            },
        );
    }

    log::debug!("Item sources: {} items across {} sources", list.len(), definitions.len());

    Ok(vec![
        Artifact::json(LIST_FILE_NAME, &list)?,
        Artifact::json(FILE_NAME, &definitions)?,
    ])
}
