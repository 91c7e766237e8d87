//! Moments: seasons, expansions and events.
//!
//! Every moment is declared here with manifest references instead of literal
//! strings, then resolved against the current snapshot:
//!
//! ```text
//! icon watermarks  ──► shelved / featured variants fall back to the main
//!                      watermark's record
//! display          ──► explicit refs, then the season, then the event card,
//!                      then ""
//! images           ──► declared images, event background, season pass
//!                      backgrounds; the primary image is always first-class
//! ```
//!
//! The resulting table is the join key for collections: an item belongs to a
//! moment when its icon watermark matches one of the moment's watermarks.

use crate::context::BuildContext;
use crate::hashes::{activity, activity_type, event_card, item, presentation_node, record, sandbox_perk, season};
use crate::manifest::{Component, Manifest};
use crate::reference::{self, DeepsightDisplayProperties, DisplayPropertiesRef, Field, Reference};
use crate::tables::{Artifact, BuildError, ExportedEnum};
use serde::Serialize;
use std::collections::BTreeMap;

pub const FILE_NAME: &str = "DeepsightMomentDefinition.json";

macro_rules! moment_hashes {
    ($($name:ident = $value:expr),* $(,)?) => {
        /// Internal moment identifiers, exported as `MomentHashes`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum MomentHash {
            $($name),*
        }

        impl MomentHash {
            pub const ALL: &[MomentHash] = &[$(MomentHash::$name),*];

            pub fn hash(self) -> u32 {
                match self {
                    $(MomentHash::$name => $value),*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(MomentHash::$name => stringify!($name)),*
                }
            }
        }

        impl ExportedEnum for MomentHash {
            const NAME: &'static str = "MomentHashes";

            fn members() -> Vec<(&'static str, u32)> {
                Self::ALL.iter().map(|m| (m.name(), m.hash())).collect()
            }
        }
    };
}

moment_hashes! {
    TheRevelry = 1,
    TheDawning = 2,
    CrimsonDays = 3,
    GuardianGames = 4,
    Solstice = 5,
    FestivalOfTheLost = 6,
    TheRedWar = 7,
    CurseOfOsiris = 8,
    Warmind = 9,
    Forsaken = 10,
    SeasonOfTheForge = 11,
    SeasonOfTheDrifter = 12,
    Shadowkeep = 13,
    BeyondLight = 14,
    TheWitchQueen = 15,
    Lightfall = 16,
    TheFinalShape = 17,
    EpisodeEchoes = 18,
    EpisodeRevenant = 19,
    EpisodeHeresy = 20,
    RiteOfTheNine = 21,
    EdgeOfFate = 22,
    SeasonReclamation = 23,
    Renegades = 24,
}

// ============================================================================
// Output
// ============================================================================

/// `true` for events without an event card, otherwise the card's hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MomentEvent {
    Flag(bool),
    Card(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepsightMomentDefinition {
    pub hash: u32,
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub display_properties: DeepsightDisplayProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_watermark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_watermark_shelved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_watermark_featured: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsume_icon_watermarks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<MomentEvent>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub expansion: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_hash: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub item_hashes: Vec<u32>,
}

impl DeepsightMomentDefinition {
    /// Main, shelved and subsumed watermarks.
    pub fn watermarks(&self) -> impl Iterator<Item = &str> {
        self.icon_watermark
            .iter()
            .chain(self.icon_watermark_shelved.iter())
            .chain(self.subsume_icon_watermarks.iter().flatten())
            .map(String::as_str)
    }
}

pub type MomentTable = BTreeMap<u32, DeepsightMomentDefinition>;

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone)]
pub struct MomentData {
    moment: MomentHash,
    id: &'static str,
    aliases: &'static [&'static str],
    display: Option<DisplayPropertiesRef>,
    icon_watermark: Reference,
    icon_watermark_shelved: Option<Reference>,
    icon_watermark_featured: Option<Reference>,
    subsume_icon_watermarks: Option<Vec<Reference>>,
    event: Option<MomentEvent>,
    expansion: bool,
    season: Option<u32>,
    year: Option<u32>,
    season_hash: Option<u32>,
    primary_image: Option<Reference>,
    images: Option<Vec<Reference>>,
    item_hashes: Vec<u32>,
}

impl MomentData {
    pub fn new(moment: MomentHash, id: &'static str, icon_watermark: Reference) -> Self {
        Self {
            moment,
            id,
            aliases: &[],
            display: None,
            icon_watermark,
            icon_watermark_shelved: None,
            icon_watermark_featured: None,
            subsume_icon_watermarks: None,
            event: None,
            expansion: false,
            season: None,
            year: None,
            season_hash: None,
            primary_image: None,
            images: None,
            item_hashes: Vec::new(),
        }
    }

    pub fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn display(mut self, display: DisplayPropertiesRef) -> Self {
        self.display = Some(display);
        self
    }

    pub fn shelved(mut self, watermark: Reference) -> Self {
        self.icon_watermark_shelved = Some(watermark);
        self
    }

    pub fn subsume(mut self, watermarks: Vec<Reference>) -> Self {
        self.subsume_icon_watermarks = Some(watermarks);
        self
    }

    pub fn event(mut self) -> Self {
        self.event = Some(MomentEvent::Flag(true));
        self
    }

    pub fn event_card(mut self, card: u32) -> Self {
        self.event = Some(MomentEvent::Card(card));
        self
    }

    pub fn expansion(mut self, year: u32) -> Self {
        self.expansion = true;
        self.year = Some(year);
        self
    }

    pub fn season(mut self, number: u32, year: u32, season_hash: u32) -> Self {
        self.season = Some(number);
        self.year = Some(year);
        self.season_hash = Some(season_hash);
        self
    }

    pub fn primary_image(mut self, image: Reference) -> Self {
        self.primary_image = Some(image);
        self
    }

    pub fn images(mut self, images: Vec<Reference>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn items(mut self, items: &[u32]) -> Self {
        self.item_hashes = items.to_vec();
        self
    }
}

fn inventory_item(hash: u32) -> Reference {
    Reference::hash(Component::InventoryItem, hash)
}

fn pgcr(activity_hash: u32) -> Reference {
    Reference::property(Component::Activity, activity_hash, "pgcrImage")
}

fn pgcrs(activities: &[u32]) -> Vec<Reference> {
    activities.iter().map(|hash| pgcr(*hash)).collect()
}

pub fn moment_data() -> Vec<MomentData> {
    use MomentHash::*;
    vec![
        MomentData::new(TheRevelry, "revelry", inventory_item(item::VERDANT_CROWN_SHADER_PLUG))
            .display(DisplayPropertiesRef::new().name("The Revelry").description(
                "Celebrate the joy of Spring. The Tower is overflowing with colorful arrangements, and Eva Levante has a new activity for you to enjoy with new rewards to claim.",
            ))
            .event()
            .images(pgcrs(&[activity::THE_VERDANT_FOREST]))
            .items(&[
                item::VERNAL_GROWTH_MASK_HELMET,
                item::VERNAL_GROWTH_HELM_HELMET,
                item::VERNAL_GROWTH_HOOD_HELMET,
                item::ARBALEST_LINEAR_FUSION_RIFLE,
            ]),
        MomentData::new(TheDawning, "dawning", inventory_item(item::ZEPHYR_SWORD))
            .event_card(event_card::THE_DAWNING),
        MomentData::new(CrimsonDays, "crimsondays", inventory_item(item::ENTWINING_HEART_SHELL))
            .display(
                DisplayPropertiesRef::new()
                    .name(Reference::hash(Component::ActivityType, activity_type::CRIMSON_DAYS))
                    .description(Reference::hash(Component::ActivityType, activity_type::CRIMSON_DAYS))
                    .icon(Reference::frame(Component::InventoryItem, item::WELCOME_TO_CRIMSON_DAYS_QUEST, 0, 2)),
            )
            .images(vec![Reference::property(
                Component::InventoryItem,
                item::FIRE_OF_THE_CRIMSON_DAYS_EMBLEM,
                "secondarySpecial",
            )])
            .event(),
        MomentData::new(GuardianGames, "guardiangames", inventory_item(item::THE_TITLE_SUBMACHINE_GUN))
            .event_card(event_card::GUARDIAN_GAMES),
        MomentData::new(Solstice, "solstice", inventory_item(item::CANDESCENT_GLOVES_PLUG))
            .event_card(event_card::SOLSTICE),
        MomentData::new(FestivalOfTheLost, "festivalofthelost", inventory_item(item::BRAYTECH_WEREWOLF_AUTO_RIFLE))
            .aliases(&["fotl"])
            .event_card(event_card::FESTIVAL_OF_THE_LOST),
        MomentData::new(TheRedWar, "redwar", inventory_item(item::RAT_KING_SIDEARM))
            .display(
                DisplayPropertiesRef::new()
                    .name(inventory_item(item::THE_RED_WAR_DUMMY))
                    .description(inventory_item(item::THE_RED_WAR_DUMMY))
                    .icon(Reference::hash(Component::SandboxPerk, sandbox_perk::CABAL_ARRIVAL)),
            )
            .primary_image(pgcr(activity::CHOSEN))
            .images(pgcrs(&[
                activity::HOMECOMING,
                activity::ADIEU,
                activity::CHOSEN,
                activity::LEVIATHAN,
            ]))
            .expansion(1)
            .season(1, 1, season::RED_WAR),
        MomentData::new(CurseOfOsiris, "osiris", inventory_item(item::EYE_OF_OSIRIS_ORNAMENT))
            .display(
                DisplayPropertiesRef::new()
                    .name(inventory_item(item::CURSE_OF_OSIRIS_DUMMY))
                    .description(inventory_item(item::CURSE_OF_OSIRIS_DUMMY)),
            )
            .primary_image(pgcr(activity::BEYOND_INFINITY))
            .images(pgcrs(&[
                activity::THE_GATEWAY,
                activity::BEYOND_INFINITY,
                activity::LEVIATHAN_EATER_OF_WORLDS,
            ]))
            .expansion(1)
            .season(2, 1, season::CURSE_OF_OSIRIS),
        MomentData::new(Warmind, "warmind", inventory_item(item::ZEUS_LIKE_PHYSIQUE_EMOTE))
            .display(
                DisplayPropertiesRef::new()
                    .name(inventory_item(item::WARMIND_DUMMY))
                    .description(inventory_item(item::WARMIND_DUMMY))
                    .icon(inventory_item(item::AI_COM_RSPN_REBOOT_TRANSMAT)),
            )
            .primary_image(pgcr(activity::DAILY_HEROIC_PILGRIMAGE))
            .images(pgcrs(&[
                activity::ICE_AND_SHADOW,
                activity::DAILY_HEROIC_PILGRIMAGE,
                activity::SPIRE_OF_STARS,
            ]))
            .expansion(1)
            .season(3, 1, season::RESURGENCE),
        MomentData::new(Forsaken, "forsaken", inventory_item(item::JEWELED_PROJECTION))
            .aliases(&["outlaw"])
            .display(
                DisplayPropertiesRef::new()
                    .name("Forsaken")
                    .description(Reference::hash(Component::Activity, activity::DESTINY_2_FORSAKEN))
                    .icon(Reference::hash(Component::SandboxPerk, sandbox_perk::CORRUPT_ETHER)),
            )
            .primary_image(pgcr(activity::HIGH_PLAINS_BLUES))
            .images(pgcrs(&[activity::HIGH_PLAINS_BLUES, activity::LAST_WISH]))
            .expansion(2)
            .season(4, 2, season::SEASON_OF_THE_OUTLAW),
        MomentData::new(SeasonOfTheForge, "forge", inventory_item(item::RUST_PUNK_SHELL))
            .primary_image(pgcr(activity::BERGUSIA_FORGE))
            .images(pgcrs(&[activity::GOFANNON_FORGE, activity::BERGUSIA_FORGE]))
            .season(5, 2, season::SEASON_OF_THE_FORGE),
        MomentData::new(SeasonOfTheDrifter, "drifter", inventory_item(item::TOTEM_SHELL))
            .display(DisplayPropertiesRef::new().icon(Reference::hash(
                Component::SandboxPerk,
                sandbox_perk::GAMBIT_COIN_TRANSMAT,
            )))
            .images(pgcrs(&[activity::THE_RECKONING]))
            .season(6, 2, season::SEASON_OF_THE_DRIFTER),
        MomentData::new(Shadowkeep, "shadowkeep", inventory_item(item::SYMPHONY_OF_DEATH_QUEST_STEP))
            .display(
                DisplayPropertiesRef::new()
                    .name(Reference::hash(Component::Record, record::SHADOWKEEP))
                    .description(Reference::hash(Component::Activity, activity::DESTINY_2_SHADOWKEEP))
                    .icon(Reference::hash(Component::SandboxPerk, sandbox_perk::BLIND_CLUTCH)),
            )
            .primary_image(pgcr(activity::THE_SCARLET_KEEP))
            .images(pgcrs(&[activity::THE_SCARLET_KEEP, activity::GARDEN_OF_SALVATION]))
            .expansion(3),
        MomentData::new(BeyondLight, "beyondlight", inventory_item(item::NO_LOVE_LOST_SHELL))
            .display(
                DisplayPropertiesRef::new()
                    .name(Reference::hash(Component::Record, record::BEYOND_LIGHT))
                    .description(Reference::hash(Component::Activity, activity::DESTINY_2_BEYOND_LIGHT))
                    .icon(Reference::hash(Component::Record, record::BEYOND_LIGHT_CHAPTER_1)),
            )
            .images(pgcrs(&[activity::THE_KELL_OF_DARKNESS, activity::DEEP_STONE_CRYPT]))
            .expansion(4),
        MomentData::new(TheWitchQueen, "witchqueen", inventory_item(item::DONE_AND_DUSTY_ORNAMENT))
            .display(
                DisplayPropertiesRef::new()
                    .name(Reference::hash(Component::Record, record::THE_WITCH_QUEEN))
                    .description(Reference::hash(Component::Activity, activity::DESTINY_2_THE_WITCH_QUEEN))
                    .icon(Reference::hash(Component::Record, record::THE_WITCH_QUEEN_CHAPTER_1)),
            )
            .images(pgcrs(&[activity::THE_RITUAL, activity::VOW_OF_THE_DISCIPLE]))
            .expansion(5),
        MomentData::new(Lightfall, "lightfall", inventory_item(item::SCINTILLANT_TRAJECTORY_SHADER))
            .display(
                DisplayPropertiesRef::new()
                    .name(Reference::hash(Component::Activity, activity::LIGHTFALL))
                    .description(inventory_item(item::DESTINY_2_LIGHTFALL_DUMMY))
                    .icon(Reference::frame(Component::InventoryItem, item::LIGHTFALL_QUEST_STEP, 0, 2)),
            )
            .images(pgcrs(&[activity::ON_THE_VERGE, activity::ROOT_OF_NIGHTMARES]))
            .expansion(6),
        MomentData::new(TheFinalShape, "finalshape", inventory_item(item::ERGO_SUM_SWORD))
            .display(
                DisplayPropertiesRef::new()
                    .name(Reference::hash(Component::Activity, activity::THE_FINAL_SHAPE))
                    .description(Reference::hash(Component::Activity, activity::THE_FINAL_SHAPE))
                    .icon(Reference::frame(Component::InventoryItem, item::THE_FINAL_SHAPE_QUEST_STEP, 0, 1)),
            )
            .images(pgcrs(&[activity::DISSENT, activity::SALVATIONS_EDGE]))
            .expansion(7),
        MomentData::new(EpisodeEchoes, "echoes", inventory_item(item::RED_DEATH_REFORMED_PULSE_RIFLE))
            .images(pgcrs(&[activity::BATTLEGROUND_DELVE, activity::ENCORE_CUSTOMIZE]))
            .season(24, 7, season::EPISODE_ECHOES),
        MomentData::new(EpisodeRevenant, "revenant", inventory_item(item::ICE_BREAKER_SNIPER_RIFLE))
            .images(pgcrs(&[activity::KELLS_FALL_CUSTOMIZE, activity::VESPERS_HOST]))
            .season(25, 7, season::EPISODE_REVENANT),
        MomentData::new(EpisodeHeresy, "heresy", inventory_item(item::LODESTAR_TRACE_RIFLE))
            .images(pgcrs(&[activity::APPELLATION, activity::THE_SUNLESS_CELL]))
            .season(26, 7, season::EPISODE_HERESY),
        MomentData::new(RiteOfTheNine, "riteofthenine", inventory_item(item::TERMINUS_HORIZON_MACHINE_GUN))
            .aliases(&["rotn"])
            .display(
                DisplayPropertiesRef::new()
                    .name(Reference::hash(Component::PresentationNode, presentation_node::RITE_OF_THE_NINE))
                    .description("The Emmisary brings you a message from The Nine. They put forth a challenge to the Lightbearers. We ask: make known your value, so divided gods may wield you in time.")
                    .icon(Reference::hash(Component::Record, record::SEEKER_OF_THE_NINE)),
            )
            .images(pgcrs(&[activity::THE_RITE_OF_THE_NINE]))
            .expansion(7),
        MomentData::new(EdgeOfFate, "edgeoffate", inventory_item(item::GRAVITON_SPIKE_HAND_CANNON))
            .aliases(&["eof"])
            .display(
                DisplayPropertiesRef::new()
                    .name(Reference::hash(Component::Activity, activity::THE_EDGE_OF_FATE))
                    .description(Reference::hash(Component::Activity, activity::THE_EDGE_OF_FATE))
                    .icon(Reference::frame(Component::InventoryItem, item::THE_EDGE_OF_FATE_QUEST_STEP, 0, 2)),
            )
            .images(pgcrs(&[
                activity::MISSION_THE_INVITATION,
                activity::MISSION_FALLOW,
                activity::THE_MESSAGE,
            ]))
            .expansion(8),
        MomentData::new(SeasonReclamation, "reclamation", inventory_item(item::THIRD_ITERATION_SCOUT_RIFLE))
            .aliases(&["ashandiron", "ash&iron"])
            .subsume(vec![inventory_item(item::SUBMERSION_COMBAT_BOW)])
            .season(27, 8, season::SEASON_RECLAMATION),
        MomentData::new(Renegades, "renegades", inventory_item(item::RENEGADES_WATERMARK_PLUG))
            .display(
                DisplayPropertiesRef::new()
                    .name(Reference::hash(Component::Activity, activity::RENEGADES))
                    .description(Reference::hash(Component::Activity, activity::RENEGADES)),
            )
            .images(pgcrs(&[activity::RENEGADES]))
            .expansion(8),
    ]
}

// ============================================================================
// Resolution
// ============================================================================

pub fn compute(manifest: &Manifest) -> Result<MomentTable, BuildError> {
    let mut table = MomentTable::new();
    for data in moment_data() {
        let definition = resolve_moment(manifest, &data)?;
        table.insert(definition.hash, definition);
    }
    Ok(table)
}

/// Resolve one moment declaration against the manifest.
pub fn resolve_moment(
    manifest: &Manifest,
    data: &MomentData,
) -> Result<DeepsightMomentDefinition, BuildError> {
    let watermark_record = data
        .icon_watermark
        .as_literal()
        .is_none()
        .then_some(&data.icon_watermark);

    let icon_watermark_shelved = reference::resolve(
        manifest,
        data.icon_watermark_shelved.as_ref().or(watermark_record),
        Field::IconWatermarkShelved,
        &[],
    )?;
    let icon_watermark_featured = reference::resolve(
        manifest,
        data.icon_watermark_featured.as_ref().or(watermark_record),
        Field::IconWatermarkFeatured,
        &[],
    )?;
    let icon_watermark =
        reference::resolve(manifest, Some(&data.icon_watermark), Field::IconWatermark, &[])?;
    if icon_watermark.is_none() {
        log::warn!("Moment {} has no icon watermark", data.moment.name());
    }

    let subsume_icon_watermarks = match &data.subsume_icon_watermarks {
        Some(refs) => {
            let mut resolved = Vec::new();
            for watermark in refs {
                if let Some(value) =
                    reference::resolve(manifest, Some(watermark), Field::IconWatermark, &[])?
                {
                    resolved.push(value);
                }
            }
            Some(resolved)
        }
        None => None,
    };

    let display = data.display.as_ref();
    let mut name = reference::resolve(manifest, display.and_then(|d| d.name.as_ref()), Field::Name, &[])?;
    let mut description = reference::resolve(
        manifest,
        display.and_then(|d| d.description.as_ref()),
        Field::Description,
        &[],
    )?;
    let mut icon = reference::resolve(manifest, display.and_then(|d| d.icon.as_ref()), Field::Icon, &[])?;

    let seasons = manifest.seasons()?;
    let season = seasons.get_opt(data.season_hash);
    if let Some(season) = season {
        name.get_or_insert_with(|| season.display_properties.name.clone());
        description.get_or_insert_with(|| season.display_properties.description.clone());
        if icon.is_none() {
            icon = season.display_properties.icon().map(str::to_string);
        }
    }

    let event_cards = manifest.event_cards()?;
    let event = match data.event {
        Some(MomentEvent::Card(hash)) => event_cards.get(hash),
        _ => None,
    };
    if let Some(event) = event {
        name.get_or_insert_with(|| event.display_properties.name.clone());
        description.get_or_insert_with(|| event.display_properties.description.clone());
        if icon.is_none() {
            icon = event.display_properties.icon().map(str::to_string);
        }
    }

    let mut primary_image = reference::resolve(
        manifest,
        data.primary_image.as_ref(),
        Field::PgcrImage,
        &[],
    )?;
    let mut images = match &data.images {
        Some(refs) => {
            let mut resolved = Vec::new();
            for image in refs {
                if let Some(value) = reference::resolve(manifest, Some(image), Field::PgcrImage, &[])? {
                    resolved.push(value);
                }
            }
            Some(resolved)
        }
        None => None,
    };

    if let Some(background) = event.and_then(|e| e.images.as_ref()).and_then(|i| i.background()) {
        images.get_or_insert_with(Vec::new).push(background.to_string());
    }

    if let Some(season) = season {
        let season_passes = manifest.season_passes()?;
        let backgrounds: Vec<String> = season
            .season_pass_list
            .iter()
            .filter_map(|pass| season_passes.get(pass.season_pass_hash))
            .filter_map(|pass| pass.images.as_ref()?.background())
            .map(str::to_string)
            .collect();
        if !backgrounds.is_empty() {
            images.get_or_insert_with(Vec::new).extend(backgrounds);
        }
    }

    if primary_image.is_none() {
        primary_image = images.as_ref().and_then(|i| i.first().cloned());
    }
    if let Some(primary) = &primary_image {
        let list = images.get_or_insert_with(Vec::new);
        if !list.contains(primary) {
            list.insert(0, primary.clone());
        }
    }

    Ok(DeepsightMomentDefinition {
        hash: data.moment.hash(),
        id: data.id.to_string(),
        aliases: data.aliases.iter().map(|a| a.to_string()).collect(),
        display_properties: DeepsightDisplayProperties {
            name: name.unwrap_or_default(),
            subtitle: None,
            description: description.unwrap_or_default(),
            icon,
        },
        icon_watermark,
        icon_watermark_shelved,
        icon_watermark_featured,
        subsume_icon_watermarks,
        event: data.event,
        expansion: data.expansion,
        season: data.season,
        year: data.year,
        season_hash: data.season_hash,
        primary_image,
        images,
        item_hashes: data.item_hashes.clone(),
    })
}

pub fn build(ctx: &BuildContext) -> Result<Vec<Artifact>, BuildError> {
    let moments = ctx.moments()?;
    Ok(vec![Artifact::json(FILE_NAME, &*moments)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MISSING_ICON_PATH;
    use crate::test_helpers::*;
    use serde_json::json;

    const WATERMARK_ITEM: u32 = 900;
    const SEASON: u32 = 800;
    const PASS: u32 = 700;

    fn fixture() -> Fixture {
        Fixture::new()
            .item(
                WATERMARK_ITEM,
                json!({
                    "iconWatermark": "/wm/s27.png",
                    "iconWatermarkShelved": "/wm/s27_shelved.png",
                }),
            )
            .with(
                Component::Season,
                SEASON,
                json!({
                    "displayProperties": { "name": "Season of Testing", "description": "Tests.", "icon": "/season.png" },
                    "seasonNumber": 99,
                    "seasonPassList": [{ "seasonPassHash": PASS }],
                }),
            )
            .with(
                Component::SeasonPass,
                PASS,
                json!({ "images": { "themeBackgroundImagePath": "/pass_bg.jpg" } }),
            )
    }

    fn seasonal() -> MomentData {
        MomentData::new(
            MomentHash::SeasonReclamation,
            "testing",
            inventory_item(WATERMARK_ITEM),
        )
        .season(99, 9, SEASON)
    }

    // =========================================================================
    // Watermarks
    // =========================================================================

    #[test]
    fn shelved_watermark_comes_from_main_watermark_record() {
        let moment = resolve_moment(&fixture().manifest(), &seasonal()).unwrap();
        assert_eq!(moment.icon_watermark.as_deref(), Some("/wm/s27.png"));
        assert_eq!(moment.icon_watermark_shelved.as_deref(), Some("/wm/s27_shelved.png"));
        assert_eq!(moment.icon_watermark_featured, None);
        assert_eq!(
            moment.watermarks().collect::<Vec<_>>(),
            vec!["/wm/s27.png", "/wm/s27_shelved.png"]
        );
    }

    #[test]
    fn literal_watermark_has_no_shelved_fallback() {
        let data = MomentData::new(MomentHash::TheDawning, "x", Reference::literal("/wm/lit.png"));
        let moment = resolve_moment(&fixture().manifest(), &data).unwrap();
        assert_eq!(moment.icon_watermark.as_deref(), Some("/wm/lit.png"));
        assert_eq!(moment.icon_watermark_shelved, None);
    }

    #[test]
    fn unresolvable_subsumed_watermarks_are_dropped() {
        let data = seasonal().subsume(vec![inventory_item(WATERMARK_ITEM), inventory_item(12345)]);
        let moment = resolve_moment(&fixture().manifest(), &data).unwrap();
        assert_eq!(moment.subsume_icon_watermarks, Some(vec!["/wm/s27.png".to_string()]));
    }

    // =========================================================================
    // Display properties
    // =========================================================================

    #[test]
    fn display_falls_back_to_season() {
        let moment = resolve_moment(&fixture().manifest(), &seasonal()).unwrap();
        assert_eq!(moment.display_properties.name, "Season of Testing");
        assert_eq!(moment.display_properties.description, "Tests.");
        assert_eq!(moment.display_properties.icon.as_deref(), Some("/season.png"));
    }

    #[test]
    fn explicit_display_wins_and_sentinel_icon_is_dropped() {
        let fixture = fixture().with(
            Component::SandboxPerk,
            5,
            json!({ "displayProperties": { "name": "Perk", "icon": MISSING_ICON_PATH } }),
        );
        let data = seasonal().display(
            DisplayPropertiesRef::new()
                .name("Explicit")
                .icon(Reference::hash(Component::SandboxPerk, 5)),
        );
        let moment = resolve_moment(&fixture.manifest(), &data).unwrap();
        assert_eq!(moment.display_properties.name, "Explicit");
        // sentinel counts as missing, so the season icon fills in
        assert_eq!(moment.display_properties.icon.as_deref(), Some("/season.png"));
    }

    #[test]
    fn event_card_supplies_display_and_background() {
        let fixture = fixture().with(
            Component::EventCard,
            event_card::SOLSTICE,
            json!({
                "displayProperties": { "name": "Solstice", "description": "Hot." },
                "images": { "themeBackgroundImagePath": "/solstice_bg.jpg" },
            }),
        );
        let data = MomentData::new(MomentHash::Solstice, "solstice", inventory_item(WATERMARK_ITEM))
            .event_card(event_card::SOLSTICE);
        let moment = resolve_moment(&fixture.manifest(), &data).unwrap();
        assert_eq!(moment.display_properties.name, "Solstice");
        assert_eq!(moment.images, Some(vec!["/solstice_bg.jpg".to_string()]));
        assert_eq!(moment.primary_image.as_deref(), Some("/solstice_bg.jpg"));
        assert_eq!(
            serde_json::to_value(&moment).unwrap()["event"],
            json!(event_card::SOLSTICE)
        );
    }

    #[test]
    fn missing_everything_defaults_to_empty_strings() {
        let data = MomentData::new(MomentHash::TheRevelry, "bare", inventory_item(1));
        let moment = resolve_moment(&fixture().manifest(), &data).unwrap();
        assert_eq!(moment.display_properties.name, "");
        assert_eq!(moment.display_properties.description, "");
        assert_eq!(moment.icon_watermark, None);
        assert_eq!(moment.images, None);
    }

    // =========================================================================
    // Images
    // =========================================================================

    #[test]
    fn primary_image_alone_becomes_the_image_list() {
        let fixture = fixture().with(Component::Activity, 42, json!({ "pgcrImage": "/img/x.jpg" }));
        let data = MomentData::new(MomentHash::TheRevelry, "x", inventory_item(WATERMARK_ITEM))
            .primary_image(pgcr(42));
        let moment = resolve_moment(&fixture.manifest(), &data).unwrap();
        assert_eq!(moment.images, Some(vec!["/img/x.jpg".to_string()]));
        assert_eq!(moment.primary_image.as_deref(), Some("/img/x.jpg"));
    }

    #[test]
    fn image_order_with_season_pass_and_primary() {
        let fixture = fixture()
            .with(Component::Activity, 1, json!({ "pgcrImage": "/a.jpg" }))
            .with(Component::Activity, 2, json!({ "pgcrImage": "/b.jpg" }))
            .with(Component::Activity, 3, json!({ "pgcrImage": "/primary.jpg" }));
        let data = seasonal()
            .images(vec![pgcr(1), pgcr(404), pgcr(2)])
            .primary_image(pgcr(3));
        let moment = resolve_moment(&fixture.manifest(), &data).unwrap();
        assert_eq!(
            moment.images.unwrap(),
            vec!["/primary.jpg", "/a.jpg", "/b.jpg", "/pass_bg.jpg"]
        );
    }

    #[test]
    fn primary_defaults_to_first_image() {
        let moment = resolve_moment(&fixture().manifest(), &seasonal()).unwrap();
        assert_eq!(moment.primary_image.as_deref(), Some("/pass_bg.jpg"));
        assert_eq!(moment.images, Some(vec!["/pass_bg.jpg".to_string()]));
    }

    // =========================================================================
    // Table
    // =========================================================================

    #[test]
    fn table_is_keyed_by_moment_hash() {
        let table = compute(&Fixture::new().manifest()).unwrap();
        assert_eq!(table.len(), MomentHash::ALL.len());
        let renegades = &table[&MomentHash::Renegades.hash()];
        assert_eq!(renegades.id, "renegades");
        assert!(renegades.expansion);
    }

    #[test]
    fn moment_hashes_are_unique() {
        let mut hashes: Vec<u32> = MomentHash::ALL.iter().map(|m| m.hash()).collect();
        hashes.sort();
        hashes.dedup();
        assert_eq!(hashes.len(), MomentHash::ALL.len());
    }
}
