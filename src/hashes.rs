//! Manifest hashes the builders refer to by name.
//!
//! Values mirror the public Destiny 2 manifest. Every namespace also exports
//! `ALL`, the list of its constants, so enum pruning can tell which item
//! hashes the crate itself depends on.

macro_rules! hashes {
    ($($(#[$meta:meta])* $name:ident = $value:expr),* $(,)?) => {
        $($(#[$meta])* pub const $name: u32 = $value;)*

        /// Every constant in this namespace.
        #[allow(dead_code)]
        pub const ALL: &[u32] = &[$($name),*];
    };
}

pub mod tier {
    hashes! {
        LEGENDARY = 4008398120,
        EXOTIC = 2759499571,
    }
}

pub mod item_category {
    hashes! {
        WEAPON = 1,
        KINETIC_WEAPON = 2,
        ENERGY_WEAPON = 3,
        POWER_WEAPON = 4,
        AUTO_RIFLE = 5,
        HAND_CANNON = 6,
        PULSE_RIFLE = 7,
        SCOUT_RIFLE = 8,
        ARMOR = 20,
        INVENTORY = 52,
        MODS_VISIBLE_TRUE = 59,
        MODS_VISIBLE_FALSE = 1052191496,
        WEAPON_MODS = 610365472,
        WEAPON_MODS_ORNAMENTS = 3124752623,
        BREAKER_DISRUPTION = 2906158273,
        BREAKER_PIERCING = 2906158274,
        BREAKER_STAGGER = 2906158275,
        DUMMIES = 3109687656,
    }
}

pub mod activity_type {
    hashes! {
        RAID = 2043403989,
        DUNGEON = 608898761,
        CRIMSON_DAYS = 3891362108,
        TRIALS_OF_OSIRIS = 2112637710,
    }
}

pub mod activity_mode {
    hashes! {
        CRUCIBLE = 1164760504,
        DUNGEON = 608898761,
        TRIALS_OF_OSIRIS = 1673724806,
        LAWLESS_FRONTIER = 2394711438,
    }
}

pub mod activity {
    hashes! {
        VANGUARD_OPS = 2151154398,
        PINNACLE_OPS = 1720427165,
        STARCROSSED_CUSTOMIZE = 196691221,
        CUTTING_EDGE_RUMBLE_MATCHMADE = 2415116341,
        TRIALS_OF_OSIRIS = 1114325415,
        TWILIGHT_GAP = 111657329,
        THE_EDGE_OF_FATE = 4076196532,
        CAMPAIGN = 2961497387,
        RENEGADES = 3470498290,
        HELIOSTAT_CUSTOMIZE = 1402745928,
        FIRE_AND_ICE_BRAVE = 3325771456,
        THE_DESERT_PERPETUAL_STANDARD = 3817322389,
        THE_DESERT_PERPETUAL_EPIC_STANDARD = 1044919065,
        EQUILIBRIUM_STANDARD = 2727361621,
        THE_VERDANT_FOREST = 2225609298,
        CHOSEN = 1099555105,
        HOMECOMING = 4034557395,
        ADIEU = 1132291813,
        LEVIATHAN = 89727599,
        BEYOND_INFINITY = 3283790633,
        THE_GATEWAY = 1512980468,
        LEVIATHAN_EATER_OF_WORLDS = 3089205900,
        DAILY_HEROIC_PILGRIMAGE = 2049153093,
        ICE_AND_SHADOW = 1967025365,
        SPIRE_OF_STARS = 119944200,
        DESTINY_2_FORSAKEN = 2188733916,
        HIGH_PLAINS_BLUES = 1313738982,
        LAST_WISH = 2122313384,
        BERGUSIA_FORGE = 2700267185,
        GOFANNON_FORGE = 1506080581,
        THE_RECKONING = 3143659188,
        DESTINY_2_SHADOWKEEP = 3129386658,
        THE_SCARLET_KEEP = 346345236,
        GARDEN_OF_SALVATION = 1042180643,
        DESTINY_2_BEYOND_LIGHT = 1082553800,
        THE_KELL_OF_DARKNESS = 3506385584,
        DEEP_STONE_CRYPT = 910380154,
        DESTINY_2_THE_WITCH_QUEEN = 2126998212,
        THE_RITUAL = 3046201624,
        VOW_OF_THE_DISCIPLE = 1441982566,
        LIGHTFALL = 1384426564,
        ON_THE_VERGE = 2000185095,
        ROOT_OF_NIGHTMARES = 2381413764,
        THE_FINAL_SHAPE = 2694937282,
        DISSENT = 1796163419,
        SALVATIONS_EDGE = 1541433876,
        BATTLEGROUND_DELVE = 1469356655,
        ENCORE_CUSTOMIZE = 3885465838,
        KELLS_FALL_CUSTOMIZE = 1937580457,
        VESPERS_HOST = 300092127,
        APPELLATION = 3664729722,
        THE_SUNLESS_CELL = 3236416209,
        THE_RITE_OF_THE_NINE = 3523285566,
        MISSION_THE_INVITATION = 1854375470,
        MISSION_FALLOW = 2395567322,
        THE_MESSAGE = 3209389215,
    }
}

pub mod activity_graph {
    hashes! {
        LEGENDS = 3212926736,
    }

    /// Node of the Legends graph holding the rotating exotic missions.
    pub const LEGENDS_EXOTIC_MISSIONS_NODE: u32 = 329299745;
}

pub mod fireteam_finder {
    hashes! {
        CRUCIBLE_OPS = 2254133009,
    }
}

pub mod vendor {
    hashes! {
        GUNSMITH = 672118013,
        GUNSMITH_FOCUSED_DECODING = 3255722081,
        TITAN_VANGUARD = 69482069,
        VANGUARD_ENGRAM_FOCUSING_LEGACY = 1795939005,
        CRUCIBLE = 3603221665,
        CRUCIBLE_ENGRAM_FOCUSING_LEGACY = 3460742014,
        GAMBIT = 248695599,
        GAMBIT_ENGRAM_FOCUSING_LEGACY = 2993546062,
        TOWER_SAINT_14 = 765357505,
        TRIALS_ENGRAM_FOCUSING_LEGACY = 2227681040,
        IRON_BANNER = 895295461,
        IRON_BANNER_ENGRAM_FOCUSING_LEGACY = 2155217826,
        TOWER_EXOTIC_ARCHIVE_PINNACLE = 2107783226,
        TOWER_NINE = 2190858386,
        TOWER_NINE_GEAR = 3751514131,
        TOWER_SHOOTING_RANGE_ADA = 350061650,
        DAWNING_ENGRAM = 1880526815,
        FOCUSED_DECODING_KEPLER = 3550596112,
        THE_DESERT_PERPETUAL_GEAR = 1522421872,
        THE_DESERT_PERPETUAL_EPIC_GEAR = 1310497352,
    }
}

pub mod event_card {
    hashes! {
        THE_DAWNING = 1541726837,
        GUARDIAN_GAMES = 2223924637,
        SOLSTICE = 2510353447,
        FESTIVAL_OF_THE_LOST = 2559066432,
        IRON_BANNER = 1519862452,
        ARMS_WEEK = 3411938006,
        HEAVY_METAL = 3927409564,
        CALL_TO_ARMS = 2864196532,
    }
}

pub mod season {
    hashes! {
        RED_WAR = 965757574,
        CURSE_OF_OSIRIS = 2809059425,
        RESURGENCE = 2809059424,
        SEASON_OF_THE_OUTLAW = 2809059427,
        SEASON_OF_THE_FORGE = 2809059426,
        SEASON_OF_THE_DRIFTER = 2809059429,
        EPISODE_ECHOES = 2347293565,
        EPISODE_REVENANT = 2347293566,
        EPISODE_HERESY = 2347293567,
        SEASON_RECLAMATION = 4217484913,
        SEASON_LAWLESS = 4217484914,
    }
}

pub mod season_pass {
    hashes! {
        RECLAMATION = 3305915104,
        LAWLESS = 2996497010,
    }
}

pub mod presentation_node {
    hashes! {
        KEPLER = 2849612370,
        RITE_OF_THE_NINE = 1276767356,
        EXOTIC_MISSION = 2522638521,
    }
}

pub mod record {
    hashes! {
        SHADOWKEEP = 1863519014,
        BEYOND_LIGHT = 2418209766,
        BEYOND_LIGHT_CHAPTER_1 = 1059438452,
        THE_WITCH_QUEEN = 4011547386,
        THE_WITCH_QUEEN_CHAPTER_1 = 4011547387,
        SEEKER_OF_THE_NINE = 2958469389,
        EDZ_BLACK_ARMORY_SMITH = 1848567213,
        BRAVE_COLLECTOR = 3604040424,
        THIS_ORDERLY_CONDUCT = 2176577850,
    }
}

pub mod traits {
    hashes! {
        ITEM_QUEST_EXOTIC = 1434215347,
    }
}

pub mod sandbox_perk {
    hashes! {
        CABAL_ARRIVAL = 2372457102,
        CORRUPT_ETHER = 3506885519,
        BLIND_CLUTCH = 2914046416,
        GAMBIT_COIN_TRANSMAT = 1723139242,
    }
}

pub mod global_constants {
    /// The manifest holds a single global constants record.
    pub const SINGLETON: u32 = 1;
}

/// Inventory items referenced by the declarative tables.
pub mod item {
    hashes! {
        // moments
        VERDANT_CROWN_SHADER_PLUG = 2828620154,
        VERNAL_GROWTH_MASK_HELMET = 1305396433,
        VERNAL_GROWTH_HELM_HELMET = 4228112218,
        VERNAL_GROWTH_HOOD_HELMET = 2720216226,
        ARBALEST_LINEAR_FUSION_RIFLE = 2307143135,
        ZEPHYR_SWORD = 3400256755,
        WELCOME_TO_CRIMSON_DAYS_QUEST = 3005221855,
        FIRE_OF_THE_CRIMSON_DAYS_EMBLEM = 1368009627,
        ENTWINING_HEART_SHELL = 1947883939,
        THE_TITLE_SUBMACHINE_GUN = 294129361,
        CANDESCENT_GLOVES_PLUG = 3427364311,
        BRAYTECH_WEREWOLF_AUTO_RIFLE = 528834068,
        THE_RED_WAR_DUMMY = 3664913981,
        RAT_KING_SIDEARM = 2362471601,
        CURSE_OF_OSIRIS_DUMMY = 1248372789,
        EYE_OF_OSIRIS_ORNAMENT = 3180809346,
        WARMIND_DUMMY = 447414431,
        AI_COM_RSPN_REBOOT_TRANSMAT = 2355519448,
        ZEUS_LIKE_PHYSIQUE_EMOTE = 1133253627,
        JEWELED_PROJECTION = 3891185502,
        RUST_PUNK_SHELL = 1474209466,
        TOTEM_SHELL = 3424802209,
        SYMPHONY_OF_DEATH_QUEST_STEP = 1734919434,
        NO_LOVE_LOST_SHELL = 3709135138,
        DONE_AND_DUSTY_ORNAMENT = 2589480473,
        DESTINY_2_LIGHTFALL_DUMMY = 2452546812,
        LIGHTFALL_QUEST_STEP = 1183473604,
        SCINTILLANT_TRAJECTORY_SHADER = 4162792135,
        THE_FINAL_SHAPE_QUEST_STEP = 2848497356,
        ERGO_SUM_SWORD = 3118061004,
        RED_DEATH_REFORMED_PULSE_RIFLE = 1911843789,
        ICE_BREAKER_SNIPER_RIFLE = 1769847435,
        LODESTAR_TRACE_RIFLE = 2361858758,
        TERMINUS_HORIZON_MACHINE_GUN = 2730671571,
        THE_EDGE_OF_FATE_QUEST_STEP = 3211286419,
        GRAVITON_SPIKE_HAND_CANNON = 3057554718,
        THIRD_ITERATION_SCOUT_RIFLE = 2262201574,
        SUBMERSION_COMBAT_BOW = 1542994810,
        RENEGADES_WATERMARK_PLUG = 2098764921,

        // item sources
        NEW_MALPAIS_PULSE_RIFLE = 2970452468,
        SERVICE_OF_LUZAKU_MACHINE_GUN = 1306012983,
        WOLFSBANE_SWORD = 2104722271,
        PRAXIC_BLADE_SWORD = 3830795519,
        WHIRLING_OVATION_ROCKET_LAUNCHER = 3349802711,
        HEIRLOOM_COMBAT_BOW = 1488932447,
        FRAME_OF_REFERENCE_ORIGIN_TRAIT = 2568512747,
        IMPERIAL_ALLEGIANCE_ORIGIN_TRAIT = 3160830826,

        // origin traits
        PROBLEM_SOLVER_ORIGIN_TRAIT = 2880519346,
        PROBLEM_SOLVER_ENHANCED_ORIGIN_TRAIT = 2880519347,
        FLEET_FOOTED_ORIGIN_TRAIT = 1336051733,
        FLEET_FOOTED_ENHANCED_ORIGIN_TRAIT = 1336051734,
        ALACRITY_ORIGIN_TRAIT = 4207269208,
        ALACRITY_ENHANCED_ORIGIN_TRAIT = 4207269209,
        ONE_QUIET_MOMENT_ORIGIN_TRAIT = 3142289711,
        ONE_QUIET_MOMENT_ENHANCED_ORIGIN_TRAIT = 3142289712,
        ROAR_OF_BATTLE_ORIGIN_TRAIT = 1920211893,
        ROAR_OF_BATTLE_ENHANCED_ORIGIN_TRAIT = 1920211894,
        VANGUARD_DETERMINATION_ORIGIN_TRAIT = 4099123465,
        VANGUARD_DETERMINATION_ENHANCED_ORIGIN_TRAIT = 4099123466,
        VANGUARDS_VINDICATION_ORIGIN_TRAIT = 3883769580,
        VANGUARDS_VINDICATION_ENHANCED_ORIGIN_TRAIT = 3883769581,
        STUNNING_RECOVERY_ORIGIN_TRAIT = 2147413536,
        STUNNING_RECOVERY_ENHANCED_ORIGIN_TRAIT = 2147413537,
        SKULKING_WOLF_ORIGIN_TRAIT = 2154200903,
        SKULKING_WOLF_ENHANCED_ORIGIN_TRAIT = 2154200904,

        // exotic mission overrides
        WISH_KEEPER_COMBAT_BOW = 1566262626,
        VEXCALIBUR_GLAIVE = 2359639520,
        CHOIR_OF_ONE_AUTO_RIFLE = 3698448090,
        SLAYERS_FANG_SHOTGUN = 4228149269,

        // foundries
        FIELD_TESTED_ORIGIN_TRAIT = 2120661319,
        HAWTHORNES_FIELD_FORGED_SHOTGUN = 731147177,
        WILD_CARD_ORIGIN_TRAIT = 1611262392,
        NOX_PERENNIAL_FUSION_RIFLE = 3500978498,
        NADIR_FOCUS_ORIGIN_TRAIT = 1551174412,
        GEODETIC_HSM_SWORD = 2059255495,
        TEX_BALANCED_STOCK_ORIGIN_TRAIT = 3580226993,
        BOONDOGGLE_MK55_SUBMACHINE_GUN = 2429905637,
        SUROS_SYNERGY_ORIGIN_TRAIT = 1433296440,
        CANTATA_57_HAND_CANNON = 3681280908,
        HAKKE_BREACH_ARMAMENTS_ORIGIN_TRAIT = 2945263934,
        PERSES_D_SCOUT_RIFLE = 2994989195,
        VEIST_STINGER_ORIGIN_TRAIT = 3988215619,
        SUSPECTUM_4FR_LINEAR_FUSION_RIFLE = 2481881293,
        OMOLON_FLUID_DYNAMICS_ORIGIN_TRAIT = 3000138959,
        AURVANDIL_FR6_FUSION_RIFLE = 3813153080,
        TATARA_GAZE_SNIPER_RIFLE = 2931957300,
        HAMMERHEAD_MACHINE_GUN = 1896309757,
        THE_FATE_OF_ALL_FOOLS_INTRINSIC = 1101395024,
        THE_JADE_RABBIT_SCOUT_RIFLE = 1971757914,

        // perks
        RAMPAGE_TRAIT = 3425386926,
        ONE_FOR_ALL_TRAIT = 4049631843,
        PRECISION_INSTRUMENT_TRAIT = 2693257478,
        PRECISION_INSTRUMENT_ENHANCED_TRAIT = 2693257479,
    }
}
