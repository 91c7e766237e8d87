//! # Deepsight Manifest
//!
//! Derives the deepsight.gg definition tables from a Destiny 2 manifest
//! snapshot. The game's manifest describes items, activities and vendors;
//! the app needs higher-level facts the manifest never states directly:
//! which items are adept versions of which, where an item drops, which
//! weapons belong to which expansion, which foundry made a gun.
//!
//! # Architecture: Snapshot In, Tables Out
//!
//! ```text
//! $DEEPSIGHT_PATH/                          docs/definitions/
//! ├── DestinyInventoryItemDefinition.json   ├── DeepsightMomentDefinition.json
//! ├── DestinyActivityDefinition.json   ──►  ├── DeepsightCollectionsDefinition.json
//! ├── …                                     ├── …
//! ├── .v                                    ├── Enums.d.ts
//! └── activities.json (optional, live)      └── manifest.json   (bump-versions)
//! ```
//!
//! A build reads the snapshot through a typed [`manifest::Manifest`], runs
//! every [`tables`] builder against one shared [`context::BuildContext`], and
//! writes the results only once all of them succeeded. Versions are bumped
//! as a separate step so that a rebuild with identical output leaves the
//! app's caches alone.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`manifest`] | Typed, lazily loaded access to snapshot components |
//! | [`reference`] | Display text and icons resolved from declarative references |
//! | [`context`] | Per-build settings and memoized intermediate tables |
//! | [`tables`] | One builder per definition table, plus `Enums.d.ts` |
//! | [`hashes`] | Named manifest hashes the builders refer to |
//! | [`pipeline`] | The `static` build: copy, build in parallel, write atomically |
//! | [`versions`] | `bump-versions`: per-table version counters |
//! | [`hash_cache`] | Content hashes of previously seen files |
//! | [`watch`] | Rebuild on change |
//! | [`serve`] | Development file server with app-route fallback |
//! | [`config`] | `deepsight.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Declarative Data Next to Its Builder
//!
//! Much of what the app knows cannot be derived: the manifest has no notion
//! of "this raid's adept weapons" or "this exotic mission rotates weekly".
//! Those facts live as data tables in the builder that uses them, expressed
//! as [`reference::Reference`]s into the manifest rather than copied text,
//! so names and icons track the game's own localisation.
//!
//! ## One Context per Build
//!
//! Several tables depend on the same intermediate results (moments feed
//! collections, collections feed adept pairing and variants). The context
//! memoizes each of these for the lifetime of one build; watch mode creates a
//! fresh context for every rebuild, so nothing stale survives a change.
//!
//! ## All or Nothing
//!
//! A build that fails any validation writes nothing. The app would rather
//! keep yesterday's consistent tables than get today's half-written ones.

pub mod config;
pub mod context;
pub mod hash_cache;
pub mod hashes;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod reference;
pub mod serve;
pub mod tables;
pub mod time;
pub mod versions;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
