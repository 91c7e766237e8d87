//! Typed, lazily loaded access to a Destiny 2 manifest snapshot.
//!
//! A snapshot is a directory with one JSON file per component, each mapping a
//! numeric hash (as a string key) to a definition record:
//!
//! ```text
//! $DEEPSIGHT_PATH/
//! ├── .v                                      # manifest version string
//! ├── DestinyInventoryItemDefinition.json     # { "1234": { ... }, ... }
//! ├── DestinyActivityDefinition.json
//! ├── ...
//! └── activities.json                         # optional live activity list
//! ```
//!
//! [`Manifest`] is the only way builders read that data. It exposes one
//! accessor per component (`inventory_items()`, `activities()`, …) returning a
//! shared [`Table`], plus [`Manifest::raw`] for the untyped records the
//! reference resolver walks. Every component is read and parsed at most once
//! per `Manifest`: the first caller loads it, concurrent callers wait on the
//! same [`OnceCell`] and share the result. A failed load is not cached.
//!
//! The bytes come from an injected [`ManifestSource`]: [`DirectorySource`] in
//! production, [`MemorySource`] in tests.
//!
//! A component that does not exist is a [`ManifestError::MissingComponent`].
//! Every builder assumes the snapshot is complete, so the error propagates all
//! the way up and the process exits with status 1.

pub mod records;

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

pub use records::*;

/// Icon path the game API uses when a definition has no icon.
///
/// Treated as equivalent to "no icon" everywhere.
pub const MISSING_ICON_PATH: &str = "/img/misc/missing_icon_d2.png";

/// Name of the optional live activity list inside a snapshot directory.
pub const LIVE_ACTIVITIES_FILENAME: &str = "activities.json";

/// Name of the manifest version file inside a snapshot directory.
pub const VERSION_FILENAME: &str = ".v";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("There is no Destiny manifest component \"{0}\"")]
    MissingComponent(String),
    #[error("Unable to read Destiny manifest component \"{component}\": {source}")]
    Read {
        component: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse Destiny manifest component \"{component}\": {source}")]
    Parse {
        component: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Components
// ============================================================================

/// The manifest components this crate reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    InventoryItem,
    Activity,
    ActivityGraph,
    ActivityType,
    ActivityMode,
    Vendor,
    Season,
    SeasonPass,
    EventCard,
    ItemCategory,
    Icon,
    FireteamFinderActivityGraph,
    GlobalConstants,
    SocketType,
    PresentationNode,
    Record,
    Trait,
    SandboxPerk,
}

impl Component {
    pub const ALL: [Component; 18] = [
        Component::InventoryItem,
        Component::Activity,
        Component::ActivityGraph,
        Component::ActivityType,
        Component::ActivityMode,
        Component::Vendor,
        Component::Season,
        Component::SeasonPass,
        Component::EventCard,
        Component::ItemCategory,
        Component::Icon,
        Component::FireteamFinderActivityGraph,
        Component::GlobalConstants,
        Component::SocketType,
        Component::PresentationNode,
        Component::Record,
        Component::Trait,
        Component::SandboxPerk,
    ];

    /// File stem of the component inside a snapshot directory.
    pub fn name(self) -> &'static str {
        match self {
            Component::InventoryItem => "DestinyInventoryItemDefinition",
            Component::Activity => "DestinyActivityDefinition",
            Component::ActivityGraph => "DestinyActivityGraphDefinition",
            Component::ActivityType => "DestinyActivityTypeDefinition",
            Component::ActivityMode => "DestinyActivityModeDefinition",
            Component::Vendor => "DestinyVendorDefinition",
            Component::Season => "DestinySeasonDefinition",
            Component::SeasonPass => "DestinySeasonPassDefinition",
            Component::EventCard => "DestinyEventCardDefinition",
            Component::ItemCategory => "DestinyItemCategoryDefinition",
            Component::Icon => "DestinyIconDefinition",
            Component::FireteamFinderActivityGraph => {
                "DestinyFireteamFinderActivityGraphDefinition"
            }
            Component::GlobalConstants => "DestinyGlobalConstantsDefinition",
            Component::SocketType => "DestinySocketTypeDefinition",
            Component::PresentationNode => "DestinyPresentationNodeDefinition",
            Component::Record => "DestinyRecordDefinition",
            Component::Trait => "DestinyTraitDefinition",
            Component::SandboxPerk => "DestinySandboxPerkDefinition",
        }
    }

    pub fn from_name(name: &str) -> Option<Component> {
        Component::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record type stored in exactly one manifest component.
pub trait Definition: DeserializeOwned + Send + Sync + 'static {
    const COMPONENT: Component;
}

// ============================================================================
// Sources
// ============================================================================

/// Where manifest bytes come from.
pub trait ManifestSource: Send + Sync {
    /// Raw JSON of a component. Absent components are
    /// [`ManifestError::MissingComponent`].
    fn read_component(&self, name: &str) -> Result<Vec<u8>, ManifestError>;

    /// Names of every component the source provides.
    fn component_names(&self) -> Result<Vec<String>, ManifestError>;

    /// Manifest version recorded alongside the snapshot.
    fn version(&self) -> Result<Option<String>, ManifestError>;

    /// Raw JSON of the live activity list, if the snapshot has one.
    fn live_activities(&self) -> Result<Option<Vec<u8>>, ManifestError>;
}

/// A snapshot directory on disk.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ManifestSource for DirectorySource {
    fn read_component(&self, name: &str) -> Result<Vec<u8>, ManifestError> {
        let path = self.root.join(format!("{name}.json"));
        std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ManifestError::MissingComponent(name.to_string())
            } else {
                ManifestError::Read {
                    component: name.to_string(),
                    source,
                }
            }
        })
    }

    fn component_names(&self) -> Result<Vec<String>, ManifestError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if file_name == VERSION_FILENAME || !file_name.starts_with("Destiny") {
                continue;
            }
            if let Some(stem) = file_name.strip_suffix(".json") {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn version(&self) -> Result<Option<String>, ManifestError> {
        match std::fs::read_to_string(self.root.join(VERSION_FILENAME)) {
            Ok(version) => Ok(Some(version.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn live_activities(&self) -> Result<Option<Vec<u8>>, ManifestError> {
        match std::fs::read(self.root.join(LIVE_ACTIVITIES_FILENAME)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Components held in memory, keyed by component name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    components: BTreeMap<String, serde_json::Value>,
    version: Option<String>,
    live_activities: Option<serde_json::Value>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: Component, table: serde_json::Value) -> Self {
        self.components.insert(component.name().to_string(), table);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_live_activities(mut self, activities: serde_json::Value) -> Self {
        self.live_activities = Some(activities);
        self
    }
}

impl ManifestSource for MemorySource {
    fn read_component(&self, name: &str) -> Result<Vec<u8>, ManifestError> {
        let table = self
            .components
            .get(name)
            .ok_or_else(|| ManifestError::MissingComponent(name.to_string()))?;
        serde_json::to_vec(table).map_err(|source| ManifestError::Parse {
            component: name.to_string(),
            source,
        })
    }

    fn component_names(&self) -> Result<Vec<String>, ManifestError> {
        Ok(self.components.keys().cloned().collect())
    }

    fn version(&self) -> Result<Option<String>, ManifestError> {
        Ok(self.version.clone())
    }

    fn live_activities(&self) -> Result<Option<Vec<u8>>, ManifestError> {
        self.live_activities
            .as_ref()
            .map(|value| {
                serde_json::to_vec(value).map_err(|source| ManifestError::Parse {
                    component: LIVE_ACTIVITIES_FILENAME.to_string(),
                    source,
                })
            })
            .transpose()
    }
}

// ============================================================================
// Tables
// ============================================================================

/// Untyped component records, used by the reference resolver.
pub type RawTable = BTreeMap<u32, serde_json::Value>;

/// A parsed component, iterated in ascending hash order.
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: BTreeMap<u32, T>,
}

impl<T> Table<T> {
    pub fn new(rows: BTreeMap<u32, T>) -> Self {
        Self { rows }
    }

    pub fn get(&self, hash: u32) -> Option<&T> {
        self.rows.get(&hash)
    }

    /// Like [`get`](Self::get) but accepts the optional hashes found on records.
    pub fn get_opt(&self, hash: Option<u32>) -> Option<&T> {
        hash.and_then(|h| self.rows.get(&h))
    }

    pub fn all(&self) -> impl Iterator<Item = (u32, &T)> {
        self.rows.iter().map(|(hash, row)| (*hash, row))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn filter<'a>(&'a self, mut predicate: impl FnMut(&T) -> bool + 'a) -> Vec<&'a T> {
        self.rows.values().filter(|row| predicate(row)).collect()
    }

    pub fn contains(&self, hash: u32) -> bool {
        self.rows.contains_key(&hash)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Manifest
// ============================================================================

type Slot<T> = Arc<OnceCell<Arc<T>>>;
type ErasedSlot = Arc<dyn Any + Send + Sync>;

pub struct Manifest {
    source: Box<dyn ManifestSource>,
    raw: Mutex<HashMap<Component, Slot<RawTable>>>,
    typed: Mutex<HashMap<TypeId, ErasedSlot>>,
    live_activities: OnceCell<Arc<Option<Vec<LiveActivity>>>>,
}

impl fmt::Debug for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manifest").finish_non_exhaustive()
    }
}

impl Manifest {
    pub fn new(source: impl ManifestSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            raw: Mutex::new(HashMap::new()),
            typed: Mutex::new(HashMap::new()),
            live_activities: OnceCell::new(),
        }
    }

    /// Open a snapshot directory.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::new(DirectorySource::new(root))
    }

    /// Untyped records of a component.
    pub fn raw(&self, component: Component) -> Result<Arc<RawTable>, ManifestError> {
        let slot = {
            let mut slots = self.raw.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(component).or_default())
        };
        slot.get_or_try_init(|| {
            log::debug!("Loading {component}");
            let bytes = self.source.read_component(component.name())?;
            serde_json::from_slice::<RawTable>(&bytes)
                .map(Arc::new)
                .map_err(|source| ManifestError::Parse {
                    component: component.name().to_string(),
                    source,
                })
        })
        .map(Arc::clone)
    }

    /// Typed records of the component that stores `T`.
    pub fn table<T: Definition>(&self) -> Result<Arc<Table<T>>, ManifestError> {
        let slot = self.typed_slot::<T>();
        slot.get_or_try_init(|| {
            let component = T::COMPONENT;
            log::debug!("Loading {component}");
            let bytes = self.source.read_component(component.name())?;
            let rows: BTreeMap<u32, T> =
                serde_json::from_slice(&bytes).map_err(|source| ManifestError::Parse {
                    component: component.name().to_string(),
                    source,
                })?;
            Ok(Arc::new(Table::new(rows)))
        })
        .map(Arc::clone)
    }

    fn typed_slot<T: Definition>(&self) -> Slot<Table<T>> {
        let mut slots = self.typed.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = slots
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(OnceCell::<Arc<Table<T>>>::new()) as ErasedSlot);
        match Arc::clone(slot).downcast::<OnceCell<Arc<Table<T>>>>() {
            Ok(typed) => typed,
            Err(_) => {
                let typed: Slot<Table<T>> = Arc::new(OnceCell::new());
                *slot = Arc::clone(&typed) as ErasedSlot;
                typed
            }
        }
    }

    pub fn inventory_items(&self) -> Result<Arc<Table<InventoryItem>>, ManifestError> {
        self.table()
    }

    pub fn activities(&self) -> Result<Arc<Table<Activity>>, ManifestError> {
        self.table()
    }

    pub fn activity_graphs(&self) -> Result<Arc<Table<ActivityGraph>>, ManifestError> {
        self.table()
    }

    pub fn activity_types(&self) -> Result<Arc<Table<ActivityType>>, ManifestError> {
        self.table()
    }

    pub fn vendors(&self) -> Result<Arc<Table<Vendor>>, ManifestError> {
        self.table()
    }

    pub fn seasons(&self) -> Result<Arc<Table<Season>>, ManifestError> {
        self.table()
    }

    pub fn season_passes(&self) -> Result<Arc<Table<SeasonPass>>, ManifestError> {
        self.table()
    }

    pub fn event_cards(&self) -> Result<Arc<Table<EventCard>>, ManifestError> {
        self.table()
    }

    pub fn item_categories(&self) -> Result<Arc<Table<ItemCategory>>, ManifestError> {
        self.table()
    }

    pub fn icons(&self) -> Result<Arc<Table<Icon>>, ManifestError> {
        self.table()
    }

    pub fn fireteam_finder_graphs(
        &self,
    ) -> Result<Arc<Table<FireteamFinderActivityGraph>>, ManifestError> {
        self.table()
    }

    pub fn global_constants(&self) -> Result<Arc<Table<GlobalConstants>>, ManifestError> {
        self.table()
    }

    pub fn socket_types(&self) -> Result<Arc<Table<SocketType>>, ManifestError> {
        self.table()
    }

    /// Component names present in the snapshot.
    pub fn component_names(&self) -> Result<Vec<String>, ManifestError> {
        self.source.component_names()
    }

    /// Manifest version of the snapshot, from its `.v` file.
    pub fn version(&self) -> Result<Option<String>, ManifestError> {
        self.source.version()
    }

    /// Activities currently offered in game, when the snapshot carries them.
    pub fn live_activities(&self) -> Result<Arc<Option<Vec<LiveActivity>>>, ManifestError> {
        self.live_activities
            .get_or_try_init(|| {
                let Some(bytes) = self.source.live_activities()? else {
                    return Ok(Arc::new(None));
                };
                serde_json::from_slice::<Vec<LiveActivity>>(&bytes)
                    .map(|activities| Arc::new(Some(activities)))
                    .map_err(|source| ManifestError::Parse {
                        component: LIVE_ACTIVITIES_FILENAME.to_string(),
                        source,
                    })
            })
            .map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingSource {
        inner: MemorySource,
        reads: Arc<AtomicUsize>,
    }

    impl ManifestSource for CountingSource {
        fn read_component(&self, name: &str) -> Result<Vec<u8>, ManifestError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read_component(name)
        }
        fn component_names(&self) -> Result<Vec<String>, ManifestError> {
            self.inner.component_names()
        }
        fn version(&self) -> Result<Option<String>, ManifestError> {
            self.inner.version()
        }
        fn live_activities(&self) -> Result<Option<Vec<u8>>, ManifestError> {
            self.inner.live_activities()
        }
    }

    fn items() -> serde_json::Value {
        json!({
            "10": { "hash": 10, "displayProperties": { "name": "Ten" } },
            "20": { "hash": 20, "displayProperties": { "name": "Twenty" } },
        })
    }

    // =========================================================================
    // Table access
    // =========================================================================

    #[test]
    fn get_all_and_filter() {
        let manifest =
            Manifest::new(MemorySource::new().with_component(Component::InventoryItem, items()));
        let table = manifest.inventory_items().unwrap();
        assert_eq!(table.get(10).unwrap().display_properties.name, "Ten");
        assert!(table.get(30).is_none());
        assert_eq!(table.all().count(), 2);
        let filtered = table.filter(|item| item.display_properties.name.starts_with('T'));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn raw_table_keeps_unknown_fields() {
        let manifest = Manifest::new(MemorySource::new().with_component(
            Component::Vendor,
            json!({ "5": { "hash": 5, "mapIcon": "/map.png" } }),
        ));
        let raw = manifest.raw(Component::Vendor).unwrap();
        assert_eq!(raw[&5]["mapIcon"], "/map.png");
    }

    #[test]
    fn component_is_read_once() {
        let reads = Arc::new(AtomicUsize::new(0));
        let manifest = Manifest::new(CountingSource {
            inner: MemorySource::new().with_component(Component::InventoryItem, items()),
            reads: Arc::clone(&reads),
        });
        for _ in 0..3 {
            manifest.inventory_items().unwrap();
        }
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_readers_share_one_load() {
        let reads = Arc::new(AtomicUsize::new(0));
        let manifest = Arc::new(Manifest::new(CountingSource {
            inner: MemorySource::new().with_component(Component::InventoryItem, items()),
            reads: Arc::clone(&reads),
        }));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manifest = Arc::clone(&manifest);
                std::thread::spawn(move || manifest.inventory_items().unwrap().len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    /// Fails the first read of every component, then serves `inner`.
    struct FlakySource {
        inner: MemorySource,
        failed: AtomicUsize,
    }

    impl ManifestSource for FlakySource {
        fn read_component(&self, name: &str) -> Result<Vec<u8>, ManifestError> {
            if self.failed.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(ManifestError::MissingComponent(name.to_string()));
            }
            self.inner.read_component(name)
        }
        fn component_names(&self) -> Result<Vec<String>, ManifestError> {
            self.inner.component_names()
        }
        fn version(&self) -> Result<Option<String>, ManifestError> {
            self.inner.version()
        }
        fn live_activities(&self) -> Result<Option<Vec<u8>>, ManifestError> {
            self.inner.live_activities()
        }
    }

    #[test]
    fn failed_load_is_not_cached() {
        let manifest = Manifest::new(FlakySource {
            inner: MemorySource::new().with_component(Component::InventoryItem, items()),
            failed: AtomicUsize::new(0),
        });
        assert!(manifest.inventory_items().is_err());
        assert_eq!(manifest.inventory_items().unwrap().len(), 2);
    }

    #[test]
    fn missing_component_is_an_error() {
        let manifest = Manifest::new(MemorySource::new());
        let err = manifest.vendors().unwrap_err();
        assert!(matches!(err, ManifestError::MissingComponent(ref name) if name == "DestinyVendorDefinition"));
    }

    // =========================================================================
    // Directory source
    // =========================================================================

    #[test]
    fn directory_source_reads_components_and_version() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("DestinyInventoryItemDefinition.json"),
            items().to_string(),
        )
        .unwrap();
        std::fs::write(tmp.path().join(".v"), "228000.25.01\n").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let manifest = Manifest::open(tmp.path());
        assert_eq!(manifest.inventory_items().unwrap().len(), 2);
        assert_eq!(manifest.version().unwrap().as_deref(), Some("228000.25.01"));
        assert_eq!(
            manifest.component_names().unwrap(),
            vec!["DestinyInventoryItemDefinition".to_string()]
        );
    }

    #[test]
    fn directory_source_missing_file() {
        let tmp = TempDir::new().unwrap();
        let manifest = Manifest::open(tmp.path());
        assert!(matches!(
            manifest.activities().unwrap_err(),
            ManifestError::MissingComponent(_)
        ));
        assert!(manifest.live_activities().unwrap().is_none());
        assert!(manifest.version().unwrap().is_none());
    }

    #[test]
    fn directory_source_parse_error_names_component() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("DestinyVendorDefinition.json"), "{ nope").unwrap();
        let err = Manifest::open(tmp.path()).vendors().unwrap_err();
        assert!(err.to_string().contains("DestinyVendorDefinition"));
    }

    #[test]
    fn component_names_round_trip() {
        for component in Component::ALL {
            assert_eq!(Component::from_name(component.name()), Some(component));
        }
        assert_eq!(Component::from_name("DestinyNopeDefinition"), None);
    }
}
