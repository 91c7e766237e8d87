//! End-to-end pipeline tests: build, bump and prune against a snapshot on disk.
//!
//! Each test lays out a throwaway project:
//!
//! ```text
//! tmp/
//! ├── snapshot/        every component as an empty table, plus a few items
//! ├── static/          index.html, definitions/Interfaces.d.ts
//! ├── docs/            build output
//! └── definitions/     published copy
//! ```
//!
//! Run with: `cargo test --test pipeline`

use deepsight_manifest::config::{BuildConfig, Environment};
use deepsight_manifest::context::{BuildSettings, OpenApiSource};
use deepsight_manifest::hashes::item;
use deepsight_manifest::manifest::Component;
use deepsight_manifest::pipeline::{self, PipelineError};
use deepsight_manifest::tables::TableKind;
use deepsight_manifest::versions::VersionBumper;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const JADE_RABBIT: u32 = 1000;
const TABLES: &[TableKind] = &[TableKind::Perks, TableKind::Enums, TableKind::Links];

struct Project {
    tmp: TempDir,
    config: BuildConfig,
}

impl Project {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        let snapshot = root.join("snapshot");
        fs::create_dir_all(&snapshot).unwrap();
        for component in Component::ALL {
            fs::write(snapshot.join(format!("{}.json", component.name())), "{}").unwrap();
        }
        let items = json!({
            item::CHOIR_OF_ONE_AUTO_RIFLE.to_string(): {
                "hash": item::CHOIR_OF_ONE_AUTO_RIFLE,
                "displayProperties": { "name": "Choir of One" },
                "itemTypeDisplayName": "Auto Rifle"
            },
            JADE_RABBIT.to_string(): {
                "hash": JADE_RABBIT,
                "displayProperties": { "name": "Jade Rabbit" },
                "itemTypeDisplayName": "Scout Rifle"
            }
        });
        fs::write(
            snapshot.join("DestinyInventoryItemDefinition.json"),
            items.to_string(),
        )
        .unwrap();
        fs::write(snapshot.join(".v"), "228000.25.01.01.0000-1\n").unwrap();

        fs::create_dir_all(root.join("static/definitions")).unwrap();
        fs::write(root.join("static/index.html"), "<html>").unwrap();
        fs::write(
            root.join("static/definitions/Interfaces.d.ts"),
            "export interface DeepsightManifest {\n\t// @inject:versions\n}\n",
        )
        .unwrap();

        let path = |name: &str| root.join(name).to_string_lossy().into_owned();
        let mut config = BuildConfig::default();
        config.paths.static_dir = path("static");
        config.paths.output_dir = path("docs");
        config.paths.publish_dir = path("definitions");
        config.paths.hash_cache = path(".hash-cache.json");

        Self { tmp, config }
    }

    fn snapshot(&self) -> PathBuf {
        self.tmp.path().join("snapshot")
    }

    fn settings(&self) -> BuildSettings {
        BuildSettings {
            environment: Environment::Dev,
            hostname: "http://localhost:8095/".into(),
            openapi: OpenApiSource::Inline(Value::Null),
            static_dir: PathBuf::from(&self.config.paths.static_dir),
            ..BuildSettings::default()
        }
    }

    fn build(&self, tables: &[TableKind]) -> Result<pipeline::BuildReport, PipelineError> {
        pipeline::build_static(&self.config, self.settings(), Some(&self.snapshot()), tables)
    }

    fn definition(&self, name: &str) -> PathBuf {
        self.config.definitions_dir().join(name)
    }

    fn read_json(&self, path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }
}

#[test]
fn static_build_writes_selected_tables() {
    let project = Project::new();
    let report = project.build(TABLES).unwrap();

    let built: Vec<TableKind> = report.tables.iter().map(|t| t.table).collect();
    assert_eq!(built, vec![TableKind::Links, TableKind::Perks, TableKind::Enums]);
    assert_eq!(report.static_files, 2);
    assert!(project.tmp.path().join("docs/index.html").exists());

    let perks = fs::read_to_string(project.definition("DeepsightPerkDefinition.json")).unwrap();
    assert!(perks.starts_with("{\n\t\""));

    let links = project.read_json(&project.definition("DeepsightLinksDefinition.json"));
    assert!(links["enums"].get("DeepsightItemSourceType").is_some());

    let enums = fs::read_to_string(project.definition("Enums.d.ts")).unwrap();
    assert!(enums.contains("\tChoirOfOneAutoRifle = 3698448090,"));
    assert!(enums.contains("\tJadeRabbitScoutRifle = 1000,"));
}

#[test]
fn failing_table_writes_nothing() {
    let project = Project::new();
    // no Gunsmith orders in the snapshot, so weapon types fail validation
    let error = project
        .build(&[TableKind::Perks, TableKind::WeaponTypes])
        .unwrap_err();

    assert!(matches!(
        error,
        PipelineError::Table {
            table: TableKind::WeaponTypes,
            ..
        }
    ));
    assert!(!project.definition("DeepsightPerkDefinition.json").exists());
}

#[test]
fn missing_component_is_fatal() {
    let project = Project::new();
    fs::remove_file(project.snapshot().join("DestinyInventoryItemDefinition.json")).unwrap();

    let error = project.build(&[TableKind::Enums]).unwrap_err();
    assert!(error.to_string().contains("DestinyInventoryItemDefinition"));
}

#[test]
fn dev_versions_follow_content() {
    let project = Project::new();
    project.build(TABLES).unwrap();
    let bumper = VersionBumper::from_config(&project.config, Environment::Dev, chrono::Utc::now());

    let report = bumper.run(Some("228000.25.01.01.0000-1")).unwrap();
    let bumped: Vec<&str> = report.bumped.iter().map(|(table, _)| table.as_str()).collect();
    assert_eq!(
        bumped,
        vec!["DeepsightLinksDefinition", "DeepsightPerkDefinition", "Enums"]
    );

    let versions = project.read_json(&project.definition("manifest.json"));
    assert_eq!(versions["Destiny2/Manifest"], "228000.25.01.01.0000-1");
    assert!(versions["deepsight"].is_i64());
    let interfaces = fs::read_to_string(project.definition("Interfaces.d.ts")).unwrap();
    assert!(interfaces.contains("\t'Enums': number\n"));
    assert!(!interfaces.contains("@inject:versions"));

    // identical rebuild: nothing to bump
    project.build(TABLES).unwrap();
    let report = bumper.run(Some("228000.25.01.01.0000-1")).unwrap();
    assert!(report.bumped.is_empty());
    let unchanged = project.read_json(&project.definition("manifest.json"));
    assert_eq!(unchanged["deepsight"], versions["deepsight"]);
}

#[test]
fn prod_versions_publish_changed_tables() {
    let project = Project::new();
    fs::create_dir_all(&project.config.paths.publish_dir).unwrap();
    project.build(&[TableKind::Perks]).unwrap();

    let bumper = VersionBumper::from_config(&project.config, Environment::Prod, chrono::Utc::now());
    let report = bumper.run(None).unwrap();
    assert_eq!(report.bumped, vec![("DeepsightPerkDefinition".to_string(), 0)]);
    assert_eq!(report.package_version.as_deref(), Some("1.0.0"));

    let published = Path::new(&project.config.paths.publish_dir);
    assert!(published.join("DeepsightPerkDefinition.json").exists());
    assert_eq!(project.read_json(&published.join("manifest.json"))["DeepsightPerkDefinition"], 0);
}

#[test]
fn prune_keeps_referenced_items() {
    let project = Project::new();
    project.build(&[TableKind::Enums]).unwrap();

    let report =
        pipeline::prune_enums(&project.config, project.settings(), Some(&project.snapshot()))
            .unwrap();
    assert_eq!((report.kept, report.total), (1, 2));

    let enums = fs::read_to_string(project.definition("Enums.d.ts")).unwrap();
    assert!(enums.contains("ChoirOfOneAutoRifle"));
    assert!(!enums.contains("JadeRabbitScoutRifle"));
    let backup = fs::read_to_string(project.definition("Enums.unpruned.temp")).unwrap();
    assert!(backup.contains("JadeRabbitScoutRifle"));
}
