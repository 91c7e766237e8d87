//! Links between definition tables: which fields of a component hold hashes
//! of another component, or values of an enum.
//!
//! ```text
//! Bungie.net openapi.json ──► schema walk per manifest component
//!                              ├─ integer with x-mapped-definition  → component link
//!                              ├─ integer with x-enum-reference     → enum link (+ enum)
//!                              ├─ array                             → path segment "[]"
//!                              ├─ dictionary                        → path segment "{}"
//!                              └─ $ref / allOf                      → followed
//! deepsight tables        ──► hand-written links and augmentations
//! enums                   ──► openapi x-enum-values, crate enums, static *.d.ts
//! ```
//!
//! Link paths are dot-joined property names, e.g. `sockets.socketEntries.[].singleInitialItemHash`.

use crate::context::{BuildContext, OpenApiSource};
use crate::tables::item_sources::{ItemSourceCategory, ItemSourceType};
use crate::tables::perks::PerkEffectType;
use crate::tables::{Artifact, BuildError, ExportedEnum};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

pub const FILE_NAME: &str = "DeepsightLinksDefinition.json";

pub const DEFAULT_OPENAPI_URL: &str = "https://raw.githubusercontent.com/Bungie-net/api/refs/heads/master/openapi.json";

const REFERENCE_PREFIX: &str = "#/components/schemas/";

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LinkDefinition {
    Component { path: String, component: String },
    Enum {
        path: String,
        #[serde(rename = "enum")]
        enum_name: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComponentLinks {
    pub component: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkDefinition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub augmentations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDefinition {
    pub name: String,
    pub members: Vec<EnumMember>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitmask: Option<bool>,
}

impl EnumDefinition {
    fn from_members(name: &str, members: impl IntoIterator<Item = (String, i64)>) -> Self {
        Self {
            name: name.to_string(),
            members: members
                .into_iter()
                .map(|(name, value)| EnumMember {
                    name,
                    value,
                    description: None,
                })
                .collect(),
            bitmask: None,
        }
    }

    fn exported<T: ExportedEnum>() -> Self {
        Self::from_members(
            T::NAME,
            T::members().into_iter().map(|(name, value)| (name.to_string(), i64::from(value))),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeepsightLinksDefinition {
    pub components: BTreeMap<String, ComponentLinks>,
    pub enums: BTreeMap<String, EnumDefinition>,
}

impl DeepsightLinksDefinition {
    fn add_augmentation(&mut self, base: &str, augmentation: &str) {
        self.components
            .entry(base.to_string())
            .or_insert_with(|| ComponentLinks {
                component: base.to_string(),
                ..ComponentLinks::default()
            })
            .augmentations
            .push(augmentation.to_string());
    }
}

// ============================================================================
// OpenAPI
// ============================================================================

/// Fetch or read the OpenAPI document.
pub fn load_openapi(source: &OpenApiSource) -> Result<Value, BuildError> {
    match source {
        OpenApiSource::Inline(value) => Ok(value.clone()),
        OpenApiSource::File(path) => {
            let bytes = std::fs::read(path)?;
            Ok(serde_json::from_slice(&bytes)?)
        }
        OpenApiSource::Url(url) => {
            log::info!("Fetching {url}");
            let fetch_error = |source| BuildError::Fetch {
                url: url.clone(),
                source,
            };
            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .map_err(fetch_error)?;
            client
                .get(url)
                .send()
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.json())
                .map_err(fetch_error)
        }
    }
}

fn schema_name(reference: &str) -> &str {
    reference.strip_prefix(REFERENCE_PREFIX).unwrap_or(reference)
}

fn reference_of(definition: &Value, key: &str) -> Option<String> {
    definition
        .get(key)?
        .get("$ref")?
        .as_str()
        .map(|r| schema_name(r).to_string())
}

/// Walks schemas, collecting links and the enums they mention.
struct SchemaWalker<'a> {
    schemas: &'a Map<String, Value>,
    /// Schema name ↔ manifest component name, both directions.
    names: HashMap<String, String>,
    enums: &'a mut BTreeMap<String, EnumDefinition>,
    /// Schemas on the current `$ref` chain.
    visiting: Vec<String>,
}

impl SchemaWalker<'_> {
    fn links(&mut self, definition: Option<&Value>, path: &[&str], mapped: Option<String>) -> Vec<LinkDefinition> {
        let Some(definition) = definition else {
            return Vec::new();
        };

        if let Some(reference) = definition.get("$ref").and_then(Value::as_str) {
            let name = schema_name(reference).to_string();
            if self.visiting.contains(&name) {
                return Vec::new();
            }
            let schemas = self.schemas;
            self.visiting.push(name.clone());
            let links = self.links(schemas.get(&name), path, None);
            self.visiting.pop();
            return links;
        }

        let kind = definition.get("type").and_then(Value::as_str).unwrap_or_default();
        let is_enum = definition.get("enum").is_some();
        let enum_reference = reference_of(definition, "x-enum-reference");
        let path_string = || path.join(".");

        if kind == "number" || (kind == "integer" && !is_enum && enum_reference.is_none()) {
            let mapped = reference_of(definition, "x-mapped-definition").or(mapped);
            return mapped
                .and_then(|name| self.names.get(&name))
                .map(|component| {
                    vec![LinkDefinition::Component {
                        path: path_string(),
                        component: component.clone(),
                    }]
                })
                .unwrap_or_default();
        }

        if kind == "integer"
            && let Some(enum_schema) = enum_reference
        {
            let enum_name = enum_schema.rsplit('.').next().unwrap_or(&enum_schema).to_string();
            self.add_enum(&enum_name);
            return vec![LinkDefinition::Enum {
                path: path_string(),
                enum_name,
            }];
        }

        match kind {
            "array" => {
                let mapped = reference_of(definition, "x-mapped-definition");
                self.links(definition.get("items"), &child(path, "[]"), mapped)
            }
            "object" => {
                let mut links = Vec::new();
                if let Some(properties) = definition.get("properties").and_then(Value::as_object) {
                    for (property, property_definition) in properties {
                        links.extend(self.links(Some(property_definition), &child(path, property), None));
                    }
                }
                let additional = definition.get("additionalProperties");
                let dictionary_path = child(path, "{}");
                if additional.is_some() && definition.get("x-dictionary-key").is_some() {
                    links.extend(self.links(definition.get("x-dictionary-key"), &dictionary_path, None));
                }
                if let Some(additional) = additional
                    && additional.get("$ref").is_some()
                {
                    links.extend(self.links(Some(additional), &dictionary_path, None));
                }
                if let Some(all_of) = definition.get("allOf").and_then(Value::as_array) {
                    for sub_definition in all_of {
                        links.extend(self.links(Some(sub_definition), path, None));
                    }
                }
                links
            }
            _ => Vec::new(),
        }
    }

    /// Record an OpenAPI enum. The last schema whose name ends in the enum's
    /// name wins.
    fn add_enum(&mut self, enum_name: &str) {
        if self.enums.contains_key(enum_name) {
            return;
        }
        let suffix = format!(".{enum_name}");
        let schemas = self.schemas;
        for (schema_name, schema) in schemas {
            if !schema_name.contains(&suffix) || schema.get("enum").is_none() {
                continue;
            }
            let members = openapi_enum_members(schema);
            if members.is_empty() {
                continue;
            }
            self.enums.insert(
                enum_name.to_string(),
                EnumDefinition {
                    name: enum_name.to_string(),
                    members,
                    bitmask: schema.get("x-enum-is-bitmask").and_then(Value::as_bool),
                },
            );
        }
    }
}

fn child<'p>(path: &[&'p str], segment: &'p str) -> Vec<&'p str> {
    let mut child = path.to_vec();
    child.push(segment);
    child
}

fn number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn openapi_enum_members(schema: &Value) -> Vec<EnumMember> {
    if let Some(values) = schema.get("x-enum-values").and_then(Value::as_array) {
        return values
            .iter()
            .filter_map(|value| {
                Some(EnumMember {
                    name: value.get("identifier")?.as_str()?.to_string(),
                    value: number(value.get("numericValue")?)?,
                    description: value
                        .get("description")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            })
            .collect();
    }
    schema
        .get("enum")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|value| {
                    let numeric = number(value)?;
                    Some(EnumMember {
                        name: numeric.to_string(),
                        value: numeric,
                        description: None,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Links of every manifest component described by the schema.
pub fn openapi_links(
    openapi: &Value,
    component_names: &[String],
    links: &mut DeepsightLinksDefinition,
) -> Result<(), BuildError> {
    let schemas = openapi
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(Value::as_object)
        .ok_or_else(|| BuildError::Unresolved("OpenAPI document has no components.schemas".into()))?;

    let mut names = HashMap::new();
    for schema_name in schemas.keys() {
        if let Some(component) = component_names
            .iter()
            .find(|name| schema_name.ends_with(&format!(".{name}")))
        {
            names.insert(component.clone(), schema_name.clone());
            names.insert(schema_name.clone(), component.clone());
        }
    }

    let missing: Vec<&str> = component_names
        .iter()
        .filter(|name| !names.contains_key(*name))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        log::warn!("Missing components in openapi.json: {}", missing.join(", "));
    }

    let mut walker = SchemaWalker {
        schemas,
        names,
        enums: &mut links.enums,
        visiting: Vec::new(),
    };
    let mut found = BTreeMap::new();
    for (schema_name, schema) in schemas {
        let Some(component) = walker.names.get(schema_name).cloned() else {
            continue;
        };
        walker.visiting = vec![schema_name.clone()];
        let component_links = walker.links(Some(schema), &[], None);
        if !component_links.is_empty() {
            found.insert(
                component.clone(),
                ComponentLinks {
                    component: component.clone(),
                    links: component_links,
                    augmentations: Vec::new(),
                },
            );
        }
    }
    links.components.extend(found);
    Ok(())
}

// ============================================================================
// Deepsight declarations
// ============================================================================

/// Parse `export declare const enum {name} { ... }` out of a declaration file.
///
/// Members without a value continue from the previous one, starting at 0.
pub fn parse_declared_enum(dts: &str, name: &str) -> Option<EnumDefinition> {
    let pattern = format!(r"export declare const enum {} \{{([\s\S]*?)\}}", regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    let body = re.captures(dts)?.get(1)?.as_str();

    let mut last = -1;
    let mut members = Vec::new();
    for line in body.lines().map(str::trim) {
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let line = line.replacen(',', "", 1);
        let mut parts = line.splitn(2, " = ").map(str::trim);
        let Some(member) = parts.next() else { continue };
        let value = match parts.next() {
            Some(value) => match value.parse::<i64>() {
                Ok(value) => value,
                Err(_) => continue,
            },
            None => last + 1,
        };
        last = value;
        members.push((member.to_string(), value));
    }

    (!members.is_empty()).then(|| EnumDefinition::from_members(name, members))
}

fn add_declared_enum(links: &mut DeepsightLinksDefinition, static_dir: &Path, name: &str, file: &str) {
    if links.enums.contains_key(name) {
        return;
    }
    let dts = std::fs::read_to_string(static_dir.join("definitions").join(file)).unwrap_or_default();
    match parse_declared_enum(&dts, name) {
        Some(definition) => {
            links.enums.insert(name.to_string(), definition);
        }
        None => log::warn!("Failed to extract Deepsight enum: {name}"),
    }
}

#[derive(Clone, Copy)]
enum Target {
    Component(&'static str),
    Enum(&'static str),
}

use Target::{Component as C, Enum as E};

const INVENTORY_ITEM: &str = "DestinyInventoryItemDefinition";
const ICON: &str = "DestinyIconDefinition";
const ACTIVITY: &str = "DestinyActivityDefinition";

/// Hand-written links of the deepsight tables.
const DEEPSIGHT_LINKS: &[(&str, &[(&str, Target)])] = &[
    (
        "DeepsightDropTableDefinition",
        &[
            ("rotationActivityHash", C(ACTIVITY)),
            ("displayProperties.iconHash", C(ICON)),
            ("dropTable.{}", C(INVENTORY_ITEM)),
            ("dropTable.{}.requiresQuest", C(INVENTORY_ITEM)),
            ("dropTable.{}.requiresItems.[]", C(INVENTORY_ITEM)),
            ("encounters.[].dropTable.{}", C(INVENTORY_ITEM)),
            ("encounters.[].dropTable.{}.requiresQuest", C(INVENTORY_ITEM)),
            ("encounters.[].dropTable.{}.requiresItems.[]", C(INVENTORY_ITEM)),
            ("master.activityHash", C(ACTIVITY)),
            ("master.dropTable.{}", C(INVENTORY_ITEM)),
            ("master.dropTable.{}.requiresQuest", C(INVENTORY_ITEM)),
            ("master.dropTable.{}.requiresItems.[]", C(INVENTORY_ITEM)),
            ("rotations.drops.{}", C(INVENTORY_ITEM)),
            ("rotations.drops.{}.requiresQuest", C(INVENTORY_ITEM)),
            ("rotations.drops.{}.requiresItems.[]", C(INVENTORY_ITEM)),
            ("rotations.drops.[]", C(INVENTORY_ITEM)),
            ("rotations.masterDrops.{}", C(INVENTORY_ITEM)),
            ("rotations.masterDrops.{}.requiresQuest", C(INVENTORY_ITEM)),
            ("rotations.masterDrops.{}.requiresItems.[]", C(INVENTORY_ITEM)),
            ("rotations.masterDrops.[]", C(INVENTORY_ITEM)),
            ("challenges.[]", C("DestinyActivityModifierDefinition")),
            ("typeDisplayProperties.iconHash", C(ICON)),
        ],
    ),
    (
        "DeepsightMomentDefinition",
        &[
            ("displayProperties.iconHash", C(ICON)),
            ("event", C("DestinyEventCardDefinition")),
            ("seasonHash", C("DestinySeasonDefinition")),
            ("itemHashes.[]", C(INVENTORY_ITEM)),
        ],
    ),
    (
        "DeepsightTierTypeDefinition",
        &[
            ("displayProperties.iconHash", C(ICON)),
            ("itemHash", C(INVENTORY_ITEM)),
            ("tierType", E("TierType")),
        ],
    ),
    ("DeepsightStats", &[("activeEvent", C("DestinyEventCardDefinition"))]),
    (
        "DeepsightCollectionsDefinition",
        &[
            ("buckets.{}", C("DestinyInventoryBucketDefinition")),
            ("buckets.{}.[]", C(INVENTORY_ITEM)),
        ],
    ),
    (
        "DeepsightVariantDefinition",
        &[("hash", C(INVENTORY_ITEM)), ("moment", C("DeepsightMomentDefinition"))],
    ),
    (
        "DeepsightItemSourceListDefinition",
        &[("sources.[]", E(ItemSourceType::NAME))],
    ),
    (
        "DeepsightItemSourceDefinition",
        &[
            ("hash", E(ItemSourceType::NAME)),
            ("category", E(ItemSourceCategory::NAME)),
            ("event", C("DestinyEventCardDefinition")),
            ("displayProperties.iconHash", C(ICON)),
        ],
    ),
    (
        "DeepsightItemDamageTypesDefinition",
        &[("damageTypes.[]", C("DestinyDamageTypeDefinition"))],
    ),
    (
        "DeepsightBreakerTypeDefinition",
        &[
            ("sources.[]", C("DeepsightBreakerSourceDefinition")),
            ("types.[]", C("DestinyBreakerTypeDefinition")),
        ],
    ),
    (
        "DeepsightBreakerSourceDefinition",
        &[
            ("hash", E("BreakerSource")),
            ("trait", C("DestinyTraitDefinition")),
            ("appliesTraits.[]", C("DestinyTraitDefinition")),
            ("breakerTypes.[]", C("DestinyBreakerTypeDefinition")),
        ],
    ),
    (
        "DeepsightCatalystDefinition",
        &[
            ("record", C("DestinyRecordDefinition")),
            ("primaryObjectiveHashes.[]", C("DestinyObjectiveDefinition")),
        ],
    ),
    (
        "DeepsightSocketExtendedDefinition",
        &[("sockets.{}.rewardPlugItems.[].plugItemHash", C(INVENTORY_ITEM))],
    ),
    (
        "DeepsightEmblemDefinition",
        &[
            ("displayProperties.iconHash", C(ICON)),
            ("collectibleHash", C("DestinyCollectibleDefinition")),
        ],
    ),
    ("DeepsightAdeptDefinition", &[("base", C(INVENTORY_ITEM))]),
    (
        "DeepsightSocketCategorisation",
        &[("categorisation.[].category", E("DeepsightPlugCategory"))],
    ),
    (
        "DeepsightPlugCategorisation",
        &[
            ("itemCategoryHashes", C("DestinyItemCategoryDefinition")),
            ("category", E("DeepsightPlugCategory")),
            ("bucketHash", C("DestinyInventoryBucketDefinition")),
            ("stat", C("DestinyStatDefinition")),
            ("activityHash", C(ACTIVITY)),
            ("armourChargeStats.[].statTypeHash", C("DestinyStatDefinition")),
            ("damageType", C("DestinyDamageTypeDefinition")),
            ("subclasses.[]", C(INVENTORY_ITEM)),
        ],
    ),
    ("DeepsightPerkDefinition", &[("effects.[].type", E(PerkEffectType::NAME))]),
];

/// `(base component, augmenting component)`.
const AUGMENTATIONS: &[(&str, &str)] = &[
    (ACTIVITY, "DeepsightDropTableDefinition"),
    ("DeepsightMomentDefinition", "DeepsightWallpaperDefinition"),
    ("DestinyItemTierTypeDefinition", "DeepsightTierTypeDefinition"),
    ("DeepsightMomentDefinition", "DeepsightCollectionsDefinition"),
    (INVENTORY_ITEM, "DeepsightItemSourceListDefinition"),
    (INVENTORY_ITEM, "DeepsightItemDamageTypesDefinition"),
    (INVENTORY_ITEM, "DeepsightBreakerTypeDefinition"),
    (INVENTORY_ITEM, "DeepsightCatalystDefinition"),
    (INVENTORY_ITEM, "DeepsightSocketExtendedDefinition"),
    (INVENTORY_ITEM, "DeepsightEmblemDefinition"),
    (INVENTORY_ITEM, "DeepsightAdeptDefinition"),
    (INVENTORY_ITEM, "DeepsightSocketCategorisation"),
    (INVENTORY_ITEM, "DeepsightPlugCategorisation"),
    (INVENTORY_ITEM, "DeepsightPerkDefinition"),
    (INVENTORY_ITEM, "ClarityDescriptions"),
    (INVENTORY_ITEM, "DeepsightFormattedClarityDescriptions"),
];

/// Enums declared in static `.d.ts` files: `(enum, file)`.
const DECLARED_ENUMS: &[(&str, &str)] = &[
    ("BreakerSource", "DeepsightBreakerTypeDefinition.d.ts"),
    ("DeepsightPlugCategory", "DeepsightPlugCategorisation.d.ts"),
];

fn tier_type() -> EnumDefinition {
    let members = [
        "BasicQuest",
        "BasicCurrency",
        "Common",
        "Uncommon",
        "Rare",
        "Legendary",
        "Exotic",
    ];
    EnumDefinition::from_members(
        "TierType",
        members.iter().zip(0..).map(|(name, value)| (name.to_string(), value)),
    )
}

pub fn deepsight_links(links: &mut DeepsightLinksDefinition, static_dir: &Path) {
    links.enums.insert("TierType".into(), tier_type());
    for definition in [
        EnumDefinition::exported::<ItemSourceType>(),
        EnumDefinition::exported::<ItemSourceCategory>(),
        EnumDefinition::exported::<PerkEffectType>(),
    ] {
        links.enums.insert(definition.name.clone(), definition);
    }

    for (component, component_links) in DEEPSIGHT_LINKS {
        let links_vec = component_links
            .iter()
            .map(|(path, target)| match target {
                Target::Component(component) => LinkDefinition::Component {
                    path: path.to_string(),
                    component: component.to_string(),
                },
                Target::Enum(enum_name) => LinkDefinition::Enum {
                    path: path.to_string(),
                    enum_name: enum_name.to_string(),
                },
            })
            .collect();
        links.components.insert(
            component.to_string(),
            ComponentLinks {
                component: component.to_string(),
                links: links_vec,
                augmentations: Vec::new(),
            },
        );
    }

    for (base, augmentation) in AUGMENTATIONS {
        links.add_augmentation(base, augmentation);
    }

    for (name, file) in DECLARED_ENUMS {
        add_declared_enum(links, static_dir, name, file);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn build(ctx: &BuildContext) -> Result<Vec<Artifact>, BuildError> {
    let settings = ctx.settings();
    let openapi = load_openapi(&settings.openapi)?;
    let component_names = ctx.manifest().component_names()?;

    let mut links = DeepsightLinksDefinition::default();
    if openapi.is_null() {
        log::warn!("No OpenAPI document, writing deepsight links only");
    } else {
        openapi_links(&openapi, &component_names, &mut links)?;
    }
    deepsight_links(&mut links, &settings.static_dir);

    Ok(vec![Artifact::json(FILE_NAME, &links)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BuildSettings;
    use crate::test_helpers::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn openapi() -> Value {
        json!({ "components": { "schemas": {
            "Destiny.Definitions.DestinyInventoryItemDefinition": {
                "type": "object",
                "properties": {
                    "hash": { "type": "integer", "format": "uint32" },
                    "collectibleHash": {
                        "type": "integer",
                        "format": "uint32",
                        "x-mapped-definition": { "$ref": "#/components/schemas/Destiny.Definitions.DestinyVendorDefinition" }
                    },
                    "itemCategoryHashes": {
                        "type": "array",
                        "items": { "type": "integer", "format": "uint32" },
                        "x-mapped-definition": { "$ref": "#/components/schemas/Destiny.Definitions.DestinyItemCategoryDefinition" }
                    },
                    "classType": {
                        "type": "integer",
                        "format": "int32",
                        "x-enum-reference": { "$ref": "#/components/schemas/Destiny.DestinyClass" }
                    },
                    "sockets": { "$ref": "#/components/schemas/Destiny.Definitions.DestinyItemSocketBlockDefinition" },
                    "stats": {
                        "type": "object",
                        "additionalProperties": { "$ref": "#/components/schemas/Destiny.Definitions.DestinyInventoryItemStatDefinition" },
                        "x-dictionary-key": {
                            "type": "integer",
                            "x-mapped-definition": { "$ref": "#/components/schemas/Destiny.Definitions.DestinyItemCategoryDefinition" }
                        }
                    },
                    "parent": { "$ref": "#/components/schemas/Destiny.Definitions.DestinyInventoryItemDefinition" }
                }
            },
            "Destiny.Definitions.DestinyItemSocketBlockDefinition": {
                "type": "object",
                "allOf": [{
                    "type": "object",
                    "properties": {
                        "socketEntries": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/Destiny.Definitions.DestinyItemSocketEntryDefinition" }
                        }
                    }
                }]
            },
            "Destiny.Definitions.DestinyItemSocketEntryDefinition": {
                "type": "object",
                "properties": {
                    "singleInitialItemHash": {
                        "type": "integer",
                        "x-mapped-definition": { "$ref": "#/components/schemas/Destiny.Definitions.DestinyInventoryItemDefinition" }
                    }
                }
            },
            "Destiny.Definitions.DestinyInventoryItemStatDefinition": {
                "type": "object",
                "properties": { "value": { "type": "integer" } }
            },
            "Destiny.Definitions.DestinyVendorDefinition": { "type": "object", "properties": {} },
            "Destiny.Definitions.DestinyItemCategoryDefinition": { "type": "object" },
            "Destiny.DestinyClass": {
                "type": "integer",
                "enum": ["0", "1", "2", "3"],
                "x-enum-values": [
                    { "numericValue": "0", "identifier": "Titan" },
                    { "numericValue": "1", "identifier": "Hunter" },
                    { "numericValue": "2", "identifier": "Warlock" },
                    { "numericValue": "3", "identifier": "Unknown", "description": "None" }
                ]
            },
            "Destiny.ItemState": {
                "type": "integer",
                "enum": ["0", "1", "2"],
                "x-enum-is-bitmask": true
            }
        } } })
    }

    fn component_names() -> Vec<String> {
        [
            "DestinyInventoryItemDefinition",
            "DestinyVendorDefinition",
            "DestinyItemCategoryDefinition",
            "DestinyActivityDefinition",
        ]
        .map(String::from)
        .to_vec()
    }

    fn walk() -> DeepsightLinksDefinition {
        let mut links = DeepsightLinksDefinition::default();
        openapi_links(&openapi(), &component_names(), &mut links).unwrap();
        links
    }

    fn link_paths(links: &DeepsightLinksDefinition, component: &str) -> Vec<(String, String)> {
        links.components[component]
            .links
            .iter()
            .map(|link| match link {
                LinkDefinition::Component { path, component } => (path.clone(), component.clone()),
                LinkDefinition::Enum { path, enum_name } => (path.clone(), format!("enum {enum_name}")),
            })
            .collect()
    }

    #[test]
    fn openapi_walk() {
        let links = walk();
        let mut paths = link_paths(&links, "DestinyInventoryItemDefinition");
        paths.sort();
        let expected: Vec<(String, String)> = [
            ("classType", "enum DestinyClass"),
            ("collectibleHash", "DestinyVendorDefinition"),
            ("itemCategoryHashes.[]", "DestinyItemCategoryDefinition"),
            ("sockets.socketEntries.[].singleInitialItemHash", "DestinyInventoryItemDefinition"),
            ("stats.{}", "DestinyItemCategoryDefinition"),
        ]
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
        assert_eq!(paths, expected);
        // definitions without links are left out
        assert!(!links.components.contains_key("DestinyVendorDefinition"));
    }

    #[test]
    fn enums_from_x_enum_values() {
        let links = walk();
        let class = &links.enums["DestinyClass"];
        assert_eq!(class.members.len(), 4);
        assert_eq!(class.members[1].name, "Hunter");
        assert_eq!(class.members[3].description.as_deref(), Some("None"));
        assert_eq!(class.bitmask, None);
    }

    #[test]
    fn bare_enums_and_bitmask() {
        let mut walker_enums = BTreeMap::new();
        let schemas = openapi()["components"]["schemas"].as_object().unwrap().clone();
        let mut walker = SchemaWalker {
            schemas: &schemas,
            names: HashMap::new(),
            enums: &mut walker_enums,
            visiting: Vec::new(),
        };
        walker.add_enum("ItemState");
        let state = &walker_enums["ItemState"];
        assert_eq!(state.members[2].name, "2");
        assert_eq!(state.members[2].value, 2);
        assert_eq!(state.bitmask, Some(true));
    }

    #[test]
    fn missing_schemas_are_an_error() {
        let mut links = DeepsightLinksDefinition::default();
        assert!(openapi_links(&json!({}), &component_names(), &mut links).is_err());
    }

    #[test]
    fn declared_enum_parsing() {
        let dts = "export declare const enum DeepsightPlugCategory {\n\tNone,\n\t// comment\n\tIntrinsic = 4,\n\tPerk,\n}\n";
        let parsed = parse_declared_enum(dts, "DeepsightPlugCategory").unwrap();
        let members: Vec<(&str, i64)> = parsed.members.iter().map(|m| (m.name.as_str(), m.value)).collect();
        assert_eq!(members, vec![("None", 0), ("Intrinsic", 4), ("Perk", 5)]);
        assert!(parse_declared_enum(dts, "Missing").is_none());
    }

    #[test]
    fn deepsight_links_and_enums() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("definitions")).unwrap();
        std::fs::write(
            dir.path().join("definitions/DeepsightBreakerTypeDefinition.d.ts"),
            "export declare const enum BreakerSource {\n\tIntrinsic,\n\tSubclass,\n}\n",
        )
        .unwrap();

        let mut links = DeepsightLinksDefinition::default();
        deepsight_links(&mut links, dir.path());

        assert_eq!(links.enums["BreakerSource"].members.len(), 2);
        // the plug categorisation declarations are missing, which only warns
        assert!(!links.enums.contains_key("DeepsightPlugCategory"));
        assert_eq!(links.enums["DeepsightItemSourceType"].members[0].name, "CommanderZavalaLegacyGear");
        assert_eq!(links.enums["TierType"].members[6].value, 6);

        let item = &links.components[INVENTORY_ITEM];
        assert!(item.links.is_empty());
        assert!(item.augmentations.contains(&"DeepsightAdeptDefinition".to_string()));
        let moment = &links.components["DeepsightMomentDefinition"];
        assert_eq!(moment.augmentations, vec!["DeepsightWallpaperDefinition", "DeepsightCollectionsDefinition"]);
    }

    #[test]
    fn build_with_inline_openapi() {
        let ctx = Fixture::new().context_with(BuildSettings {
            openapi: OpenApiSource::Inline(openapi()),
            ..test_settings()
        });
        let artifacts = build(&ctx).unwrap();
        let value = artifacts[0].as_json().unwrap();
        assert_eq!(
            value["components"]["DestinyInventoryItemDefinition"]["links"][0],
            json!({ "path": "classType", "enum": "DestinyClass" })
        );
        assert!(value["components"]["DeepsightDropTableDefinition"]["links"].is_array());
    }

    #[test]
    fn openapi_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("openapi.json");
        std::fs::write(&path, serde_json::to_vec(&openapi()).unwrap()).unwrap();
        let loaded = load_openapi(&OpenApiSource::File(path)).unwrap();
        assert_eq!(loaded, openapi());
    }
}
