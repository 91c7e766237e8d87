//! Manifest references and their resolution to display strings.
//!
//! Declarative tables (moments, foundries, item sources, drop tables) rarely
//! spell out names and icons. They point at some manifest record instead and
//! let the build pull the value out. A [`Reference`] is an ordered list of
//! [`Candidate`]s:
//!
//! ```text
//! Literal("Forsaken")                                  → "Forsaken"
//! Lookup { Activity, 1234, Record }                    → record's own field
//! Lookup { Vendor, 5678, Property("mapIcon") }         → vendor.mapIcon
//! Lookup { Activity, 1234, Path(["originalDisplayProperties", "name"]) }
//! Lookup { PresentationNode, 9, Frame { sequence: 1, frame: 0 } }
//! Lookup { InventoryItem, 42, Custom(fn) }             → fn(record)
//! ```
//!
//! # Resolution order
//!
//! [`resolve`] walks the candidates in order. For each one:
//!
//! 1. a literal is returned as-is;
//! 2. the record is looked up, a missing record moves on to the next candidate;
//! 3. a frame lookup returns `displayProperties.iconSequences[s].frames[f]`,
//!    or nothing (logged) when absent;
//! 4. a property path is walked step by step, a missing step yields nothing
//!    (logged), the final value is stringified;
//! 5. a custom resolver's result is returned;
//! 6. a named property present on the record is returned if truthy, otherwise
//!    nothing (logged);
//! 7. otherwise the named property is read from `displayProperties` the same way;
//! 8. a plain record lookup reads the field being resolved: watermarks,
//!    `pgcrImage` and `secondaryIcon` from the record, everything else from
//!    `displayProperties`. An empty value moves on to the next candidate.
//!
//! When no candidate produced a value, the alternative sources are tried with
//! rule 8. The first defined value ends the chain. If it is the
//! [`MISSING_ICON_PATH`] sentinel the result is `None`: the sentinel means
//! "no icon" and does not reopen the chain.

use crate::manifest::{Activity, Component, InventoryItem, MISSING_ICON_PATH, Manifest, ManifestError};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Callback used by [`Lookup::Custom`].
pub type CustomResolver = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub enum Lookup {
    Record,
    Property(String),
    Path(Vec<String>),
    Frame { sequence: usize, frame: usize },
    Custom(CustomResolver),
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Record => f.write_str("Record"),
            Lookup::Property(name) => f.debug_tuple("Property").field(name).finish(),
            Lookup::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Lookup::Frame { sequence, frame } => f
                .debug_struct("Frame")
                .field("sequence", sequence)
                .field("frame", frame)
                .finish(),
            Lookup::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Candidate {
    Literal(String),
    Lookup {
        component: Component,
        hash: u32,
        lookup: Lookup,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Reference {
    candidates: Vec<Candidate>,
}

impl Reference {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::from_candidate(Candidate::Literal(value.into()))
    }

    pub fn hash(component: Component, hash: u32) -> Self {
        Self::lookup(component, hash, Lookup::Record)
    }

    pub fn property(component: Component, hash: u32, property: &str) -> Self {
        Self::lookup(component, hash, Lookup::Property(property.to_string()))
    }

    pub fn path(component: Component, hash: u32, path: &[&str]) -> Self {
        Self::lookup(
            component,
            hash,
            Lookup::Path(path.iter().map(|s| s.to_string()).collect()),
        )
    }

    pub fn frame(component: Component, hash: u32, sequence: usize, frame: usize) -> Self {
        Self::lookup(component, hash, Lookup::Frame { sequence, frame })
    }

    pub fn custom(
        component: Component,
        hash: u32,
        resolver: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self::lookup(component, hash, Lookup::Custom(Arc::new(resolver)))
    }

    pub fn lookup(component: Component, hash: u32, lookup: Lookup) -> Self {
        Self::from_candidate(Candidate::Lookup {
            component,
            hash,
            lookup,
        })
    }

    fn from_candidate(candidate: Candidate) -> Self {
        Self {
            candidates: vec![candidate],
        }
    }

    /// Append the candidates of `fallback` after this reference's own.
    pub fn or(mut self, fallback: Reference) -> Self {
        self.candidates.extend(fallback.candidates);
        self
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// The literal value if this reference is a single literal.
    pub fn as_literal(&self) -> Option<&str> {
        match self.candidates.as_slice() {
            [Candidate::Literal(value)] => Some(value),
            _ => None,
        }
    }

    /// Hashes this reference points at within `component`.
    pub fn hashes_in(&self, component: Component) -> impl Iterator<Item = u32> + '_ {
        self.candidates.iter().filter_map(move |candidate| match candidate {
            Candidate::Lookup {
                component: c,
                hash,
                ..
            } if *c == component => Some(*hash),
            _ => None,
        })
    }
}

impl From<&str> for Reference {
    fn from(value: &str) -> Self {
        Reference::literal(value)
    }
}

/// The display field a reference is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Subtitle,
    Description,
    Icon,
    IconWatermark,
    IconWatermarkShelved,
    IconWatermarkFeatured,
    PgcrImage,
    SecondaryIcon,
}

impl Field {
    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Subtitle => "subtitle",
            Field::Description => "description",
            Field::Icon => "icon",
            Field::IconWatermark => "iconWatermark",
            Field::IconWatermarkShelved => "iconWatermarkShelved",
            Field::IconWatermarkFeatured => "iconWatermarkFeatured",
            Field::PgcrImage => "pgcrImage",
            Field::SecondaryIcon => "secondaryIcon",
        }
    }

    /// Fields read from the record itself rather than its display properties.
    fn is_record_field(self) -> bool {
        matches!(
            self,
            Field::IconWatermark
                | Field::IconWatermarkShelved
                | Field::IconWatermarkFeatured
                | Field::PgcrImage
                | Field::SecondaryIcon
        )
    }
}

// ============================================================================
// Sources
// ============================================================================

/// Anything a field can be read from generically (rule 8).
pub trait DisplaySource {
    fn source_field(&self, field: Field) -> Option<String>;
}

impl DisplaySource for Value {
    fn source_field(&self, field: Field) -> Option<String> {
        let value = if field.is_record_field() {
            self.get(field.key())
        } else {
            self.get("displayProperties")?.get(field.key())
        };
        value
            .filter(|v| is_truthy(v))
            .map(stringify)
    }
}

impl DisplaySource for Activity {
    fn source_field(&self, field: Field) -> Option<String> {
        let display = &self.display_properties;
        let value = match field {
            Field::PgcrImage => self.pgcr_image.as_deref(),
            Field::Name => Some(display.name.as_str()),
            Field::Description => Some(display.description.as_str()),
            Field::Icon => display.icon.as_deref(),
            _ => None,
        };
        value.filter(|s| !s.is_empty()).map(str::to_string)
    }
}

impl DisplaySource for InventoryItem {
    fn source_field(&self, field: Field) -> Option<String> {
        let display = &self.display_properties;
        let value = match field {
            Field::IconWatermark => self.icon_watermark.as_deref(),
            Field::IconWatermarkShelved => self.icon_watermark_shelved.as_deref(),
            Field::IconWatermarkFeatured => self.icon_watermark_featured.as_deref(),
            Field::SecondaryIcon => self.secondary_icon.as_deref(),
            Field::Name => Some(display.name.as_str()),
            Field::Description => Some(display.description.as_str()),
            Field::Icon => display.icon.as_deref(),
            _ => None,
        };
        value.filter(|s| !s.is_empty()).map(str::to_string)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String form of a JSON value, the way a template literal would print it.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => stringify(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn record_name(record: &Value) -> &str {
    record
        .get("displayProperties")
        .and_then(|d| d.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("No name")
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve `reference` for `field`, falling back to `alternatives`.
pub fn resolve(
    manifest: &Manifest,
    reference: Option<&Reference>,
    field: Field,
    alternatives: &[&dyn DisplaySource],
) -> Result<Option<String>, ManifestError> {
    let value = resolve_chain(manifest, reference, field, alternatives)?;
    Ok(value.filter(|v| v != MISSING_ICON_PATH))
}

fn resolve_chain(
    manifest: &Manifest,
    reference: Option<&Reference>,
    field: Field,
    alternatives: &[&dyn DisplaySource],
) -> Result<Option<String>, ManifestError> {
    for candidate in reference.map(Reference::candidates).unwrap_or_default() {
        let (component, hash, lookup) = match candidate {
            Candidate::Literal(value) => return Ok(Some(value.clone())),
            Candidate::Lookup {
                component,
                hash,
                lookup,
            } => (*component, *hash, lookup),
        };

        let table = manifest.raw(component)?;
        let Some(record) = table.get(&hash) else {
            continue;
        };

        let property_error = |property: &str| {
            log::error!(
                "Unable to resolve property from manifest reference: {} ({component} {hash}), property {property}",
                record_name(record)
            );
        };

        match lookup {
            Lookup::Frame { sequence, frame } if record.get("displayProperties").is_some() => {
                let icon = record["displayProperties"]
                    .get("iconSequences")
                    .and_then(|s| s.get(*sequence))
                    .and_then(|s| s.get("frames"))
                    .and_then(|f| f.get(*frame))
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty());
                if icon.is_none() {
                    log::error!(
                        "Unable to resolve icon from manifest reference: {} ({component}), icon sequence {sequence}, frame {frame}",
                        record_name(record)
                    );
                }
                return Ok(icon.map(str::to_string));
            }
            Lookup::Path(path) => {
                let mut cursor = record;
                for step in path {
                    let next = match cursor {
                        Value::Object(map) => map.get(step),
                        Value::Array(items) => step.parse::<usize>().ok().and_then(|i| items.get(i)),
                        _ => None,
                    };
                    match next {
                        Some(next) => cursor = next,
                        None => {
                            property_error(&path.join("."));
                            return Ok(None);
                        }
                    }
                }
                return Ok(Some(stringify(cursor)));
            }
            Lookup::Custom(resolver) => return Ok(resolver(record)),
            Lookup::Property(property) if record.get(property.as_str()).is_some() => {
                let value = &record[property.as_str()];
                if !is_truthy(value) {
                    property_error(property);
                    return Ok(None);
                }
                return Ok(Some(stringify(value)));
            }
            Lookup::Property(property) if record.get("displayProperties").is_some() => {
                let value = record["displayProperties"].get(property.as_str());
                return match value.filter(|v| is_truthy(v)) {
                    Some(value) => Ok(Some(stringify(value))),
                    None => {
                        property_error(property);
                        Ok(None)
                    }
                };
            }
            _ => {}
        }

        if let Some(value) = record.source_field(field) {
            return Ok(Some(value));
        }
    }

    Ok(alternatives.iter().find_map(|alt| alt.source_field(field)))
}

// ============================================================================
// Display properties
// ============================================================================

/// Display properties whose fields are references.
#[derive(Debug, Clone, Default)]
pub struct DisplayPropertiesRef {
    pub name: Option<Reference>,
    pub subtitle: Option<Reference>,
    pub description: Option<Reference>,
    pub icon: Option<Reference>,
}

impl DisplayPropertiesRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<Reference>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn subtitle(mut self, subtitle: impl Into<Reference>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn description(mut self, description: impl Into<Reference>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<Reference>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// The same reference for name, description and icon.
    pub fn all_from(reference: Reference) -> Self {
        Self {
            name: Some(reference.clone()),
            subtitle: None,
            description: Some(reference.clone()),
            icon: Some(reference),
        }
    }
}

/// Resolved display properties as written to the deepsight tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepsightDisplayProperties {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Resolve every field of `display`.
///
/// The subtitle falls back to resolving the subtitle reference as a name.
/// Name and description default to the empty string.
pub fn resolve_all(
    manifest: &Manifest,
    display: Option<&DisplayPropertiesRef>,
    alternatives: &[&dyn DisplaySource],
) -> Result<DeepsightDisplayProperties, ManifestError> {
    if display.is_none() && alternatives.is_empty() {
        return Ok(DeepsightDisplayProperties::default());
    }
    let name_ref = display.and_then(|d| d.name.as_ref());
    let subtitle_ref = display.and_then(|d| d.subtitle.as_ref());
    let description_ref = display.and_then(|d| d.description.as_ref());
    let icon_ref = display.and_then(|d| d.icon.as_ref());

    let name = resolve(manifest, name_ref, Field::Name, alternatives)?;
    let subtitle = match resolve(manifest, subtitle_ref, Field::Subtitle, alternatives)? {
        Some(subtitle) => Some(subtitle),
        None => resolve(manifest, subtitle_ref, Field::Name, alternatives)?,
    };
    let description = resolve(manifest, description_ref, Field::Description, alternatives)?;
    let icon = resolve(manifest, icon_ref, Field::Icon, alternatives)?;

    Ok(DeepsightDisplayProperties {
        name: name.unwrap_or_default(),
        subtitle,
        description: description.unwrap_or_default(),
        icon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MemorySource;
    use serde_json::json;

    fn manifest() -> Manifest {
        Manifest::new(
            MemorySource::new()
                .with_component(
                    Component::InventoryItem,
                    json!({
                        "1": {
                            "hash": 1,
                            "displayProperties": {
                                "name": "Thorn",
                                "description": "Cursed",
                                "icon": "/thorn.png",
                                "iconSequences": [{ "frames": ["/f0.png", "/f1.png"] }]
                            },
                            "iconWatermark": "/wm.png",
                            "iconWatermarkShelved": "",
                            "secondaryIcon": "/overlay.png",
                            "collectibleHash": 99
                        },
                        "2": {
                            "hash": 2,
                            "displayProperties": { "name": "Empty", "icon": MISSING_ICON_PATH }
                        }
                    }),
                )
                .with_component(
                    Component::Vendor,
                    json!({
                        "5": {
                            "hash": 5,
                            "displayProperties": { "name": "Banshee-44", "description": "Gunsmith" },
                            "mapIcon": "/map.png",
                            "failureStrings": []
                        }
                    }),
                ),
        )
    }

    fn item(hash: u32) -> Reference {
        Reference::hash(Component::InventoryItem, hash)
    }

    // =========================================================================
    // Precedence
    // =========================================================================

    #[test]
    fn literal_is_returned_verbatim() {
        let m = manifest();
        let r = Reference::literal("Forsaken");
        assert_eq!(resolve(&m, Some(&r), Field::Name, &[]).unwrap().as_deref(), Some("Forsaken"));
    }

    #[test]
    fn plain_lookup_reads_display_properties() {
        let m = manifest();
        assert_eq!(resolve(&m, Some(&item(1)), Field::Name, &[]).unwrap().as_deref(), Some("Thorn"));
        assert_eq!(resolve(&m, Some(&item(1)), Field::Icon, &[]).unwrap().as_deref(), Some("/thorn.png"));
    }

    #[test]
    fn plain_lookup_reads_record_fields_for_watermarks() {
        let m = manifest();
        assert_eq!(
            resolve(&m, Some(&item(1)), Field::IconWatermark, &[]).unwrap().as_deref(),
            Some("/wm.png")
        );
        assert_eq!(
            resolve(&m, Some(&item(1)), Field::SecondaryIcon, &[]).unwrap().as_deref(),
            Some("/overlay.png")
        );
        // empty string counts as absent
        assert_eq!(resolve(&m, Some(&item(1)), Field::IconWatermarkShelved, &[]).unwrap(), None);
    }

    #[test]
    fn missing_record_moves_to_next_candidate() {
        let m = manifest();
        let r = item(404).or(Reference::literal("fallback"));
        assert_eq!(resolve(&m, Some(&r), Field::Name, &[]).unwrap().as_deref(), Some("fallback"));
    }

    #[test]
    fn frame_lookup() {
        let m = manifest();
        let r = Reference::frame(Component::InventoryItem, 1, 0, 1);
        assert_eq!(resolve(&m, Some(&r), Field::Icon, &[]).unwrap().as_deref(), Some("/f1.png"));
        let missing = Reference::frame(Component::InventoryItem, 1, 3, 0).or(Reference::literal("x"));
        // a missing frame ends the chain
        assert_eq!(resolve(&m, Some(&missing), Field::Icon, &[]).unwrap(), None);
    }

    #[test]
    fn property_path_is_stringified() {
        let m = manifest();
        let r = Reference::path(Component::InventoryItem, 1, &["collectibleHash"]);
        assert_eq!(resolve(&m, Some(&r), Field::Name, &[]).unwrap().as_deref(), Some("99"));
        let broken = Reference::path(Component::InventoryItem, 1, &["displayProperties", "nope"]);
        assert_eq!(resolve(&m, Some(&broken), Field::Name, &[]).unwrap(), None);
    }

    #[test]
    fn named_property_on_record_then_display_properties() {
        let m = manifest();
        let map_icon = Reference::property(Component::Vendor, 5, "mapIcon");
        assert_eq!(resolve(&m, Some(&map_icon), Field::Icon, &[]).unwrap().as_deref(), Some("/map.png"));
        let name = Reference::property(Component::Vendor, 5, "name");
        assert_eq!(resolve(&m, Some(&name), Field::Subtitle, &[]).unwrap().as_deref(), Some("Banshee-44"));
        let falsy = Reference::property(Component::Vendor, 5, "failureStrings");
        assert_eq!(resolve(&m, Some(&falsy), Field::Name, &[]).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn custom_resolver_receives_record() {
        let m = manifest();
        let r = Reference::custom(Component::InventoryItem, 1, |record| {
            record["hash"].as_u64().map(|h| format!("generated/{h}.png"))
        });
        assert_eq!(
            resolve(&m, Some(&r), Field::Icon, &[]).unwrap().as_deref(),
            Some("generated/1.png")
        );
    }

    #[test]
    fn alternatives_are_tried_last() {
        let m = manifest();
        let alt = json!({ "displayProperties": { "name": "Alt" }, "pgcrImage": "/pgcr.jpg" });
        assert_eq!(resolve(&m, None, Field::Name, &[&alt]).unwrap().as_deref(), Some("Alt"));
        assert_eq!(resolve(&m, None, Field::PgcrImage, &[&alt]).unwrap().as_deref(), Some("/pgcr.jpg"));
        assert_eq!(resolve(&m, None, Field::Name, &[]).unwrap(), None);
    }

    #[test]
    fn missing_icon_sentinel_resolves_to_none() {
        let m = manifest();
        // component lookup yields the sentinel before the literal fallback is reached
        let r = item(2).or(Reference::literal("/fallback.png"));
        assert_eq!(resolve(&m, Some(&r), Field::Icon, &[]).unwrap(), None);
        let literal = Reference::literal(MISSING_ICON_PATH);
        assert_eq!(resolve(&m, Some(&literal), Field::Icon, &[]).unwrap(), None);
    }

    #[test]
    fn missing_component_propagates() {
        let m = manifest();
        let r = Reference::hash(Component::Activity, 1);
        assert!(resolve(&m, Some(&r), Field::Name, &[]).is_err());
    }

    // =========================================================================
    // resolve_all
    // =========================================================================

    #[test]
    fn resolve_all_defaults() {
        let m = manifest();
        let resolved = resolve_all(&m, None, &[]).unwrap();
        assert_eq!(resolved, DeepsightDisplayProperties::default());
    }

    #[test]
    fn resolve_all_subtitle_falls_back_to_name() {
        let m = manifest();
        let display = DisplayPropertiesRef::new()
            .name(item(1))
            .subtitle(Reference::hash(Component::Vendor, 5))
            .icon(item(2));
        let resolved = resolve_all(&m, Some(&display), &[]).unwrap();
        assert_eq!(resolved.name, "Thorn");
        assert_eq!(resolved.subtitle.as_deref(), Some("Banshee-44"));
        assert_eq!(resolved.description, "");
        assert_eq!(resolved.icon, None);
    }
}
