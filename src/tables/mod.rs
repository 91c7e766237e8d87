//! The deepsight definition tables.
//!
//! Every table is a pure function of a [`BuildContext`]: it reads manifest
//! components, joins them with the declarative data kept next to the builder,
//! and returns one or more [`Artifact`]s. Nothing here touches the output
//! directory; [`pipeline`](crate::pipeline) decides what gets written and when.
//!
//! ```text
//! TableKind::Moments      → DeepsightMomentDefinition.json
//! TableKind::Collections  → DeepsightCollectionsDefinition.json
//! TableKind::Adept        → DeepsightAdeptDefinition.json
//! TableKind::Variants     → DeepsightVariantDefinition.json
//! TableKind::ItemSources  → DeepsightItemSourceListDefinition.json
//!                           DeepsightItemSourceDefinition.json
//! TableKind::DropTables   → DeepsightDropTableDefinition.json
//! TableKind::Foundries    → DeepsightWeaponFoundryDefinition.json
//! TableKind::WeaponTypes  → DeepsightWeaponTypeDefinition.json
//! TableKind::Links        → DeepsightLinksDefinition.json
//! TableKind::Perks        → DeepsightPerkDefinition.json
//! TableKind::Enums        → Enums.d.ts
//! ```
//!
//! Builders share intermediate results through the context's memos, so
//! building several tables in parallel computes moments and collections once.

pub mod adept;
pub mod collections;
pub mod drop_tables;
pub mod enums;
pub mod foundries;
pub mod item_sources;
pub mod links;
pub mod moments;
pub mod perks;
pub mod variants;
pub mod weapon_types;

use crate::context::BuildContext;
use crate::manifest::ManifestError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("{0} validation failed")]
    Validation(&'static str),
    #[error("{0}")]
    Unresolved(String),
    #[error("Unable to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Exported enums
// ============================================================================

/// A Rust enum that is also declared in `Enums.d.ts`.
pub trait ExportedEnum {
    /// Name of the TypeScript `const enum`.
    const NAME: &'static str;

    /// `(member, value)` pairs in declaration order.
    fn members() -> Vec<(&'static str, u32)>;
}

/// Declare a fieldless enum that serializes as its numeric value and
/// implements [`ExportedEnum`].
macro_rules! exported_enum {
    (
        $(#[$meta:meta])*
        pub enum $ty:ident as $export:literal {
            $($variant:ident = $value:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(into = "u32")]
        pub enum $ty {
            $($variant),*
        }

        impl $ty {
            pub const ALL: &[$ty] = &[$($ty::$variant),*];

            pub fn value(self) -> u32 {
                match self {
                    $($ty::$variant => $value),*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => stringify!($variant)),*
                }
            }
        }

        impl From<$ty> for u32 {
            fn from(value: $ty) -> u32 {
                value.value()
            }
        }

        impl $crate::tables::ExportedEnum for $ty {
            const NAME: &'static str = $export;

            fn members() -> Vec<(&'static str, u32)> {
                Self::ALL.iter().map(|v| (v.name(), v.value())).collect()
            }
        }
    };
}

pub(crate) use exported_enum;

// ============================================================================
// Artifacts
// ============================================================================

/// One output file produced by a builder.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// File name relative to the definitions directory.
    pub file_name: String,
    pub content: ArtifactContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactContent {
    Json(serde_json::Value),
    Text(String),
}

impl Artifact {
    pub fn json(file_name: impl Into<String>, value: &impl Serialize) -> Result<Self, BuildError> {
        Ok(Self {
            file_name: file_name.into(),
            content: ArtifactContent::Json(serde_json::to_value(value)?),
        })
    }

    pub fn text(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: ArtifactContent::Text(text.into()),
        }
    }

    /// Bytes as written to disk. JSON is tab-indented.
    pub fn render(&self) -> Result<Vec<u8>, BuildError> {
        match &self.content {
            ArtifactContent::Json(value) => Ok(to_tab_json(value)?),
            ArtifactContent::Text(text) => Ok(text.clone().into_bytes()),
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match &self.content {
            ArtifactContent::Json(value) => Some(value),
            ArtifactContent::Text(_) => None,
        }
    }
}

/// Serialize with tab indentation, the layout every definition file uses.
pub fn to_tab_json(value: &impl Serialize) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum TableKind {
    Moments,
    Collections,
    Adept,
    Variants,
    ItemSources,
    DropTables,
    Foundries,
    WeaponTypes,
    Links,
    Perks,
    Enums,
}

impl TableKind {
    pub const ALL: [TableKind; 11] = [
        TableKind::Moments,
        TableKind::Collections,
        TableKind::Adept,
        TableKind::Variants,
        TableKind::ItemSources,
        TableKind::DropTables,
        TableKind::Foundries,
        TableKind::WeaponTypes,
        TableKind::Links,
        TableKind::Perks,
        TableKind::Enums,
    ];

    /// Name used in logs and reports.
    pub fn name(self) -> &'static str {
        match self {
            TableKind::Moments => "DeepsightMomentDefinition",
            TableKind::Collections => "DeepsightCollectionsDefinition",
            TableKind::Adept => "DeepsightAdeptDefinition",
            TableKind::Variants => "DeepsightVariantDefinition",
            TableKind::ItemSources => "DeepsightItemSourceDefinition",
            TableKind::DropTables => "DeepsightDropTableDefinition",
            TableKind::Foundries => "DeepsightWeaponFoundryDefinition",
            TableKind::WeaponTypes => "DeepsightWeaponTypeDefinition",
            TableKind::Links => "DeepsightLinksDefinition",
            TableKind::Perks => "DeepsightPerkDefinition",
            TableKind::Enums => "Enums",
        }
    }

    pub fn build(self, ctx: &BuildContext) -> Result<Vec<Artifact>, BuildError> {
        log::debug!("Building {self}");
        match self {
            TableKind::Moments => moments::build(ctx),
            TableKind::Collections => collections::build(ctx),
            TableKind::Adept => adept::build(ctx),
            TableKind::Variants => variants::build(ctx),
            TableKind::ItemSources => item_sources::build(ctx),
            TableKind::DropTables => drop_tables::build(ctx),
            TableKind::Foundries => foundries::build(ctx),
            TableKind::WeaponTypes => weapon_types::build(ctx),
            TableKind::Links => links::build(ctx),
            TableKind::Perks => perks::build(ctx),
            TableKind::Enums => enums::build(ctx),
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
