//! Per-build state shared by the table builders.
//!
//! A [`BuildContext`] owns the [`Manifest`] for one build plus the memoized
//! intermediate tables several builders depend on:
//!
//! ```text
//! moments ──► collections ──► adept
//!                  │    └────► variants (also reads adept)
//!                  └─────────► item sources, drop tables, enums
//! ```
//!
//! The first builder to ask for, say, the collections table computes it; any
//! builder asking concurrently waits and shares the result. A new context is
//! created for every build, so watch-mode rebuilds never see stale tables.

use crate::config::Environment;
use crate::manifest::Manifest;
use crate::tables::BuildError;
use crate::tables::adept::{self, AdeptTable};
use crate::tables::collections::{self, Collections};
use crate::tables::moments::{self, MomentTable};
use crate::tables::variants::{self, VariantTable};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;

/// Where the links builder gets the Bungie.net OpenAPI schema from.
#[derive(Debug, Clone)]
pub enum OpenApiSource {
    Url(String),
    File(PathBuf),
    /// Already parsed, used by tests.
    Inline(serde_json::Value),
}

/// Inputs to a build that do not come from the manifest.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub environment: Environment,
    /// Prefix for image URLs the app serves itself.
    pub hostname: String,
    /// Reference time for rotations and reset times.
    pub now: DateTime<Utc>,
    pub openapi: OpenApiSource,
    /// Hand-written declaration files (`*.d.ts`) read by the links builder.
    pub static_dir: PathBuf,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            environment: Environment::Prod,
            hostname: String::new(),
            now: Utc::now(),
            openapi: OpenApiSource::Inline(serde_json::Value::Null),
            static_dir: PathBuf::from("static"),
        }
    }
}

#[derive(Debug)]
pub struct BuildContext {
    manifest: Manifest,
    settings: BuildSettings,
    moments: OnceCell<Arc<MomentTable>>,
    collections: OnceCell<Arc<Collections>>,
    adept: OnceCell<Arc<AdeptTable>>,
    variants: OnceCell<Arc<VariantTable>>,
}

impl BuildContext {
    pub fn new(manifest: Manifest, settings: BuildSettings) -> Self {
        Self {
            manifest,
            settings,
            moments: OnceCell::new(),
            collections: OnceCell::new(),
            adept: OnceCell::new(),
            variants: OnceCell::new(),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    pub fn is_dev(&self) -> bool {
        self.settings.environment.is_dev()
    }

    pub fn moments(&self) -> Result<Arc<MomentTable>, BuildError> {
        self.moments
            .get_or_try_init(|| moments::compute(&self.manifest).map(Arc::new))
            .map(Arc::clone)
    }

    pub fn collections(&self) -> Result<Arc<Collections>, BuildError> {
        let moments = self.moments()?;
        self.collections
            .get_or_try_init(|| collections::compute(&self.manifest, &moments).map(Arc::new))
            .map(Arc::clone)
    }

    pub fn adept(&self) -> Result<Arc<AdeptTable>, BuildError> {
        let collections = self.collections()?;
        self.adept
            .get_or_try_init(|| adept::compute(&self.manifest, &collections).map(Arc::new))
            .map(Arc::clone)
    }

    pub fn variants(&self) -> Result<Arc<VariantTable>, BuildError> {
        let collections = self.collections()?;
        let adept = self.adept()?;
        self.variants
            .get_or_try_init(|| {
                variants::compute(&self.manifest, &collections, &adept).map(Arc::new)
            })
            .map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use crate::manifest::Component;
    use crate::test_helpers::Fixture;
    use std::sync::Arc;

    #[test]
    fn intermediate_tables_are_computed_once() {
        let ctx = Fixture::new().context();
        let first = ctx.collections().unwrap();
        let second = ctx.collections().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(ctx.moments.get().is_some());
    }

    #[test]
    fn failure_is_not_cached() {
        let ctx = Fixture::new().without(Component::InventoryItem).context();
        assert!(ctx.collections().is_err());
        assert!(ctx.collections.get().is_none());
        assert!(ctx.adept().is_err());
    }
}
