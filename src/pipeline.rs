//! The `static` build and the small tasks around it.
//!
//! ```text
//! static/ ──copy──► docs/                       (retried, the dev server may hold files)
//! $DEEPSIGHT_PATH ──► BuildContext ──► builders (rayon, one task per table)
//!                                        │
//!                         all succeeded? ├─ no  → error, nothing written
//!                                        └─ yes → docs/definitions/*.json, Enums.d.ts
//! ```
//!
//! Every build gets a fresh [`BuildContext`], so a watch-mode rebuild never
//! sees tables memoized by the previous one. Builders only return
//! [`Artifact`]s; all writing happens here, after every builder has finished,
//! and each file is written to a temporary sibling and renamed into place.

use crate::config::{BuildConfig, Environment};
use crate::context::{BuildContext, BuildSettings, OpenApiSource};
use crate::manifest::Manifest;
use crate::tables::enums::{self, PruneReport};
use crate::tables::{Artifact, BuildError, TableKind};
use chrono::Utc;
use rayon::prelude::*;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use walkdir::WalkDir;

/// Environment variable naming the manifest snapshot directory.
pub const SNAPSHOT_ENV: &str = "DEEPSIGHT_PATH";

const COPY_ATTEMPTS: u32 = 5;
const COPY_RETRY_DELAY: Duration = Duration::from_millis(200);

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("DEEPSIGHT_PATH env var must be set")]
    MissingSnapshot,
    #[error("Failed to build {table}: {source}")]
    Table {
        table: TableKind,
        #[source]
        source: BuildError,
    },
    #[error("Failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Settings for a build from config plus the process environment.
///
/// `hostname` must be an http(s) URL; shells often export `HOSTNAME` as the
/// machine name. It falls back to the local dev server in dev and the public
/// site in prod.
pub fn build_settings(
    config: &BuildConfig,
    environment: Environment,
    hostname: Option<String>,
) -> BuildSettings {
    let hostname = hostname
        .filter(|h| h.starts_with("http://") || h.starts_with("https://"))
        .unwrap_or_else(|| match environment {
            Environment::Dev => format!("http://localhost:{}/", config.server.port),
            Environment::Prod => "https://deepsight.gg/".to_string(),
        });
    let openapi = match &config.links.openapi_path {
        Some(path) => OpenApiSource::File(PathBuf::from(path)),
        None => OpenApiSource::Url(config.links.openapi_url.clone()),
    };
    BuildSettings {
        environment,
        hostname,
        now: Utc::now(),
        openapi,
        static_dir: PathBuf::from(&config.paths.static_dir),
    }
}

// ============================================================================
// Static copy
// ============================================================================

/// Copy `from` into `to`, retrying transient failures.
///
/// Returns the number of files copied. A missing `from` copies nothing.
pub fn copy_static(from: &Path, to: &Path) -> Result<usize, PipelineError> {
    if !from.is_dir() {
        log::warn!("Static directory {} does not exist, nothing to copy", from.display());
        return Ok(0);
    }

    let mut attempt = 1;
    loop {
        match copy_tree(from, to) {
            Ok(copied) => return Ok(copied),
            Err(source) if attempt < COPY_ATTEMPTS => {
                log::debug!("Copy attempt {attempt} of {} failed: {source}", from.display());
                attempt += 1;
                thread::sleep(COPY_RETRY_DELAY);
            }
            Err(source) => {
                return Err(PipelineError::Copy {
                    from: from.to_path_buf(),
                    to: to.to_path_buf(),
                    source,
                });
            }
        }
    }
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(from) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(from).map_err(io::Error::other)?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

// ============================================================================
// Writing
// ============================================================================

/// Write `bytes` to a temporary sibling of `path`, then rename it into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a file path: {}", path.display()),
        )
    })?;
    let mut temp_name = OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(".tmp");
    let temp = path.with_file_name(temp_name);

    fs::write(&temp, bytes)?;
    fs::rename(&temp, path).inspect_err(|_| {
        let _ = fs::remove_file(&temp);
    })
}

// ============================================================================
// Build
// ============================================================================

/// One table's output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: TableKind,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub static_files: usize,
    pub tables: Vec<TableReport>,
    pub definitions_dir: PathBuf,
    pub elapsed: Duration,
}

/// Tables to build: `only` when given, otherwise all of them.
pub fn selected_tables(only: &[TableKind]) -> Vec<TableKind> {
    let mut tables = if only.is_empty() {
        TableKind::ALL.to_vec()
    } else {
        only.to_vec()
    };
    tables.sort();
    tables.dedup();
    tables
}

/// Build tables in parallel. Fails with the first builder error; the
/// remaining results are discarded.
pub fn build_tables(
    ctx: &BuildContext,
    tables: &[TableKind],
) -> Result<Vec<(TableKind, Vec<Artifact>)>, PipelineError> {
    tables
        .par_iter()
        .map(|&table| {
            let started = Instant::now();
            let artifacts = table
                .build(ctx)
                .map_err(|source| PipelineError::Table { table, source })?;
            log::info!("Built {table} in {:.2?}", started.elapsed());
            Ok((table, artifacts))
        })
        .collect()
}

/// Render every artifact, then write them all to `definitions_dir`.
pub fn write_tables(
    definitions_dir: &Path,
    built: &[(TableKind, Vec<Artifact>)],
) -> Result<Vec<TableReport>, PipelineError> {
    let mut rendered = Vec::new();
    for (table, artifacts) in built {
        for artifact in artifacts {
            rendered.push((*table, artifact.file_name.as_str(), artifact.render()?));
        }
    }

    fs::create_dir_all(definitions_dir)?;
    let mut reports: Vec<TableReport> = Vec::new();
    for (table, file_name, bytes) in rendered {
        write_atomic(&definitions_dir.join(file_name), &bytes)?;
        match reports.last_mut() {
            Some(report) if report.table == table => report.files.push(file_name.to_string()),
            _ => reports.push(TableReport {
                table,
                files: vec![file_name.to_string()],
            }),
        }
    }
    Ok(reports)
}

/// The `static` task: copy static files, then build and write the tables.
pub fn build_static(
    config: &BuildConfig,
    settings: BuildSettings,
    snapshot: Option<&Path>,
    only: &[TableKind],
) -> Result<BuildReport, PipelineError> {
    let started = Instant::now();
    let output_dir = Path::new(&config.paths.output_dir);
    let definitions_dir = config.definitions_dir();

    fs::create_dir_all(&definitions_dir)?;
    let static_files = copy_static(Path::new(&config.paths.static_dir), output_dir)?;

    let snapshot = snapshot.ok_or(PipelineError::MissingSnapshot)?;
    log::info!("Building from snapshot {}", snapshot.display());
    let ctx = BuildContext::new(Manifest::open(snapshot), settings);

    let built = build_tables(&ctx, &selected_tables(only))?;
    let tables = write_tables(&definitions_dir, &built)?;

    Ok(BuildReport {
        static_files,
        tables,
        definitions_dir,
        elapsed: started.elapsed(),
    })
}

// ============================================================================
// Other tasks
// ============================================================================

/// Remove the output directory. Returns whether there was one.
pub fn clean(config: &BuildConfig) -> Result<bool, PipelineError> {
    let output_dir = Path::new(&config.paths.output_dir);
    if !output_dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(output_dir)?;
    Ok(true)
}

/// Prune the built `Enums.d.ts` down to the item hashes the app uses.
pub fn prune_enums(
    config: &BuildConfig,
    settings: BuildSettings,
    snapshot: Option<&Path>,
) -> Result<PruneReport, PipelineError> {
    let snapshot = snapshot.ok_or(PipelineError::MissingSnapshot)?;
    let ctx = BuildContext::new(Manifest::open(snapshot), settings);
    let used = enums::referenced_item_hashes(&ctx)?;
    Ok(enums::prune(&config.definitions_dir(), &used)?)
}
