use clap::{Parser, Subcommand};
use deepsight_manifest::config::{self, BuildConfig, Environment};
use deepsight_manifest::context::BuildSettings;
use deepsight_manifest::manifest::Manifest;
use deepsight_manifest::pipeline::{self, PipelineError};
use deepsight_manifest::tables::TableKind;
use deepsight_manifest::versions::VersionBumper;
use deepsight_manifest::{output, serve, watch};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shared flags for commands that build tables.
#[derive(clap::Args, Clone)]
struct TableArgs {
    /// Build only these tables (comma-separated)
    #[arg(long, value_enum, value_delimiter = ',')]
    only: Vec<TableKind>,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "deepsight-manifest")]
#[command(about = "Derives the deepsight.gg definition tables from a Destiny 2 manifest snapshot")]
#[command(long_about = "\
Derives the deepsight.gg definition tables from a Destiny 2 manifest snapshot

The snapshot is a directory of manifest components, one JSON file each,
named after the component:

  $DEEPSIGHT_PATH/
  ├── DestinyInventoryItemDefinition.json
  ├── DestinyActivityDefinition.json
  ├── ...
  ├── .v                       # manifest version string
  └── activities.json          # live activities (optional)

Tables are written to <output_dir>/definitions:

  docs/definitions/
  ├── DeepsightMomentDefinition.json
  ├── DeepsightCollectionsDefinition.json
  ├── ...
  ├── Enums.d.ts
  └── manifest.json            # table versions, written by bump-versions

Environment variables are also read from .env in the working directory.

Run 'deepsight-manifest gen-config' to generate a documented deepsight.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Manifest snapshot directory
    #[arg(long, env = "DEEPSIGHT_PATH", global = true)]
    snapshot: Option<PathBuf>,

    /// Target environment: dev tolerates unmapped assets and versions against a local hash cache
    #[arg(
        long,
        env = "DEEPSIGHT_ENVIRONMENT",
        value_enum,
        default_value_t = Environment::Prod,
        global = true
    )]
    environment: Environment,

    /// Port for the development server (overrides server.port)
    #[arg(long, env = "PORT", global = true)]
    port: Option<u16>,

    /// Prefix for image URLs served by the app itself
    #[arg(long, env = "HOSTNAME", global = true)]
    hostname: Option<String>,

    /// Directory containing deepsight.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy static files and build the definition tables
    Static(TableArgs),
    /// Build, then rebuild whenever static files or the snapshot change
    Watch(TableArgs),
    /// Serve the output directory
    Serve,
    /// Remove the output directory
    Clean,
    /// Bump the versions of tables whose content changed
    BumpVersions,
    /// Drop item hashes the app never refers to from Enums.d.ts
    PruneEnums,
    /// Print a stock deepsight.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = config::load_config(&cli.root)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    init_thread_pool(&config.processing);

    match &cli.command {
        Command::Static(args) => {
            let build_settings = settings(&cli, &config);
            let snapshot = cli.snapshot.as_deref();
            let report = pipeline::build_static(&config, build_settings, snapshot, &args.only)?;
            output::print_build_report(&report);
        }
        Command::Watch(args) => {
            let snapshot = cli.snapshot.clone().ok_or(PipelineError::MissingSnapshot)?;
            let watched = [PathBuf::from(&config.paths.static_dir), snapshot.clone()];
            let mut rebuild = |_changed: &[PathBuf]| {
                let build_settings = settings(&cli, &config);
                match pipeline::build_static(&config, build_settings, Some(&snapshot), &args.only) {
                    Ok(report) => output::print_build_report(&report),
                    Err(error) => log::error!("Build failed: {error}"),
                }
            };
            rebuild(&[]);
            watch::watch(&watched, Duration::from_millis(config.watch.debounce_ms), rebuild)?;
        }
        Command::Serve => {
            serve::serve(Path::new(&config.paths.output_dir), config.server.port)?;
        }
        Command::Clean => {
            let removed = pipeline::clean(&config)?;
            output::print_clean(Path::new(&config.paths.output_dir), removed);
        }
        Command::BumpVersions => {
            let manifest_version = match &cli.snapshot {
                Some(snapshot) => Manifest::open(snapshot).version()?,
                None => {
                    log::warn!(
                        "{} is not set, Destiny2/Manifest version not recorded",
                        pipeline::SNAPSHOT_ENV
                    );
                    None
                }
            };
            let bumper = VersionBumper::from_config(&config, cli.environment, chrono::Utc::now());
            let report = bumper.run(manifest_version.as_deref())?;
            output::print_bump_report(&report);
        }
        Command::PruneEnums => {
            let build_settings = settings(&cli, &config);
            let report = pipeline::prune_enums(&config, build_settings, cli.snapshot.as_deref())?;
            output::print_prune_report(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn settings(cli: &Cli, config: &BuildConfig) -> BuildSettings {
    pipeline::build_settings(config, cli.environment, cli.hostname.clone())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
