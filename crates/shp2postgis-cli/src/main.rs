//! Command-line interface for `shp2postgis`.
//!
//! Replaces a PostGIS table with the contents of an ESRI Shapefile using the
//! [`shp2postgis_core`] library. Connection settings come from the `DB_HOST`,
//! `DB_PORT`, `DB_NAME`, `DB_USER` and `DB_PASSWORD` environment variables,
//! optionally read from a `.env` file.
//!
//! # Available Commands
//!
//! - `load` - Drop, create and load the destination table, then verify it
//! - `inspect` - Show a shapefile's header and feature count
//! - `check` - Connect to the database and report the PostGIS version

mod display;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{Level, debug, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use shp2postgis_core::config::{self, ConnectionConfig};
use shp2postgis_core::db::PostgisClient;
use shp2postgis_core::identifiers::{Identifier, TableName};
use shp2postgis_core::ogr2ogr::Ogr2Ogr;
use shp2postgis_core::types::{
    DEFAULT_GEOMETRY_COLUMN, DEFAULT_OGR2OGR, DEFAULT_SHAPEFILE, DEFAULT_SRID, DEFAULT_TABLE,
    GeometryType, LoadOptions, Verify,
};
use shp2postgis_core::{Shp2PostgisError, pipeline, shapefile};

#[derive(Parser)]
#[command(
    name = "shp2postgis",
    version,
    about = "Load an ESRI Shapefile into a PostGIS table",
    long_about = "shp2postgis replaces a PostGIS table with the contents of a Shapefile.\n\
                  The table is dropped, recreated with a typed geometry column, loaded with\n\
                  ogr2ogr and its row count checked against the shapefile."
)]
/// Command-line arguments and options for the `shp2postgis` CLI.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    /// Read environment variables from this file instead of `.env`.
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the `shp2postgis` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Replaces a table with the contents of a shapefile.
    ///
    /// Drops the table if it exists, creates it with a serial `id` and a
    /// geometry column, loads the shapefile with ogr2ogr and verifies the
    /// row count.
    Load(LoadArgs),

    /// Displays the header and feature count of a shapefile.
    Inspect {
        /// Path to the `.shp` file.
        #[arg(value_name = "SHAPEFILE")]
        shapefile: PathBuf,
    },

    /// Connects to the database and prints the PostGIS version.
    Check,
}

#[derive(clap::Args)]
struct LoadArgs {
    /// Path to the `.shp` file.
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_SHAPEFILE)]
    shapefile: PathBuf,

    /// Destination table, optionally schema-qualified (`schema.table`).
    #[arg(short, long, value_name = "NAME", default_value = DEFAULT_TABLE)]
    table: TableName,

    /// Name of the geometry column.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_GEOMETRY_COLUMN)]
    geometry_column: Identifier,

    /// Geometry type of the column (e.g., `MultiPolygon`, `Point`).
    #[arg(long, value_name = "TYPE", default_value = "MultiPolygon")]
    geometry_type: GeometryType,

    /// Target spatial reference; features are reprojected into it.
    #[arg(long, value_name = "SRID", default_value_t = DEFAULT_SRID)]
    srid: u32,

    /// ogr2ogr program name or path.
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_OGR2OGR)]
    ogr2ogr: String,

    /// How to check the table after loading.
    #[arg(long, value_enum, default_value_t = VerifyMode::MatchSource)]
    verify: VerifyMode,
}

/// Command-line spelling of [`Verify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum VerifyMode {
    /// Do not count rows.
    Skip,
    /// Count rows and print them.
    Report,
    /// Fail unless the row count equals the shapefile's feature count.
    MatchSource,
}

impl From<VerifyMode> for Verify {
    fn from(mode: VerifyMode) -> Self {
        match mode {
            VerifyMode::Skip => Verify::Skip,
            VerifyMode::Report => Verify::Report,
            VerifyMode::MatchSource => Verify::MatchSource,
        }
    }
}

impl From<LoadArgs> for LoadOptions {
    fn from(args: LoadArgs) -> Self {
        LoadOptions {
            shapefile: args.shapefile,
            table: args.table,
            geometry_column: args.geometry_column,
            geometry_type: args.geometry_type,
            srid: args.srid,
            verify: args.verify.into(),
        }
    }
}

/// Entry point for the `shp2postgis` command-line interface.
///
/// # Errors
///
/// Returns an error if the command fails or if the logging system cannot be
/// initialized. The process then exits with status 1.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity flags
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true) // Show module paths for better context
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    config::load_env_file(cli.env_file.as_deref()).map_err(|e| present(e.into()))?;

    match cli.command {
        Commands::Load(args) => {
            info!("Loading {} into {}", args.shapefile.display(), args.table);
            let program = args.ogr2ogr.clone();
            handle_load(&program, args.into()).await?;
        },
        Commands::Inspect { shapefile } => {
            info!("Inspecting {}", shapefile.display());
            handle_inspect(&shapefile)?;
        },
        Commands::Check => {
            handle_check().await?;
        },
    }

    Ok(())
}

async fn handle_load(program: &str, options: LoadOptions) -> Result<()> {
    debug!("Load options: {options:?}");
    let connection = ConnectionConfig::from_env().map_err(|e| present(e.into()))?;
    let mut store = PostgisClient::connect(&connection).await.map_err(present)?;
    let mut loader = Ogr2Ogr::new(program, connection);

    let report = pipeline::run_load(&mut store, &mut loader, &options)
        .await
        .map_err(present)?;

    display::display_load_report(&report);
    Ok(())
}

fn handle_inspect(path: &std::path::Path) -> Result<()> {
    let info = shapefile::inspect(path).map_err(|e| present(e.into()))?;
    display::display_shapefile_info(&info);
    Ok(())
}

async fn handle_check() -> Result<()> {
    let connection = ConnectionConfig::from_env().map_err(|e| present(e.into()))?;
    let client = PostgisClient::connect(&connection).await.map_err(present)?;
    let version = client.postgis_version().await.map_err(present)?;
    println!(
        "Connected to {}:{}/{} (PostGIS {version})",
        connection.host, connection.port, connection.dbname
    );
    Ok(())
}

/// Turns a library error into the message shown to the user, with a hint
/// line when one is available.
fn present(err: Shp2PostgisError) -> anyhow::Error {
    match err.recovery_suggestion() {
        Some(hint) => anyhow!("{}\n\nHint: {hint}", err.user_message()),
        None => anyhow!("{}", err.user_message()),
    }
}
