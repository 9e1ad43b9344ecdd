use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geoelev::catalog::DEFAULT_BASE_URL;
use geoelev::download::DEFAULT_TIMEOUT_SECS;

mod commands;

use commands::EngineOptions;

/// SRTM elevation data CLI tool
#[derive(Parser)]
#[command(name = "geoelev")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory for downloaded archives [default: ~/.geoelev]
    #[arg(short, long, env = "GEOELEV_CACHE_DIR", global = true)]
    cache_dir: Option<PathBuf>,

    /// Server publishing the SRTM1/ and SRTM3/ listings
    #[arg(
        short,
        long,
        env = "GEOELEV_BASE_URL",
        default_value = DEFAULT_BASE_URL,
        global = true
    )]
    base_url: String,

    /// HTTP request timeout in seconds
    #[arg(
        short,
        long,
        env = "GEOELEV_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        global = true
    )]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query elevation for a single coordinate
    Query {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add an elevation column to a CSV file of coordinates
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Output file [default: <input>_elevation.csv]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude
        #[arg(long, default_value = "lon")]
        lon_col: String,
    },

    /// Display information about an SRTM tile
    Info {
        /// Tile name (e.g., N35E138) or archive filename
        #[arg(required_unless_present_all = ["lat", "lon"])]
        tile: Option<String>,

        /// Specify tile by latitude instead of name
        #[arg(long, conflicts_with = "tile", requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Specify tile by longitude instead of name
        #[arg(long, conflicts_with = "tile", requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// List archives in the cache directory
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoelev=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let options = EngineOptions {
        cache_dir: cli.cache_dir,
        base_url: cli.base_url,
        timeout_secs: cli.timeout,
    };

    match cli.command {
        Commands::Query { lat, lon, json } => commands::query::run(&options, lat, lon, json),
        Commands::Batch {
            input,
            output,
            lat_col,
            lon_col,
        } => commands::batch::run(&options, input, output, lat_col, lon_col),
        Commands::Info { tile, lat, lon } => commands::info::run(&options, tile, lat, lon),
        Commands::List => commands::list::run(&options),
    }
}
