use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zipdist::DistanceUnit;

mod commands;

use commands::StoreOptions;

/// Postal code distance CLI tool
#[derive(Parser)]
#[command(name = "zipdist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// GeoNames dataset file (.csv, .txt or .tsv)
    #[arg(long, env = "ZIPDIST_DATASET", global = true)]
    dataset: Option<PathBuf>,

    /// SQLite database built by `zipdist import`
    #[arg(long, env = "ZIPDIST_DATABASE", global = true)]
    database: Option<PathBuf>,

    /// Maximum locations in cache
    #[arg(
        short,
        long,
        env = "ZIPDIST_CACHE_SIZE",
        default_value = "10000",
        global = true
    )]
    cache_size: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Distances from one postal code to one or more others
    Distance {
        /// Origin postal code
        #[arg(long)]
        origin: String,

        /// Destination postal codes
        #[arg(long, num_args = 1.., required = true)]
        to: Vec<String>,

        /// Unit: km, miles, meters or feet
        #[arg(short, long, default_value = "km")]
        unit: DistanceUnit,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Distances for origin/destination pairs from a CSV file
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Output file (defaults to <input>_distances.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for the origin postal code
        #[arg(long, default_value = "origin")]
        origin_col: String,

        /// Column name for the destination postal code
        #[arg(long, default_value = "destination")]
        destination_col: String,

        /// Unit: km, miles, meters or feet
        #[arg(short, long, default_value = "km")]
        unit: DistanceUnit,
    },

    /// Show a single postal code
    Lookup {
        /// Postal code, e.g. 99509
        code: String,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Load a dataset into the SQLite database given by --database
    Import {
        /// GeoNames dataset file (.csv, .txt or .tsv)
        dataset: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let options = StoreOptions {
        dataset: cli.dataset,
        database: cli.database,
        cache_size: cli.cache_size,
    };

    match cli.command {
        Commands::Distance {
            origin,
            to,
            unit,
            json,
        } => commands::distance::run(&options, origin, to, unit, json).await,
        Commands::Batch {
            input,
            output,
            origin_col,
            destination_col,
            unit,
        } => {
            commands::batch::run(&options, input, output, origin_col, destination_col, unit).await
        }
        Commands::Lookup { code, json } => commands::lookup::run(&options, &code, json).await,
        Commands::Import { dataset } => commands::import::run(&options, dataset).await,
    }
}
