mod db;
mod lookup;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tapsearch_core::{FallbackPolicy, SearchMode};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tapsearch")]
#[command(about = "tapsearch command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Find the restaurant nearest a point through the Query Service
    Search {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// full or optimized (defaults to `TAPSEARCH_CLIENT_MODE`)
        #[arg(long)]
        mode: Option<SearchMode>,
        /// fail or mock (defaults to `TAPSEARCH_CLIENT_FALLBACK`)
        #[arg(long)]
        fallback: Option<FallbackPolicy>,
        /// Print the raw selection as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch one building footprint as GeoJSON
    Building {
        /// OSM building id, e.g. way/1081064846
        id: String,
    },
    /// List restaurants by rating
    List {
        /// Case-insensitive name substring
        #[arg(long)]
        name: Option<String>,
    },
    /// Check that the Query Service is up
    Health,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
    /// Upsert buildings and restaurants from a YAML dataset
    Seed {
        /// Dataset file (defaults to `TAPSEARCH_DATASET_PATH`)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Db { command }) => {
            let config = tapsearch_core::load_app_config()?;
            let pool = db::connect(&config).await?;
            match command {
                DbCommands::Migrate => db::run_migrate(&pool).await?,
                DbCommands::Ping => db::run_ping(&pool).await?,
                DbCommands::Seed { file } => {
                    let path = file.unwrap_or_else(|| config.dataset_path.clone());
                    db::run_seed(&pool, &path).await?;
                }
            }
        }
        Some(Commands::Search {
            lat,
            lng,
            mode,
            fallback,
            json,
        }) => {
            let mut config = tapsearch_core::load_client_config()?;
            if let Some(mode) = mode {
                config.mode = mode;
            }
            if let Some(fallback) = fallback {
                config.fallback = fallback;
            }
            lookup::run_search(&config, lat, lng, json).await?;
        }
        Some(Commands::Building { id }) => {
            let config = tapsearch_core::load_client_config()?;
            lookup::run_building(&config, &id).await?;
        }
        Some(Commands::List { name }) => {
            let config = tapsearch_core::load_client_config()?;
            lookup::run_list(&config, name.as_deref()).await?;
        }
        Some(Commands::Health) => {
            let config = tapsearch_core::load_client_config()?;
            lookup::run_health(&config).await?;
        }
        None => println!("no command given; try `tapsearch --help`"),
    }

    Ok(())
}
