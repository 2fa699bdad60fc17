use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use sparkify_etl::Config;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "sparkify", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the database (default: ~/.local/share/sparkify/sparkify.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Root directory of the song metadata files (default: data/song_data)
    #[arg(long, global = true)]
    song_data: Option<PathBuf>,

    /// Root directory of the event log files (default: data/log_data)
    #[arg(long, global = true)]
    log_data: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Load the song catalog, then the event logs (the default)
    ///
    /// Every *.json file under the song root is loaded into the songs and
    /// artists tables. Only then are the event logs under the log root
    /// loaded: playback events become time, users and songplays rows, with
    /// each play matched against the catalog by title, artist and duration.
    ///
    /// Each file is committed on its own. A file that fails to parse is
    /// rolled back and reported at the end of the run.
    Run {
        /// Stop at the first file that fails to load
        #[arg(long)]
        fail_fast: bool,

        /// Drop and recreate all tables before loading
        #[arg(long)]
        reset: bool,
    },
    /// Show row counts for every table
    Status,
    /// Show or initialise the configuration file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write an example config file if none exists
    Init,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if let Some(root) = cli.song_data {
        config.song_data_root = root;
    }
    if let Some(root) = cli.log_data {
        config.log_data_root = root;
    }

    match cli.command.unwrap_or(Commands::Run {
        fail_fast: false,
        reset: false,
    }) {
        Commands::Run { fail_fast, reset } => {
            config.fail_fast |= fail_fast;
            commands::run_load(&config, reset)?;
        }
        Commands::Status => {
            commands::show_status(&config.database_path)?;
        }
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::show_config(&config),
            ConfigAction::Init => commands::init_config()?,
        },
    }

    Ok(())
}
