use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for sparkify.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (SPARKIFY_* prefix)
/// 3. Config file (~/.config/sparkify/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite warehouse.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: SPARKIFY_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/sparkify/sparkify.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Root directory of the song metadata files.
    #[serde(default = "default_song_data_root")]
    pub song_data_root: PathBuf,

    /// Root directory of the event log files.
    #[serde(default = "default_log_data_root")]
    pub log_data_root: PathBuf,

    /// Abort the whole run on the first file that fails to load instead of
    /// recording the failure and moving on.
    #[serde(default)]
    pub fail_fast: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            song_data_root: default_song_data_root(),
            log_data_root: default_log_data_root(),
            fail_fast: false,
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let mut builder = file_layer(&config_file_path())?;

        let env_opts = env::Options::with_top_level("sparkify");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration from `config_path` alone, ignoring the environment.
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_from_file(config_path: &Path) -> Result<Self> {
        let mut builder = file_layer(config_path)?;
        let config: Self = builder.build().context("Failed to build configuration")?;
        Ok(config)
    }
}

/// Built-in defaults with the config file, when present, layered on top.
fn file_layer(config_path: &Path) -> Result<Confygery> {
    let mut builder = Confygery::new().context("Failed to create config builder")?;
    builder
        .add_struct(&Config::default())
        .context("Failed to add default configuration")?;

    if config_path.exists() {
        let path_str = config_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
        builder
            .add_file(path_str)
            .context("Failed to load config file")?;
    }

    Ok(builder)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sparkify")
        .join("sparkify.db")
}

fn default_song_data_root() -> PathBuf {
    PathBuf::from("data").join("song_data")
}

fn default_log_data_root() -> PathBuf {
    PathBuf::from("data").join("log_data")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/sparkify/config.toml
/// - macOS: ~/Library/Application Support/sparkify/config.toml
/// - Windows: %APPDATA%\sparkify\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sparkify")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Sparkify Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (SPARKIFY_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the SQLite warehouse holding the songs, artists, users, time and
# songplays tables
#
# Can also be set via:
# - CLI: sparkify --db /custom/path.db
# - Environment: SPARKIFY_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/sparkify.db"

# Input roots, searched recursively for *.json files
song_data_root = "data/song_data"
log_data_root = "data/log_data"

# Stop at the first file that fails to load
fail_fast = false
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
