use anyhow::Result;
use sparkify_etl::{config, Config};

/// Show the current effective configuration.
pub fn show_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================\n");

    let path = config::config_file_path();
    println!("Config file: {}", path.display());
    println!(
        "File exists: {}\n",
        if path.exists() { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!("  database_path: {}", config.database_path.display());
    println!("  song_data_root: {}", config.song_data_root.display());
    println!("  log_data_root: {}", config.log_data_root.display());
    println!("  fail_fast: {}", config.fail_fast);

    println!("\nPriority: CLI args > ENV vars (SPARKIFY_*) > Config file > Defaults");
}

/// Write the example config file if it doesn't exist yet.
pub fn init_config() -> Result<()> {
    let path = config::config_file_path();
    if config::ensure_config_file()? {
        println!("Created {}", path.display());
    } else {
        println!("Config file already exists: {}", path.display());
    }
    Ok(())
}
