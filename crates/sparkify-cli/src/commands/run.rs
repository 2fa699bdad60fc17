use anyhow::{Context, Result};

use sparkify_core::schema::Database;
use sparkify_etl::{Config, Pipeline, ProgressEvent};

use super::status::print_counts;

fn report_progress(event: &ProgressEvent<'_>) {
    match event {
        ProgressEvent::Discovered { root, total, .. } => {
            println!("{} files found in {}", total, root.display());
        }
        ProgressEvent::FileLoaded { index, total, .. } => {
            println!("{index}/{total} files processed.");
        }
        ProgressEvent::FileFailed {
            index,
            total,
            path,
            error,
            ..
        } => {
            eprintln!("{index}/{total} FAILED {}: {error}", path.display());
        }
    }
}

/// Load the song catalog and then the event logs, and print a summary.
pub fn run_load(config: &Config, reset: bool) -> Result<()> {
    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
    }

    let db = Database::open(&config.database_path)
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;

    if reset {
        db.reset().context("Failed to reset tables")?;
    }

    log::info!(
        "Loading songs from {} and logs from {}",
        config.song_data_root.display(),
        config.log_data_root.display()
    );

    let report = Pipeline::new(&db)
        .with_fail_fast(config.fail_fast)
        .run(
            &config.song_data_root,
            &config.log_data_root,
            &mut report_progress,
        )
        .context("Load aborted")?;

    println!();
    print_counts(&report.counts);

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        eprintln!("\n{} files failed to load:", failures.len());
        for failure in &failures {
            eprintln!("  {}: {}", failure.path.display(), failure.error);
        }
        anyhow::bail!("{} files failed to load", failures.len());
    }

    Ok(())
}
