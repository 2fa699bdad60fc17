use anyhow::Result;
use std::path::Path;

use sparkify_core::schema::{Database, Table, TableCounts};

/// Print one line per table in fact-first order.
pub fn print_counts(counts: &TableCounts) {
    for table in [
        Table::Songplays,
        Table::Time,
        Table::Songs,
        Table::Artists,
        Table::Users,
    ] {
        println!(
            "{:10} - Records present in {} table",
            counts.get(table),
            table.name().to_uppercase()
        );
    }
}

/// Report table counts without creating or migrating the database.
pub fn show_status(db_path: &Path) -> Result<()> {
    println!("\nSparkify Status\n");
    println!("  Database: {}\n", db_path.display());

    if !db_path.exists() {
        println!("  No database found");
        println!("\n  Run `sparkify run` to create it and load the data");
        return Ok(());
    }

    let db = Database::open_read_only(db_path)?;
    let counts = db.table_counts()?;
    print_counts(&counts);

    if counts.songs == 0 {
        println!("\n  Run `sparkify run` to load the song catalog and event logs");
    }

    Ok(())
}
