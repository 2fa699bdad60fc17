//! Loader: applies extracted rows under each table's conflict policy.
//!
//! Rows are written one at a time in the order the extractor produced them,
//! and each input file is committed as a single transaction.

use std::collections::HashMap;
use std::fmt;

use sparkify_core::schema::{Database, Table};

use crate::error::EtlResult;
use crate::events::LogRows;
use crate::song::SongRows;

/// Rows written and rows absorbed by a conflict policy, per table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    written: HashMap<Table, u64>,
    skipped: HashMap<Table, u64>,
}

impl LoadStats {
    fn record(&mut self, table: Table, changed: bool) {
        let bucket = if changed {
            &mut self.written
        } else {
            &mut self.skipped
        };
        *bucket.entry(table).or_insert(0) += 1;
    }

    /// Rows inserted (or, for users, inserted or updated).
    pub fn written(&self, table: Table) -> u64 {
        self.written.get(&table).copied().unwrap_or(0)
    }

    /// Rows discarded because the key already existed.
    pub fn skipped(&self, table: Table) -> u64 {
        self.skipped.get(&table).copied().unwrap_or(0)
    }

    pub fn merge(&mut self, other: &Self) {
        for (table, n) in &other.written {
            *self.written.entry(*table).or_insert(0) += n;
        }
        for (table, n) in &other.skipped {
            *self.skipped.entry(*table).or_insert(0) += n;
        }
    }
}

impl fmt::Display for LoadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Table::ALL
            .iter()
            .filter(|t| self.written(**t) + self.skipped(**t) > 0)
            .map(|t| format!("{t}: {} written, {} skipped", self.written(*t), self.skipped(*t)))
            .collect();
        if parts.is_empty() {
            f.write_str("no rows")
        } else {
            f.write_str(&parts.join("; "))
        }
    }
}

/// Writes extracted rows into the warehouse.
#[derive(Debug)]
pub struct Loader<'db> {
    db: &'db Database,
}

impl<'db> Loader<'db> {
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Load the song and artist derived from one song file.
    pub fn load_song_rows(&self, rows: &SongRows) -> EtlResult<LoadStats> {
        self.db.in_transaction(|db| {
            let mut stats = LoadStats::default();
            stats.record(Table::Songs, db.insert_song(&rows.song)?);
            stats.record(Table::Artists, db.insert_artist(&rows.artist)?);
            Ok(stats)
        })
    }

    /// Load the time, user and song-play rows derived from one log file.
    pub fn load_log_rows(&self, rows: &LogRows) -> EtlResult<LoadStats> {
        self.db.in_transaction(|db| {
            let mut stats = LoadStats::default();
            for time in &rows.times {
                stats.record(Table::Time, db.insert_time(time)?);
            }
            for user in &rows.users {
                stats.record(Table::Users, db.upsert_user(user)?);
            }
            for play in &rows.songplays {
                db.insert_songplay(play)?;
                stats.record(Table::Songplays, true);
            }
            Ok(stats)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::parse_song_document;
    use sparkify_core::model::{SongPlay, TimeRow, User};
    use std::path::Path;

    fn song_rows(song_id: &str) -> SongRows {
        parse_song_document(
            Path::new("s.json"),
            &format!(
                r#"{{"song_id":"{song_id}","title":"T","artist_id":"A1","artist_name":"N","duration":1.0}}"#
            ),
        )
        .unwrap()
    }

    fn user(level: &str) -> User {
        User {
            user_id: 1,
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            gender: "M".to_string(),
            level: level.to_string(),
        }
    }

    #[test]
    fn test_load_song_rows_counts_conflicts() {
        let db = Database::open_in_memory().unwrap();
        let loader = Loader::new(&db);

        let first = loader.load_song_rows(&song_rows("S1")).unwrap();
        assert_eq!(first.written(Table::Songs), 1);
        assert_eq!(first.written(Table::Artists), 1);

        let second = loader.load_song_rows(&song_rows("S2")).unwrap();
        assert_eq!(second.written(Table::Songs), 1);
        assert_eq!(second.skipped(Table::Artists), 1);

        let mut total = first;
        total.merge(&second);
        assert_eq!(total.written(Table::Songs), 2);
        assert_eq!(total.written(Table::Artists), 1);
        assert_eq!(total.skipped(Table::Artists), 1);
    }

    #[test]
    fn test_load_log_rows_applies_users_in_order() {
        let db = Database::open_in_memory().unwrap();
        let start = TimeRow::start_time_from_millis(1_000).unwrap();
        let rows = LogRows {
            times: vec![TimeRow::from_start_time(start)],
            users: vec![user("free"), user("paid")],
            songplays: vec![SongPlay {
                songplay_id: None,
                start_time: start,
                user_id: 1,
                level: "paid".to_string(),
                song_id: None,
                artist_id: None,
                session_id: 1,
                location: "X".to_string(),
                user_agent: "Y".to_string(),
            }],
        };

        let stats = Loader::new(&db).load_log_rows(&rows).unwrap();
        assert_eq!(stats.written(Table::Users), 2);
        assert_eq!(stats.written(Table::Songplays), 1);
        assert_eq!(db.get_user(1).unwrap().unwrap().level, "paid");
        assert_eq!(db.count(Table::Time).unwrap(), 1);
    }

    #[test]
    fn test_display() {
        let mut stats = LoadStats::default();
        assert_eq!(stats.to_string(), "no rows");
        stats.record(Table::Songs, true);
        stats.record(Table::Songs, false);
        assert_eq!(stats.to_string(), "songs: 1 written, 1 skipped");
    }
}
