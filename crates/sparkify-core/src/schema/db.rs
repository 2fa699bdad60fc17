use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::time::START_TIME_FORMAT;
use crate::model::{format_start_time, Artist, Song, SongMatch, SongPlay, TimeRow, User};

use super::migrations::MIGRATIONS;
use super::tables::Table;

/// Point lookup of a catalog song by the attributes a play event carries.
///
/// Matching is exact: title, artist name and duration must all be equal.
pub trait SongLookup {
    fn find_song_match(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongMatch>>;
}

/// Row counts of every table, for end-of-run summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub songplays: u64,
    pub users: u64,
    pub songs: u64,
    pub artists: u64,
    pub time: u64,
}

impl TableCounts {
    #[must_use]
    pub const fn get(&self, table: Table) -> u64 {
        match table {
            Table::Songplays => self.songplays,
            Table::Users => self.users,
            Table::Songs => self.songs,
            Table::Artists => self.artists,
            Table::Time => self.time,
        }
    }
}

/// A database connection with load and lookup methods for the star schema.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| Error::Connection {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Open an existing database without write access. Migrations are not
    /// applied and a missing file is a [`Error::Connection`], never created.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
            |source| Error::Connection {
                path: path.to_path_buf(),
                source,
            },
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }

    /// Drop every star-schema table and recreate it empty.
    pub fn reset(&self) -> Result<()> {
        log::warn!("Dropping and recreating all tables");
        for table in Table::ALL {
            self.conn
                .execute_batch(&format!("DROP TABLE IF EXISTS {}", table.name()))?;
        }
        self.conn.execute("DELETE FROM schema_migrations", [])?;
        self.apply_migrations()
    }

    /// Run `f` inside a transaction, committing only if it succeeds.
    ///
    /// An error from `f` rolls back every statement it executed.
    pub fn in_transaction<T, E>(
        &self,
        f: impl FnOnce(&Self) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<Error>,
    {
        let tx = self.conn.unchecked_transaction().map_err(Error::from)?;
        let value = f(self)?;
        tx.commit().map_err(Error::from)?;
        Ok(value)
    }

    fn execute_insert(&self, table: Table, params: impl rusqlite::Params) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(&table.insert_sql())?;
        stmt.execute(params)
            .map_err(|e| Error::on_table(table.name(), e))
    }
}

// Dimension and fact loads
impl Database {
    /// Insert a song; an existing `song_id` is left untouched.
    ///
    /// Returns `true` if a row was written.
    pub fn insert_song(&self, song: &Song) -> Result<bool> {
        let changed = self.execute_insert(
            Table::Songs,
            rusqlite::params![
                song.song_id,
                song.title,
                song.artist_id,
                song.year,
                song.duration,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Insert an artist; an existing `artist_id` is left untouched.
    pub fn insert_artist(&self, artist: &Artist) -> Result<bool> {
        let changed = self.execute_insert(
            Table::Artists,
            rusqlite::params![
                artist.artist_id,
                artist.name,
                artist.location,
                artist.latitude,
                artist.longitude,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Insert a time row; an existing `start_time` is left untouched.
    pub fn insert_time(&self, time: &TimeRow) -> Result<bool> {
        let changed = self.execute_insert(
            Table::Time,
            rusqlite::params![
                format_start_time(&time.start_time),
                time.hour,
                time.day,
                time.week,
                time.month,
                time.year,
                time.weekday,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Insert a user, or overwrite the subscription level of an existing one.
    pub fn upsert_user(&self, user: &User) -> Result<bool> {
        let changed = self.execute_insert(
            Table::Users,
            rusqlite::params![
                user.user_id,
                user.first_name,
                user.last_name,
                user.gender,
                user.level,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Append a song-play fact and return its surrogate id.
    pub fn insert_songplay(&self, play: &SongPlay) -> Result<i64> {
        self.execute_insert(
            Table::Songplays,
            rusqlite::params![
                format_start_time(&play.start_time),
                play.user_id,
                play.level,
                play.song_id,
                play.artist_id,
                play.session_id,
                play.location,
                play.user_agent,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl SongLookup for Database {
    fn find_song_match(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongMatch>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT songs.song_id, artists.artist_id
             FROM songs
             JOIN artists ON songs.artist_id = artists.artist_id
             WHERE songs.title = ?1
               AND artists.name = ?2
               AND songs.duration = ?3
             ORDER BY songs.song_id
             LIMIT 1",
        )?;

        let found = stmt
            .query_row(rusqlite::params![title, artist_name, duration], |row| {
                Ok(SongMatch {
                    song_id: row.get(0)?,
                    artist_id: row.get(1)?,
                })
            })
            .optional()?;

        Ok(found)
    }
}

// Read-back queries
impl Database {
    /// Number of rows currently in `table`.
    pub fn count(&self, table: Table) -> Result<u64> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    /// Row counts for every table.
    pub fn table_counts(&self) -> Result<TableCounts> {
        Ok(TableCounts {
            songplays: self.count(Table::Songplays)?,
            users: self.count(Table::Users)?,
            songs: self.count(Table::Songs)?,
            artists: self.count(Table::Artists)?,
            time: self.count(Table::Time)?,
        })
    }

    pub fn get_song(&self, song_id: &str) -> Result<Option<Song>> {
        let song = self
            .conn
            .query_row(
                "SELECT song_id, title, artist_id, year, duration FROM songs WHERE song_id = ?1",
                [song_id],
                |row| {
                    Ok(Song {
                        song_id: row.get(0)?,
                        title: row.get(1)?,
                        artist_id: row.get(2)?,
                        year: row.get(3)?,
                        duration: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(song)
    }

    pub fn get_artist(&self, artist_id: &str) -> Result<Option<Artist>> {
        let artist = self
            .conn
            .query_row(
                "SELECT artist_id, name, location, latitude, longitude
                 FROM artists WHERE artist_id = ?1",
                [artist_id],
                |row| {
                    Ok(Artist {
                        artist_id: row.get(0)?,
                        name: row.get(1)?,
                        location: row.get(2)?,
                        latitude: row.get(3)?,
                        longitude: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(artist)
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT user_id, first_name, last_name, gender, level
                 FROM users WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(User {
                        user_id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        gender: row.get(3)?,
                        level: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// All song-play facts in insertion order.
    pub fn list_songplays(&self) -> Result<Vec<SongPlay>> {
        let mut stmt = self.conn.prepare(
            "SELECT songplay_id, start_time, user_id, level, song_id, artist_id,
                    session_id, location, user_agent
             FROM songplays
             ORDER BY songplay_id",
        )?;

        let plays = stmt
            .query_map([], Self::row_to_songplay)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(plays)
    }

    fn row_to_songplay(row: &rusqlite::Row) -> rusqlite::Result<SongPlay> {
        let start_time_str: String = row.get(1)?;
        let start_time = chrono::NaiveDateTime::parse_from_str(&start_time_str, START_TIME_FORMAT)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(SongPlay {
            songplay_id: row.get(0)?,
            start_time,
            user_id: row.get(2)?,
            level: row.get(3)?,
            song_id: row.get(4)?,
            artist_id: row.get(5)?,
            session_id: row.get(6)?,
            location: row.get(7)?,
            user_agent: row.get(8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_play(ts: i64) -> SongPlay {
        SongPlay {
            songplay_id: None,
            start_time: TimeRow::start_time_from_millis(ts).unwrap(),
            user_id: 10,
            level: "free".to_string(),
            song_id: None,
            artist_id: None,
            session_id: 5,
            location: "LA".to_string(),
            user_agent: "UA".to_string(),
        }
    }

    fn sample_user(level: &str) -> User {
        User {
            user_id: 10,
            first_name: "Jo".to_string(),
            last_name: "Do".to_string(),
            gender: "F".to_string(),
            level: level.to_string(),
        }
    }

    #[test]
    fn test_database_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(db.table_counts().unwrap(), TableCounts::default());
    }

    #[test]
    fn test_open_unreachable_path_is_connection_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("nested").join("db.sqlite");
        let err = Database::open(&path).unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }

    #[test]
    fn test_open_read_only_missing_file_is_not_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.db");
        let err = Database::open_read_only(&path).unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_read_only_reads_counts_and_rejects_writes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sparkify.db");
        {
            let db = Database::open(&path).unwrap();
            db.insert_song(&Song::new("S1", "T", "A1", 1.0)).unwrap();
        }

        let db = Database::open_read_only(&path).unwrap();
        assert_eq!(db.table_counts().unwrap().songs, 1);
        assert!(db.insert_song(&Song::new("S2", "T", "A1", 1.0)).is_err());
    }

    #[test]
    fn test_song_first_write_wins() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.insert_song(&Song::new("S1", "First", "A1", 1.0)).unwrap());
        assert!(!db.insert_song(&Song::new("S1", "Second", "A1", 2.0)).unwrap());

        let song = db.get_song("S1").unwrap().unwrap();
        assert_eq!(song.title, "First");
        assert_eq!(db.count(Table::Songs).unwrap(), 1);
    }

    #[test]
    fn test_artist_first_write_wins() {
        let db = Database::open_in_memory().unwrap();
        db.insert_artist(&Artist::new("A1", "First")).unwrap();
        db.insert_artist(&Artist::new("A1", "Second").with_location("Paris"))
            .unwrap();

        let artist = db.get_artist("A1").unwrap().unwrap();
        assert_eq!(artist.name, "First");
        assert!(artist.location.is_none());
    }

    #[test]
    fn test_time_dedup_on_key() {
        let db = Database::open_in_memory().unwrap();
        let row = TimeRow::from_millis(1_541_121_934_796).unwrap();
        assert!(db.insert_time(&row).unwrap());
        assert!(!db.insert_time(&row).unwrap());
        assert_eq!(db.count(Table::Time).unwrap(), 1);
    }

    #[test]
    fn test_user_upsert_overwrites_level_only() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_user(&sample_user("free")).unwrap();

        let mut renamed = sample_user("paid");
        renamed.first_name = "Joanna".to_string();
        db.upsert_user(&renamed).unwrap();

        let user = db.get_user(10).unwrap().unwrap();
        assert_eq!(user.level, "paid");
        assert_eq!(user.first_name, "Jo");
        assert_eq!(db.count(Table::Users).unwrap(), 1);
    }

    #[test]
    fn test_songplay_always_appends() {
        let db = Database::open_in_memory().unwrap();
        let first = db.insert_songplay(&sample_play(1_541_121_934_796)).unwrap();
        let second = db.insert_songplay(&sample_play(1_541_121_934_796)).unwrap();
        assert_ne!(first, second);

        let plays = db.list_songplays().unwrap();
        assert_eq!(plays.len(), 2);
        assert_eq!(plays[0].songplay_id, Some(first));
        assert_eq!(plays[0].start_time, sample_play(1_541_121_934_796).start_time);
    }

    #[test]
    fn test_find_song_match_is_exact() {
        let db = Database::open_in_memory().unwrap();
        db.insert_song(&Song::new("S1", "T", "A1", 210.5)).unwrap();
        db.insert_artist(&Artist::new("A1", "N")).unwrap();

        let found = db.find_song_match("T", "N", 210.5).unwrap();
        assert_eq!(
            found,
            Some(SongMatch {
                song_id: "S1".to_string(),
                artist_id: "A1".to_string(),
            })
        );

        assert!(db.find_song_match("T", "N", 210.50001).unwrap().is_none());
        assert!(db.find_song_match("t", "N", 210.5).unwrap().is_none());
        assert!(db.find_song_match("T", "n", 210.5).unwrap().is_none());
    }

    #[test]
    fn test_find_song_match_prefers_lowest_song_id() {
        let db = Database::open_in_memory().unwrap();
        db.insert_song(&Song::new("S2", "T", "A1", 210.5)).unwrap();
        db.insert_song(&Song::new("S1", "T", "A1", 210.5)).unwrap();
        db.insert_artist(&Artist::new("A1", "N")).unwrap();

        let found = db.find_song_match("T", "N", 210.5).unwrap().unwrap();
        assert_eq!(found.song_id, "S1");
    }

    #[test]
    fn test_find_song_match_requires_artist_row() {
        let db = Database::open_in_memory().unwrap();
        db.insert_song(&Song::new("S1", "T", "A1", 210.5)).unwrap();
        assert!(db.find_song_match("T", "N", 210.5).unwrap().is_none());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let result: Result<()> = db.in_transaction(|db| {
            db.insert_song(&Song::new("S1", "T", "A1", 1.0))?;
            Err(Error::InvalidData("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(db.count(Table::Songs).unwrap(), 0);

        db.in_transaction(|db| db.insert_song(&Song::new("S1", "T", "A1", 1.0)))
            .unwrap();
        assert_eq!(db.count(Table::Songs).unwrap(), 1);
    }

    #[test]
    fn test_reset_empties_tables() {
        let db = Database::open_in_memory().unwrap();
        db.insert_song(&Song::new("S1", "T", "A1", 1.0)).unwrap();
        db.upsert_user(&sample_user("free")).unwrap();

        db.reset().unwrap();

        assert_eq!(db.table_counts().unwrap(), TableCounts::default());
        db.insert_song(&Song::new("S1", "T", "A1", 1.0)).unwrap();
        assert_eq!(db.count(Table::Songs).unwrap(), 1);
    }

    #[test]
    fn test_not_null_violation_is_constraint_error() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .conn()
            .execute(
                "INSERT INTO songs (song_id, title, artist_id, duration) VALUES ('S1', NULL, 'A1', 1.0)",
                [],
            )
            .map_err(|e| Error::on_table("songs", e))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ConstraintViolation { table: "songs", .. }
        ));
    }
}
