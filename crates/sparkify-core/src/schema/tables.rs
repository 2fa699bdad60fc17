//! Statement registry for the star schema.
//!
//! Each [`Table`] knows its columns, its key and the [`ConflictPolicy`]
//! applied when a row with an existing key is loaded. Insert statements are
//! rendered from that description, so the policy lives next to the table
//! rather than in free-standing SQL strings.

use std::fmt;

/// What happens when an inserted row collides with an existing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Keep the existing row (first write wins).
    Ignore,
    /// Overwrite only the listed columns with the incoming values.
    UpdateColumns(&'static [&'static str]),
    /// Surrogate-keyed table; every insert appends a new row.
    Append,
}

/// The five tables of the song-play star schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Songs,
    Artists,
    Users,
    Time,
    Songplays,
}

impl Table {
    /// All tables, dimensions first.
    pub const ALL: [Self; 5] = [
        Self::Songs,
        Self::Artists,
        Self::Users,
        Self::Time,
        Self::Songplays,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Songs => "songs",
            Self::Artists => "artists",
            Self::Users => "users",
            Self::Time => "time",
            Self::Songplays => "songplays",
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Songs => "song_id",
            Self::Artists => "artist_id",
            Self::Users => "user_id",
            Self::Time => "start_time",
            Self::Songplays => "songplay_id",
        }
    }

    /// Columns supplied on insert, in parameter order.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Songs => &["song_id", "title", "artist_id", "year", "duration"],
            Self::Artists => &["artist_id", "name", "location", "latitude", "longitude"],
            Self::Users => &["user_id", "first_name", "last_name", "gender", "level"],
            Self::Time => &[
                "start_time",
                "hour",
                "day",
                "week",
                "month",
                "year",
                "weekday",
            ],
            Self::Songplays => &[
                "start_time",
                "user_id",
                "level",
                "song_id",
                "artist_id",
                "session_id",
                "location",
                "user_agent",
            ],
        }
    }

    #[must_use]
    pub const fn conflict_policy(self) -> ConflictPolicy {
        match self {
            Self::Songs | Self::Artists | Self::Time => ConflictPolicy::Ignore,
            Self::Users => ConflictPolicy::UpdateColumns(&["level"]),
            Self::Songplays => ConflictPolicy::Append,
        }
    }

    /// Render the parameterised insert statement for this table.
    #[must_use]
    pub fn insert_sql(self) -> String {
        let columns = self.columns();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name(),
            columns.join(", "),
            placeholders.join(", ")
        );

        let on_conflict = match self.conflict_policy() {
            ConflictPolicy::Ignore => format!(" ON CONFLICT ({}) DO NOTHING", self.key()),
            ConflictPolicy::UpdateColumns(updated) => {
                let assignments: Vec<String> = updated
                    .iter()
                    .map(|c| format!("{c} = excluded.{c}"))
                    .collect();
                format!(
                    " ON CONFLICT ({}) DO UPDATE SET {}",
                    self.key(),
                    assignments.join(", ")
                )
            }
            ConflictPolicy::Append => String::new(),
        };

        insert + &on_conflict
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policies() {
        assert_eq!(Table::Songs.conflict_policy(), ConflictPolicy::Ignore);
        assert_eq!(Table::Artists.conflict_policy(), ConflictPolicy::Ignore);
        assert_eq!(Table::Time.conflict_policy(), ConflictPolicy::Ignore);
        assert_eq!(
            Table::Users.conflict_policy(),
            ConflictPolicy::UpdateColumns(&["level"])
        );
        assert_eq!(Table::Songplays.conflict_policy(), ConflictPolicy::Append);
    }

    #[test]
    fn test_ignore_sql() {
        assert_eq!(
            Table::Songs.insert_sql(),
            "INSERT INTO songs (song_id, title, artist_id, year, duration) \
             VALUES (?1, ?2, ?3, ?4, ?5) ON CONFLICT (song_id) DO NOTHING"
        );
    }

    #[test]
    fn test_upsert_sql_updates_level_only() {
        let sql = Table::Users.insert_sql();
        assert!(sql.ends_with("ON CONFLICT (user_id) DO UPDATE SET level = excluded.level"));
    }

    #[test]
    fn test_songplays_has_no_conflict_clause() {
        let sql = Table::Songplays.insert_sql();
        assert!(!sql.contains("ON CONFLICT"));
        assert!(sql.contains("?8"));
        assert!(!sql.contains("songplay_id"));
    }
}
