use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identifiers of the song/artist pair a play event resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

/// A row of the `songplays` fact table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongPlay {
    /// Surrogate key; `None` until the row has been inserted.
    pub songplay_id: Option<i64>,
    pub start_time: NaiveDateTime,
    pub user_id: i64,
    pub level: String,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: String,
    pub user_agent: String,
}

impl SongPlay {
    /// Attach the result of a catalog lookup. `None` leaves both ids empty.
    #[must_use]
    pub fn with_match(mut self, matched: Option<SongMatch>) -> Self {
        match matched {
            Some(m) => {
                self.song_id = Some(m.song_id);
                self.artist_id = Some(m.artist_id);
            }
            None => {
                self.song_id = None;
                self.artist_id = None;
            }
        }
        self
    }
}
