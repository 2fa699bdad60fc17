use serde::{Deserialize, Serialize};

/// A row of the `songs` dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,

    /// Release year. Source data uses `0` for "unknown", stored as `None`.
    pub year: Option<i32>,

    /// Track length in seconds.
    pub duration: f64,
}

impl Song {
    #[must_use]
    pub fn new(
        song_id: impl Into<String>,
        title: impl Into<String>,
        artist_id: impl Into<String>,
        duration: f64,
    ) -> Self {
        Self {
            song_id: song_id.into(),
            title: title.into(),
            artist_id: artist_id.into(),
            year: None,
            duration,
        }
    }

    /// Set the release year, treating the `0` sentinel as unknown.
    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = (year != 0).then_some(year);
        self
    }
}
