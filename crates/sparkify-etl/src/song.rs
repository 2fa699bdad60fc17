//! Song extractor: one metadata document per file, one song and one artist.

use serde::Deserialize;
use std::path::Path;

use sparkify_core::model::{Artist, Song};

use crate::error::{EtlError, EtlResult};

/// A song metadata document as found on disk. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct SongRecord {
    song_id: String,
    title: String,
    artist_id: String,
    artist_name: String,
    #[serde(default)]
    artist_location: Option<String>,
    #[serde(default)]
    artist_latitude: Option<f64>,
    #[serde(default)]
    artist_longitude: Option<f64>,
    #[serde(default)]
    year: Option<i32>,
    duration: f64,
}

/// Rows derived from one song file.
#[derive(Debug, Clone, PartialEq)]
pub struct SongRows {
    pub song: Song,
    pub artist: Artist,
}

impl From<SongRecord> for SongRows {
    fn from(record: SongRecord) -> Self {
        let song = Song {
            song_id: record.song_id,
            title: record.title,
            artist_id: record.artist_id.clone(),
            year: None,
            duration: record.duration,
        }
        .with_year(record.year.unwrap_or(0));

        let artist = Artist::new(record.artist_id, record.artist_name)
            .with_location(record.artist_location.unwrap_or_default())
            .with_coordinates(record.artist_latitude, record.artist_longitude);

        Self { song, artist }
    }
}

/// Parse a song metadata document.
pub fn parse_song_document(path: &Path, text: &str) -> EtlResult<SongRows> {
    let record: SongRecord =
        serde_json::from_str(text).map_err(|e| EtlError::parse(path, None, e.to_string()))?;
    Ok(record.into())
}

/// Read and parse the song file at `path`.
pub fn extract_song_file(path: &Path) -> EtlResult<SongRows> {
    let text = std::fs::read_to_string(path).map_err(|e| EtlError::io(path, e))?;
    parse_song_document(path, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"num_songs": 1, "artist_id": "ARD7TVE1187B99BFB1", "artist_latitude": null, "artist_longitude": null, "artist_location": "California - LA", "artist_name": "Casual", "song_id": "SOMZWCG12A8C13C480", "title": "I Didn't Mean To", "duration": 218.93179, "year": 0}"#;

    fn parse(text: &str) -> EtlResult<SongRows> {
        parse_song_document(Path::new("song.json"), text)
    }

    #[test]
    fn test_parse_song_document() {
        let rows = parse(SAMPLE).unwrap();
        assert_eq!(rows.song.song_id, "SOMZWCG12A8C13C480");
        assert_eq!(rows.song.title, "I Didn't Mean To");
        assert_eq!(rows.song.artist_id, "ARD7TVE1187B99BFB1");
        assert_eq!(rows.song.duration, 218.931_79);
        assert_eq!(rows.artist.name, "Casual");
        assert_eq!(rows.artist.location.as_deref(), Some("California - LA"));
        assert!(rows.artist.latitude.is_none());
    }

    #[test]
    fn test_normalizes_sentinels() {
        let rows = parse(
            r#"{"song_id":"S1","title":"T","artist_id":"A1","artist_name":"N","artist_location":"","artist_latitude":null,"artist_longitude":null,"year":0,"duration":210.5}"#,
        )
        .unwrap();
        assert_eq!(rows.song.year, None);
        assert_eq!(rows.artist.location, None);
    }

    #[test]
    fn test_keeps_real_year_and_coordinates() {
        let rows = parse(
            r#"{"song_id":"S1","title":"T","artist_id":"A1","artist_name":"N","artist_latitude":35.14968,"artist_longitude":-90.04892,"year":1969,"duration":1.0}"#,
        )
        .unwrap();
        assert_eq!(rows.song.year, Some(1969));
        assert_eq!(rows.artist.latitude, Some(35.149_68));
        assert_eq!(rows.artist.longitude, Some(-90.048_92));
        assert!(rows.artist.location.is_none());
    }

    #[test]
    fn test_missing_duration_is_parse_error() {
        let err = parse(r#"{"song_id":"S1","title":"T","artist_id":"A1","artist_name":"N"}"#)
            .unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(parse("{not json").unwrap_err().is_parse());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = extract_song_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, EtlError::Io { .. }));
    }
}
