//! Log extractor: playback events become time, user and song-play rows.
//!
//! A log file holds one JSON event per line. Only `NextSong` events are
//! kept. They are ordered by timestamp before any row is derived so that,
//! when the loader upserts users, the last write carries the most recent
//! subscription level.

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use sparkify_core::model::{SongPlay, TimeRow, User};
use sparkify_core::schema::SongLookup;

use crate::catalog::CatalogLoaded;
use crate::error::{EtlError, EtlResult};

/// Page value of a playback event.
pub const NEXT_SONG: &str = "NextSong";

/// One line of an event log. Every field is optional here; non-playback
/// events routinely omit or blank out most of them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    ts: Option<i64>,
    page: Option<String>,
    user_id: Option<Value>,
    first_name: Option<String>,
    last_name: Option<String>,
    gender: Option<String>,
    level: Option<String>,
    song: Option<String>,
    artist: Option<String>,
    length: Option<f64>,
    session_id: Option<i64>,
    location: Option<String>,
    user_agent: Option<String>,
}

/// A validated playback event.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayEvent {
    /// Epoch milliseconds.
    pub ts: i64,
    pub start_time: NaiveDateTime,
    pub user: User,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub length: Option<f64>,
    pub session_id: i64,
    pub location: String,
    pub user_agent: String,
}

/// Rows derived from one log file, in load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRows {
    pub times: Vec<TimeRow>,
    pub users: Vec<User>,
    pub songplays: Vec<SongPlay>,
}

fn user_id_from(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn required<T>(value: Option<T>, field: &str, path: &Path, line: usize) -> EtlResult<T> {
    value.ok_or_else(|| EtlError::parse(path, Some(line), format!("missing field `{field}`")))
}

fn is_playback(value: &Value) -> bool {
    value.get("page").and_then(Value::as_str) == Some(NEXT_SONG)
}

impl RawEvent {
    fn into_play_event(self, path: &Path, line: usize) -> EtlResult<PlayEvent> {
        let ts = required(self.ts, "ts", path, line)?;
        let start_time = TimeRow::start_time_from_millis(ts)
            .map_err(|e| EtlError::parse(path, Some(line), e.to_string()))?;
        let user_id = required(self.user_id.as_ref(), "userId", path, line)?;
        let user_id = user_id_from(user_id).ok_or_else(|| {
            EtlError::parse(path, Some(line), format!("invalid userId: {user_id}"))
        })?;

        let gender = required(self.gender, "gender", path, line)?;
        if gender.chars().count() != 1 {
            return Err(EtlError::parse(
                path,
                Some(line),
                format!("invalid gender: {gender:?}, expected a single character"),
            ));
        }

        let user = User {
            user_id,
            first_name: required(self.first_name, "firstName", path, line)?,
            last_name: required(self.last_name, "lastName", path, line)?,
            gender,
            level: required(self.level, "level", path, line)?,
        };

        Ok(PlayEvent {
            ts,
            start_time,
            user,
            song: self.song,
            artist: self.artist,
            length: self.length,
            session_id: required(self.session_id, "sessionId", path, line)?,
            location: required(self.location, "location", path, line)?,
            user_agent: required(self.user_agent, "userAgent", path, line)?,
        })
    }
}

/// Parse a line-delimited log, keeping only playback events, sorted by
/// timestamp. The sort is stable, so events sharing a timestamp keep their
/// file order.
///
/// Non-playback lines only need to be valid JSON; their fields are never
/// typed.
pub fn parse_play_events(path: &Path, text: &str) -> EtlResult<Vec<PlayEvent>> {
    let mut events = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(line)
            .map_err(|e| EtlError::parse(path, Some(line_no), e.to_string()))?;
        if !is_playback(&value) {
            continue;
        }
        let raw: RawEvent = serde_json::from_value(value)
            .map_err(|e| EtlError::parse(path, Some(line_no), e.to_string()))?;
        events.push(raw.into_play_event(path, line_no)?);
    }

    events.sort_by_key(|e| e.ts);
    Ok(events)
}

/// One time row per distinct timestamp, first occurrence wins.
pub fn time_rows(events: &[PlayEvent]) -> Vec<TimeRow> {
    let mut seen = HashSet::new();
    events
        .iter()
        .filter(|e| seen.insert(e.ts))
        .map(|e| TimeRow::from_start_time(e.start_time))
        .collect()
}

/// One user row per distinct user tuple.
///
/// Each tuple is placed at its *last* appearance, so for a user whose level
/// went free → paid → free the final upsert writes `free`.
pub fn user_rows(events: &[PlayEvent]) -> Vec<User> {
    let mut last_seen: HashMap<&User, usize> = HashMap::new();
    for (idx, event) in events.iter().enumerate() {
        last_seen.insert(&event.user, idx);
    }

    events
        .iter()
        .enumerate()
        .filter(|(idx, event)| last_seen.get(&event.user) == Some(idx))
        .map(|(_, event)| event.user.clone())
        .collect()
}

/// Strip any surrounding double quotes from a user-agent string.
fn clean_user_agent(agent: &str) -> String {
    agent.trim_matches('"').to_string()
}

/// Derives log rows, resolving plays against a loaded song catalog.
pub struct LogExtractor<'a, L: SongLookup + ?Sized> {
    lookup: &'a L,
    catalog: &'a CatalogLoaded,
}

impl<L: SongLookup + ?Sized> std::fmt::Debug for LogExtractor<'_, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogExtractor")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl<'a, L: SongLookup + ?Sized> LogExtractor<'a, L> {
    #[must_use]
    pub const fn new(lookup: &'a L, catalog: &'a CatalogLoaded) -> Self {
        Self { lookup, catalog }
    }

    /// Read the log file at `path` and derive its rows.
    pub fn extract_file(&self, path: &Path) -> EtlResult<LogRows> {
        let text = std::fs::read_to_string(path).map_err(|e| EtlError::io(path, e))?;
        let events = parse_play_events(path, &text)?;
        log::debug!(
            "{}: {} playback events",
            path.display(),
            events.len()
        );
        self.derive_rows(&events)
    }

    /// Derive rows from events already sorted by timestamp.
    pub fn derive_rows(&self, events: &[PlayEvent]) -> EtlResult<LogRows> {
        let songplays = events
            .iter()
            .map(|event| self.songplay(event))
            .collect::<EtlResult<Vec<_>>>()?;

        Ok(LogRows {
            times: time_rows(events),
            users: user_rows(events),
            songplays,
        })
    }

    fn songplay(&self, event: &PlayEvent) -> EtlResult<SongPlay> {
        let matched = match (&event.song, &event.artist, event.length) {
            (Some(song), Some(artist), Some(length)) => {
                self.lookup.find_song_match(song, artist, length)?
            }
            _ => None,
        };

        let play = SongPlay {
            songplay_id: None,
            start_time: event.start_time,
            user_id: event.user.user_id,
            level: event.user.level.clone(),
            song_id: None,
            artist_id: None,
            session_id: event.session_id,
            location: event.location.clone(),
            user_agent: clean_user_agent(&event.user_agent),
        };

        Ok(play.with_match(matched))
    }
}
