//! ETL stages for sparkify.
//!
//! Song metadata files are loaded first and produce the song catalog
//! (songs + artists). Event logs are loaded second: playback events become
//! time, user and song-play rows, with each play resolved against the
//! catalog.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod loader;
pub mod pipeline;
pub mod song;
pub mod walker;

pub use catalog::CatalogLoaded;
pub use config::Config;
pub use error::{EtlError, EtlResult};
pub use events::{LogExtractor, LogRows, PlayEvent};
pub use loader::{LoadStats, Loader};
pub use pipeline::{FileFailure, Phase, PhaseReport, Pipeline, ProgressEvent, RunReport};
pub use song::{extract_song_file, SongRows};
pub use walker::discover_files;
