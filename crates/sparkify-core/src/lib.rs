//! Core data model for sparkify.
//!
//! This crate defines the song-play star schema (songs, artists, users,
//! time, songplays), the per-table conflict policies, the SQLite schema,
//! and the `Database` repository the ETL crate loads into.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod schema;

pub use error::{Error, Result};
