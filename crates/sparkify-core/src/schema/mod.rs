pub mod db;
pub mod migrations;
pub mod tables;

pub use db::{Database, SongLookup, TableCounts};
pub use tables::{ConflictPolicy, Table};
