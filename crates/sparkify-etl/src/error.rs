//! Error types for the ETL pipeline.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while extracting or loading a file.
#[derive(Debug, Error)]
pub enum EtlError {
    /// A record was malformed or missing a required field.
    #[error("parse error in {}: {message}", location(.path, .line))]
    Parse {
        path: PathBuf,
        /// 1-based line number for line-delimited files.
        line: Option<usize>,
        message: String,
    },

    /// An input file or directory could not be read.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An error propagated from the storage layer.
    #[error("storage error: {0}")]
    Store(#[from] sparkify_core::Error),
}

#[allow(clippy::ref_option)]
fn location(path: &Path, line: &Option<usize>) -> String {
    match line {
        Some(line) => format!("{}:{line}", path.display()),
        None => path.display().to_string(),
    }
}

impl EtlError {
    pub(crate) fn parse(path: &Path, line: Option<usize>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns `true` when the input itself was bad, as opposed to the
    /// filesystem or the database.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Convenience alias for ETL results.
pub type EtlResult<T> = std::result::Result<T, EtlError>;
