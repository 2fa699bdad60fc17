//! Orchestration of the two load phases.
//!
//! The song phase must finish before the log phase starts; this is enforced
//! by [`CatalogLoaded`], which only [`Pipeline::load_song_catalog`] hands
//! out. Within a phase, files are processed one at a time in sorted order,
//! each in its own transaction. A file that fails is rolled back and
//! recorded, and the phase moves on unless `fail_fast` is set.

use std::fmt;
use std::path::{Path, PathBuf};

use sparkify_core::schema::{Database, TableCounts};

use crate::catalog::CatalogLoaded;
use crate::error::{EtlError, EtlResult};
use crate::events::LogExtractor;
use crate::loader::{LoadStats, Loader};
use crate::song::extract_song_file;
use crate::walker::discover_files;

/// Input file extension for both phases.
const INPUT_EXTENSION: &str = "json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Songs,
    Logs,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Songs => f.write_str("songs"),
            Self::Logs => f.write_str("logs"),
        }
    }
}

/// Progress notifications emitted while a phase runs.
#[derive(Debug)]
pub enum ProgressEvent<'a> {
    Discovered {
        phase: Phase,
        root: &'a Path,
        total: usize,
    },
    FileLoaded {
        phase: Phase,
        index: usize,
        total: usize,
        path: &'a Path,
    },
    FileFailed {
        phase: Phase,
        index: usize,
        total: usize,
        path: &'a Path,
        error: &'a EtlError,
    },
}

/// A file that could not be loaded, and why.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: EtlError,
}

/// Outcome of one phase.
#[derive(Debug)]
pub struct PhaseReport {
    pub phase: Phase,
    pub root: PathBuf,
    pub files_found: usize,
    pub files_loaded: usize,
    pub stats: LoadStats,
    pub failures: Vec<FileFailure>,
}

impl PhaseReport {
    fn new(phase: Phase, root: &Path) -> Self {
        Self {
            phase,
            root: root.to_path_buf(),
            files_found: 0,
            files_loaded: 0,
            stats: LoadStats::default(),
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of a full run: both phases plus the final table counts.
#[derive(Debug)]
pub struct RunReport {
    pub songs: PhaseReport,
    pub logs: PhaseReport,
    pub counts: TableCounts,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &FileFailure> {
        self.songs.failures.iter().chain(self.logs.failures.iter())
    }
}

/// Drives discovery, extraction and loading against one database.
#[derive(Debug)]
pub struct Pipeline<'db> {
    db: &'db Database,
    fail_fast: bool,
}

impl<'db> Pipeline<'db> {
    #[must_use]
    pub const fn new(db: &'db Database) -> Self {
        Self {
            db,
            fail_fast: false,
        }
    }

    /// Abort on the first failing file instead of recording it.
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Load every song file under `root` into the songs and artists tables.
    ///
    /// Returns the token required by the log phase.
    pub fn load_song_catalog(
        &self,
        root: &Path,
        on_progress: &mut dyn FnMut(&ProgressEvent<'_>),
    ) -> EtlResult<(CatalogLoaded, PhaseReport)> {
        let loader = Loader::new(self.db);
        let report = self.run_phase(Phase::Songs, root, on_progress, |path| {
            let rows = extract_song_file(path)?;
            loader.load_song_rows(&rows)
        })?;

        Ok((CatalogLoaded::new(report.files_loaded), report))
    }

    /// Load every event log under `root` into the time, users and songplays
    /// tables.
    pub fn load_event_logs(
        &self,
        root: &Path,
        catalog: &CatalogLoaded,
        on_progress: &mut dyn FnMut(&ProgressEvent<'_>),
    ) -> EtlResult<PhaseReport> {
        let loader = Loader::new(self.db);
        let extractor = LogExtractor::new(self.db, catalog);
        self.run_phase(Phase::Logs, root, on_progress, |path| {
            let rows = extractor.extract_file(path)?;
            loader.load_log_rows(&rows)
        })
    }

    /// Run the song phase, then the log phase, then count every table.
    pub fn run(
        &self,
        song_root: &Path,
        log_root: &Path,
        on_progress: &mut dyn FnMut(&ProgressEvent<'_>),
    ) -> EtlResult<RunReport> {
        let (catalog, songs) = self.load_song_catalog(song_root, on_progress)?;
        let logs = self.load_event_logs(log_root, &catalog, on_progress)?;
        let counts = self.db.table_counts()?;

        Ok(RunReport {
            songs,
            logs,
            counts,
        })
    }

    fn run_phase(
        &self,
        phase: Phase,
        root: &Path,
        on_progress: &mut dyn FnMut(&ProgressEvent<'_>),
        mut process: impl FnMut(&Path) -> EtlResult<LoadStats>,
    ) -> EtlResult<PhaseReport> {
        let files = discover_files(root, INPUT_EXTENSION)?;
        let total = files.len();
        let mut report = PhaseReport::new(phase, root);
        report.files_found = total;

        log::info!("{} phase: {} files found in {}", phase, total, root.display());
        on_progress(&ProgressEvent::Discovered { phase, root, total });

        for (idx, path) in files.iter().enumerate() {
            let index = idx + 1;
            match process(path) {
                Ok(stats) => {
                    log::debug!("Loaded {}: {}", path.display(), stats);
                    report.stats.merge(&stats);
                    report.files_loaded += 1;
                    on_progress(&ProgressEvent::FileLoaded {
                        phase,
                        index,
                        total,
                        path,
                    });
                }
                Err(error) => {
                    log::warn!("Failed to load {}: {}", path.display(), error);
                    on_progress(&ProgressEvent::FileFailed {
                        phase,
                        index,
                        total,
                        path,
                        error: &error,
                    });
                    if self.fail_fast {
                        return Err(error);
                    }
                    report.failures.push(FileFailure {
                        path: path.clone(),
                        error,
                    });
                }
            }
        }

        log::info!(
            "{} phase complete: {}/{} files loaded, {} failed",
            phase,
            report.files_loaded,
            total,
            report.failures.len()
        );

        Ok(report)
    }
}
