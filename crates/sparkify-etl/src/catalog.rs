//! Phase ordering between the song catalog and the event logs.

/// Proof that the song-catalog phase has run to completion.
///
/// Song-play rows are resolved against songs and artists, so the log phase
/// can only start once the catalog is in place. The token can only be
/// obtained from [`Pipeline::load_song_catalog`](crate::Pipeline::load_song_catalog)
/// and is required to build a [`LogExtractor`](crate::LogExtractor).
#[derive(Debug)]
pub struct CatalogLoaded {
    files_loaded: usize,
}

impl CatalogLoaded {
    pub(crate) const fn new(files_loaded: usize) -> Self {
        Self { files_loaded }
    }

    /// Number of song files that loaded successfully.
    pub const fn files_loaded(&self) -> usize {
        self.files_loaded
    }
}
