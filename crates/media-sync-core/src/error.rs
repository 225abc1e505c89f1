use media_sync_sources::SourceError;
use std::io;
use thiserror::Error;

/// Errors that end a sync run.
///
/// Per-title misses (no results, no match) are not errors; they show up as
/// `TitleOutcome` values and in the `SyncResult` counters.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Startup inputs were malformed; nothing was contacted
    #[error("invalid input: {0}")]
    Input(String),

    /// The library listing could not be fetched or parsed
    #[error("library fetch failed: {0}")]
    Library(#[source] SourceError),

    /// A catalog search or list request could not be completed
    #[error("catalog request failed: {0}")]
    Catalog(#[source] SourceError),

    /// A title could not be written to the processed record
    #[error("failed to record '{title}' as processed: {source}")]
    Storage {
        title: String,
        #[source]
        source: io::Error,
    },
}
