use async_trait::async_trait;
use media_sync_models::{AddOutcome, CatalogEntry, ListEntry, ListStatus, UpdateOutcome, WatchedShow};
use tracing::debug;

use crate::SourceError;

/// A media server that can list the titles in its library sections
#[async_trait]
pub trait LibrarySource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Titles of every item in one section, trimmed, in listing order
    async fn fetch_section_titles(&self, section: &str) -> Result<Vec<String>, SourceError>;

    /// Titles of all `sections`, concatenated in the order given.
    ///
    /// Stops at the first section that fails; no partial result is returned.
    async fn fetch_all_titles(&self, sections: &[String]) -> Result<Vec<String>, SourceError> {
        let mut titles = Vec::new();
        for section in sections {
            let section_titles = self.fetch_section_titles(section).await?;
            debug!(
                source = self.source_name(),
                section = %section,
                count = section_titles.len(),
                "Fetched section titles"
            );
            titles.extend(section_titles);
        }
        Ok(titles)
    }
}

/// A media server that tracks which episodes have been watched
#[async_trait]
pub trait WatchedSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Shows in one section with at least one watched first-season episode
    async fn fetch_section_watched(&self, section: &str) -> Result<Vec<WatchedShow>, SourceError>;

    /// Watched shows of all `sections`, in the order given; stops at the first failure
    async fn fetch_all_watched(&self, sections: &[String]) -> Result<Vec<WatchedShow>, SourceError> {
        let mut shows = Vec::new();
        for section in sections {
            let section_shows = self.fetch_section_watched(section).await?;
            debug!(
                source = self.source_name(),
                section = %section,
                count = section_shows.len(),
                "Fetched watched shows"
            );
            shows.extend(section_shows);
        }
        Ok(shows)
    }
}

/// Free-text search against a remote catalog
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    fn source_name(&self) -> &str;

    /// Candidate entries for `title`, in the order the catalog ranks them
    async fn search(&self, title: &str) -> Result<Vec<CatalogEntry>, SourceError>;
}

/// Submits entries to the user's remote watch list
#[async_trait]
pub trait ListUpdater: Send + Sync {
    fn source_name(&self) -> &str;

    /// Add `entry_id` with `status`; `Err` only when the request could not be delivered
    async fn add_to_list(
        &self,
        entry_id: u64,
        status: ListStatus,
        comment: &str,
    ) -> Result<AddOutcome, SourceError>;
}

/// Reads the user's remote watch list and moves entries forward
#[async_trait]
pub trait ListProgress: Send + Sync {
    fn source_name(&self) -> &str;

    /// Every entry currently on the user's list
    async fn fetch_list(&self) -> Result<Vec<ListEntry>, SourceError>;

    /// Add `entry_id` with a watched-episode count
    async fn add_with_progress(
        &self,
        entry_id: u64,
        status: ListStatus,
        episodes: u32,
    ) -> Result<AddOutcome, SourceError>;

    /// Set the watched-episode count and status of an entry already listed
    async fn update_progress(
        &self,
        entry_id: u64,
        status: ListStatus,
        episodes: u32,
    ) -> Result<UpdateOutcome, SourceError>;
}
