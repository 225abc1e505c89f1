use crate::matcher::{match_entries, CatalogMatcher, MatchOutcome};
use crate::sync::SyncState;
use crate::SyncError;
use media_sync_models::{AddOutcome, CatalogEntry, ListEntry, ListStatus, UpdateOutcome, WatchedShow};
use media_sync_sources::{CatalogSearch, ListProgress, WatchedSource};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

#[cfg(test)]
mod tests;

/// What a progress pass did for one watched show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// The list already shows this many watched episodes, or the entry is completed
    UpToDate { entry_id: u64 },
    Updated {
        entry_id: u64,
        status: ListStatus,
        episodes: u32,
    },
    Added {
        entry_id: u64,
        status: ListStatus,
        episodes: u32,
    },
    NoResults,
    NoMatch,
    /// Dry run: this change would have been sent
    Planned {
        entry_id: u64,
        status: ListStatus,
        episodes: u32,
    },
    /// The list answered with something unrecognised
    Other { entry_id: u64, response: String },
}

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Fetched { total: usize },
    Show {
        position: usize,
        total: usize,
        title: String,
        outcome: ProgressOutcome,
    },
}

type EventHandler = Box<dyn Fn(&ProgressEvent) + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct ProgressResult {
    pub shows_fetched: usize,
    pub up_to_date: usize,
    pub updated: usize,
    pub added: usize,
    pub no_results: usize,
    pub no_match: usize,
    pub planned: usize,
    pub other_responses: usize,
    pub duration: Duration,
}

impl ProgressResult {
    fn count(&mut self, outcome: &ProgressOutcome) {
        match outcome {
            ProgressOutcome::UpToDate { .. } => self.up_to_date += 1,
            ProgressOutcome::Updated { .. } => self.updated += 1,
            ProgressOutcome::Added { .. } => self.added += 1,
            ProgressOutcome::NoResults => self.no_results += 1,
            ProgressOutcome::NoMatch => self.no_match += 1,
            ProgressOutcome::Planned { .. } => self.planned += 1,
            ProgressOutcome::Other { .. } => self.other_responses += 1,
        }
    }
}

/// Status and episode count to report for `watched` episodes of a series
/// with `total` episodes (0 when unknown).
///
/// A fully watched series is completed and capped at its length.
pub fn progress_for(watched: u32, total: u32) -> (ListStatus, u32) {
    if total > 0 && watched >= total {
        (ListStatus::Completed, total)
    } else {
        (ListStatus::Watching, watched)
    }
}

/// The user's list, searchable with the same title rules as the catalog
struct ListIndex {
    entries: Vec<ListEntry>,
    candidates: Vec<CatalogEntry>,
}

impl ListIndex {
    fn new(entries: Vec<ListEntry>) -> Self {
        let candidates = entries.iter().map(ListEntry::as_catalog_entry).collect();
        Self {
            entries,
            candidates,
        }
    }

    fn find(&self, title: &str) -> Option<usize> {
        match match_entries(title, &self.candidates) {
            MatchOutcome::Matched(m) => self.entries.iter().position(|e| e.id == m.entry_id),
            _ => None,
        }
    }

    fn set_progress(&mut self, index: usize, status: ListStatus, episodes: u32) {
        let entry = &mut self.entries[index];
        entry.status = Some(status);
        entry.watched_episodes = episodes;
    }

    fn insert(&mut self, entry: ListEntry) {
        self.candidates.push(entry.as_catalog_entry());
        self.entries.push(entry);
    }
}

/// Pushes first-season watched-episode counts from the library to the
/// user's list. Entries only ever move forward; nothing is removed.
pub struct ProgressSync {
    library: Arc<dyn WatchedSource>,
    matcher: CatalogMatcher,
    list: Arc<dyn ListProgress>,
    dry_run: bool,
    state: SyncState,
    on_event: Option<EventHandler>,
}

impl ProgressSync {
    pub fn new(
        library: Arc<dyn WatchedSource>,
        catalog: Arc<dyn CatalogSearch>,
        list: Arc<dyn ListProgress>,
    ) -> Self {
        Self {
            library,
            matcher: CatalogMatcher::new(catalog),
            list,
            dry_run: false,
            state: SyncState::Idle,
            on_event: None,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_event_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.on_event = Some(Box::new(handler));
        self
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.on_event {
            handler(&event);
        }
    }

    /// Run one progress pass over `sections`.
    ///
    /// Any request that cannot be delivered stops the pass; changes already
    /// sent stay on the list.
    #[instrument(skip_all, fields(sections = sections.len()))]
    pub async fn sync(&mut self, sections: &[String]) -> Result<ProgressResult, SyncError> {
        let start = Instant::now();
        match self.run(sections).await {
            Ok(mut result) => {
                self.state = SyncState::Completed;
                result.duration = start.elapsed();
                info!(
                    shows = result.shows_fetched,
                    updated = result.updated,
                    added = result.added,
                    up_to_date = result.up_to_date,
                    "Progress sync completed in {:?}",
                    result.duration
                );
                Ok(result)
            }
            Err(e) => {
                self.state = SyncState::Failed;
                error!("Progress sync failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run(&mut self, sections: &[String]) -> Result<ProgressResult, SyncError> {
        if sections.iter().all(|s| s.trim().is_empty()) {
            return Err(SyncError::Input(
                "at least one library section is required".to_string(),
            ));
        }

        let mut result = ProgressResult::default();

        self.state = SyncState::Fetching;
        let shows = self
            .library
            .fetch_all_watched(sections)
            .await
            .map_err(SyncError::Library)?;
        result.shows_fetched = shows.len();
        self.emit(ProgressEvent::Fetched { total: shows.len() });

        if shows.is_empty() {
            info!("No watched shows in the library, nothing to report");
            return Ok(result);
        }

        let entries = self.list.fetch_list().await.map_err(SyncError::Catalog)?;
        info!("Loaded {} list entries", entries.len());
        let mut index = ListIndex::new(entries);

        self.state = SyncState::Matching;
        let total = shows.len();
        for (position, show) in shows.into_iter().enumerate() {
            let outcome = self.process_show(&show, &mut index).await?;
            result.count(&outcome);
            self.emit(ProgressEvent::Show {
                position: position + 1,
                total,
                title: show.title,
                outcome,
            });
        }

        Ok(result)
    }

    async fn process_show(
        &self,
        show: &WatchedShow,
        index: &mut ListIndex,
    ) -> Result<ProgressOutcome, SyncError> {
        debug!(
            "'{}': {} watched episode(s)",
            show.title, show.watched_episodes
        );

        if let Some(position) = index.find(&show.title) {
            return self.update_listed(show, index, position).await;
        }

        let matched = match self
            .matcher
            .match_title(&show.title)
            .await
            .map_err(SyncError::Catalog)?
        {
            MatchOutcome::Matched(m) => m,
            MatchOutcome::NoResults => {
                info!("No catalog results found for: {}", show.title);
                return Ok(ProgressOutcome::NoResults);
            }
            MatchOutcome::NoMatch { candidates } => {
                info!(
                    "No catalog title match found in {} results for: {}",
                    candidates, show.title
                );
                return Ok(ProgressOutcome::NoMatch);
            }
        };

        let entry_id = matched.entry_id;
        let (status, episodes) = progress_for(show.watched_episodes, matched.episodes);
        if self.dry_run {
            info!(entry_id, "Dry run: would add '{}' as {} at episode {}", show.title, status, episodes);
            return Ok(ProgressOutcome::Planned {
                entry_id,
                status,
                episodes,
            });
        }

        info!(entry_id, "Adding '{}' as {} at episode {}", matched.entry_title, status, episodes);
        let response = self
            .list
            .add_with_progress(entry_id, status, episodes)
            .await
            .map_err(SyncError::Catalog)?;

        let outcome = match response {
            AddOutcome::Added => ProgressOutcome::Added {
                entry_id,
                status,
                episodes,
            },
            // listed after the list was read; set the count instead
            AddOutcome::AlreadyPresent => self.send_update(entry_id, status, episodes).await?,
            AddOutcome::Other(response) => {
                warn!(entry_id, "Unexpected list response for '{}': {}", show.title, response);
                ProgressOutcome::Other { entry_id, response }
            }
        };
        if matches!(outcome, ProgressOutcome::Other { .. }) {
            return Ok(outcome);
        }

        index.insert(ListEntry {
            id: entry_id,
            title: matched.entry_title,
            synonyms: String::new(),
            episodes: matched.episodes,
            watched_episodes: episodes,
            status: Some(status),
        });
        Ok(outcome)
    }

    async fn update_listed(
        &self,
        show: &WatchedShow,
        index: &mut ListIndex,
        position: usize,
    ) -> Result<ProgressOutcome, SyncError> {
        let entry = &index.entries[position];
        let entry_id = entry.id;

        if entry.status == Some(ListStatus::Completed) {
            debug!(entry_id, "'{}' already completed on the list", show.title);
            return Ok(ProgressOutcome::UpToDate { entry_id });
        }

        let (status, episodes) = progress_for(show.watched_episodes, entry.episodes);
        if episodes <= entry.watched_episodes {
            debug!(
                entry_id,
                "'{}' up to date ({} on the list, {} watched)",
                show.title,
                entry.watched_episodes,
                show.watched_episodes
            );
            return Ok(ProgressOutcome::UpToDate { entry_id });
        }

        if self.dry_run {
            info!(
                entry_id,
                "Dry run: would move '{}' from episode {} to {} ({})",
                show.title,
                entry.watched_episodes,
                episodes,
                status
            );
            return Ok(ProgressOutcome::Planned {
                entry_id,
                status,
                episodes,
            });
        }

        info!(
            entry_id,
            "Updating '{}' from episode {} to {} ({})",
            show.title,
            entry.watched_episodes,
            episodes,
            status
        );
        let outcome = self.send_update(entry_id, status, episodes).await?;
        if matches!(outcome, ProgressOutcome::Updated { .. }) {
            index.set_progress(position, status, episodes);
        }
        Ok(outcome)
    }

    async fn send_update(
        &self,
        entry_id: u64,
        status: ListStatus,
        episodes: u32,
    ) -> Result<ProgressOutcome, SyncError> {
        let response = self
            .list
            .update_progress(entry_id, status, episodes)
            .await
            .map_err(SyncError::Catalog)?;

        Ok(match response {
            UpdateOutcome::Updated => ProgressOutcome::Updated {
                entry_id,
                status,
                episodes,
            },
            UpdateOutcome::Other(response) => {
                warn!(entry_id, "Unexpected list response to update: {}", response);
                ProgressOutcome::Other { entry_id, response }
            }
        })
    }
}
