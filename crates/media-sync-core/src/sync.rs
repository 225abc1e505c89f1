use crate::matcher::{CatalogMatcher, MatchOutcome};
use crate::processed::ProcessedSet;
use crate::session::SyncSession;
use crate::SyncError;
use media_sync_config::SyncOptions;
use media_sync_models::AddOutcome;
use media_sync_sources::{CatalogSearch, LibrarySource, ListUpdater};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

#[cfg(test)]
mod tests;

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Fetching,
    Matching,
    Completed,
    Failed,
}

/// What happened to one library title
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleOutcome {
    /// Already in the processed record
    Skipped,
    /// Contains a line terminator, so it can never be recorded; not searched
    Unrecordable,
    NoResults,
    NoMatch,
    Added { entry_id: u64 },
    AlreadyPresent { entry_id: u64 },
    /// The list answered with something unrecognised; the title is still recorded
    Other { entry_id: u64, response: String },
    /// Dry run: matched, nothing submitted or recorded
    Matched { entry_id: u64 },
}

#[derive(Debug, Clone)]
pub enum SyncEvent {
    Fetched { total: usize },
    Title {
        position: usize,
        total: usize,
        title: String,
        outcome: TitleOutcome,
    },
}

type EventHandler = Box<dyn Fn(&SyncEvent) + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    pub titles_fetched: usize,
    pub skipped: usize,
    pub unrecordable: usize,
    pub no_results: usize,
    pub no_match: usize,
    pub added: usize,
    pub already_present: usize,
    pub other_responses: usize,
    pub dry_run_matches: usize,
    pub duration: Duration,
}

impl SyncResult {
    /// Titles appended to the processed record during this run
    pub fn recorded(&self) -> usize {
        self.added + self.already_present + self.other_responses
    }

    fn count(&mut self, outcome: &TitleOutcome) {
        match outcome {
            TitleOutcome::Skipped => self.skipped += 1,
            TitleOutcome::Unrecordable => self.unrecordable += 1,
            TitleOutcome::NoResults => self.no_results += 1,
            TitleOutcome::NoMatch => self.no_match += 1,
            TitleOutcome::Added { .. } => self.added += 1,
            TitleOutcome::AlreadyPresent { .. } => self.already_present += 1,
            TitleOutcome::Other { .. } => self.other_responses += 1,
            TitleOutcome::Matched { .. } => self.dry_run_matches += 1,
        }
    }
}

/// Runs library titles through catalog matching and list updates, one title
/// at a time, recording each submitted title as processed.
pub struct SyncOrchestrator {
    library: Arc<dyn LibrarySource>,
    matcher: CatalogMatcher,
    updater: Arc<dyn ListUpdater>,
    options: SyncOptions,
    state: SyncState,
    on_event: Option<EventHandler>,
}

impl SyncOrchestrator {
    pub fn new(
        library: Arc<dyn LibrarySource>,
        catalog: Arc<dyn CatalogSearch>,
        updater: Arc<dyn ListUpdater>,
    ) -> Self {
        Self {
            library,
            matcher: CatalogMatcher::new(catalog),
            updater,
            options: SyncOptions::default(),
            state: SyncState::Idle,
            on_event: None,
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_event_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        self.on_event = Some(Box::new(handler));
        self
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(handler) = &self.on_event {
            handler(&event);
        }
    }

    /// Run one sync pass for `session`.
    ///
    /// Returns once the last title has been handled and recorded. Any error
    /// stops the run; titles recorded before it stay recorded.
    #[instrument(skip_all, fields(user = %session.user()))]
    pub async fn sync(&mut self, session: &SyncSession) -> Result<SyncResult, SyncError> {
        let start = Instant::now();
        match self.run(session).await {
            Ok(mut result) => {
                self.state = SyncState::Completed;
                result.duration = start.elapsed();
                info!(
                    fetched = result.titles_fetched,
                    skipped = result.skipped,
                    unrecordable = result.unrecordable,
                    recorded = result.recorded(),
                    no_results = result.no_results,
                    no_match = result.no_match,
                    "Sync completed in {:?}",
                    result.duration
                );
                Ok(result)
            }
            Err(e) => {
                self.state = SyncState::Failed;
                error!("Sync failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run(&mut self, session: &SyncSession) -> Result<SyncResult, SyncError> {
        let mut result = SyncResult::default();

        self.state = SyncState::Fetching;
        info!(
            "Fetching library titles from {} section(s): {}",
            session.sections().len(),
            session.sections().join(", ")
        );
        let titles = self
            .library
            .fetch_all_titles(session.sections())
            .await
            .map_err(SyncError::Library)?;
        result.titles_fetched = titles.len();
        self.emit(SyncEvent::Fetched { total: titles.len() });

        if titles.is_empty() {
            info!("Library returned no titles, nothing to sync");
            return Ok(result);
        }

        let mut processed = ProcessedSet::load(session.processed_path());

        self.state = SyncState::Matching;
        let total = titles.len();
        for (index, title) in titles.into_iter().enumerate() {
            let outcome = if processed.contains(&title) {
                debug!("Skipping already processed title '{}'", title);
                TitleOutcome::Skipped
            } else if !ProcessedSet::can_record(&title) {
                warn!("Skipping title with a line break, it cannot be recorded: {:?}", title);
                TitleOutcome::Unrecordable
            } else {
                self.process_title(&title, &mut processed).await?
            };

            result.count(&outcome);
            self.emit(SyncEvent::Title {
                position: index + 1,
                total,
                title,
                outcome,
            });
        }

        Ok(result)
    }

    async fn process_title(
        &self,
        title: &str,
        processed: &mut ProcessedSet,
    ) -> Result<TitleOutcome, SyncError> {
        info!("Processing anime: {}", title);

        let matched = match self
            .matcher
            .match_title(title)
            .await
            .map_err(SyncError::Catalog)?
        {
            MatchOutcome::Matched(m) => m,
            MatchOutcome::NoResults => {
                info!("No catalog results found for: {}", title);
                return Ok(TitleOutcome::NoResults);
            }
            MatchOutcome::NoMatch { candidates } => {
                info!(
                    "No catalog title match found in {} results for: {}",
                    candidates, title
                );
                return Ok(TitleOutcome::NoMatch);
            }
        };

        let entry_id = matched.entry_id;
        if self.options.dry_run {
            info!(
                entry_id,
                "Dry run: '{}' matched '{}' by {}", title, matched.entry_title, matched.matched_on
            );
            return Ok(TitleOutcome::Matched { entry_id });
        }

        info!(
            entry_id,
            "Adding '{}' to list ({} matched: {})",
            matched.entry_title,
            matched.matched_on,
            matched.matched_name
        );
        let response = self
            .updater
            .add_to_list(entry_id, self.options.list_status, &self.options.comment)
            .await
            .map_err(SyncError::Catalog)?;

        let outcome = match response {
            AddOutcome::AlreadyPresent => {
                info!(entry_id, "'{}' already on list", title);
                TitleOutcome::AlreadyPresent { entry_id }
            }
            AddOutcome::Added => {
                info!(entry_id, "'{}' added to list", title);
                TitleOutcome::Added { entry_id }
            }
            AddOutcome::Other(response) => {
                warn!(entry_id, "Unexpected list response for '{}': {}", title, response);
                TitleOutcome::Other { entry_id, response }
            }
        };

        // recorded whatever the list answered
        processed.append(title).map_err(|source| SyncError::Storage {
            title: title.to_string(),
            source,
        })?;

        Ok(outcome)
    }
}
