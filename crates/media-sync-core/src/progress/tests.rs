use super::*;
use async_trait::async_trait;
use media_sync_sources::SourceError;
use std::collections::HashMap;
use std::sync::Mutex;

struct FakeWatched {
    shows: Option<Vec<WatchedShow>>,
}

impl FakeWatched {
    fn with(shows: &[(&str, u32)]) -> Arc<Self> {
        Arc::new(Self {
            shows: Some(
                shows
                    .iter()
                    .map(|(title, count)| WatchedShow::new(*title, *count))
                    .collect(),
            ),
        })
    }
}

#[async_trait]
impl WatchedSource for FakeWatched {
    fn source_name(&self) -> &str {
        "fake-library"
    }

    async fn fetch_section_watched(&self, section: &str) -> Result<Vec<WatchedShow>, SourceError> {
        self.shows
            .clone()
            .ok_or_else(|| SourceError::fetch(format!("section {}", section), "connection refused"))
    }
}

#[derive(Default)]
struct FakeCatalog {
    results: HashMap<String, Vec<CatalogEntry>>,
    queries: Mutex<Vec<String>>,
}

impl FakeCatalog {
    fn with(results: &[(&str, Vec<CatalogEntry>)]) -> Arc<Self> {
        Arc::new(Self {
            results: results
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            ..Default::default()
        })
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSearch for FakeCatalog {
    fn source_name(&self) -> &str {
        "fake-catalog"
    }

    async fn search(&self, title: &str) -> Result<Vec<CatalogEntry>, SourceError> {
        self.queries.lock().unwrap().push(title.to_string());
        Ok(self.results.get(title).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct FakeList {
    entries: Option<Vec<ListEntry>>,
    add_responses: HashMap<u64, AddOutcome>,
    adds: Mutex<Vec<(u64, ListStatus, u32)>>,
    updates: Mutex<Vec<(u64, ListStatus, u32)>>,
}

impl FakeList {
    fn with(entries: Vec<ListEntry>) -> Self {
        Self {
            entries: Some(entries),
            ..Default::default()
        }
    }

    fn adds(&self) -> Vec<(u64, ListStatus, u32)> {
        self.adds.lock().unwrap().clone()
    }

    fn updates(&self) -> Vec<(u64, ListStatus, u32)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListProgress for FakeList {
    fn source_name(&self) -> &str {
        "fake-list"
    }

    async fn fetch_list(&self) -> Result<Vec<ListEntry>, SourceError> {
        self.entries
            .clone()
            .ok_or_else(|| SourceError::fetch("user list", "503 Service Unavailable"))
    }

    async fn add_with_progress(
        &self,
        entry_id: u64,
        status: ListStatus,
        episodes: u32,
    ) -> Result<AddOutcome, SourceError> {
        self.adds.lock().unwrap().push((entry_id, status, episodes));
        Ok(self
            .add_responses
            .get(&entry_id)
            .cloned()
            .unwrap_or(AddOutcome::Added))
    }

    async fn update_progress(
        &self,
        entry_id: u64,
        status: ListStatus,
        episodes: u32,
    ) -> Result<UpdateOutcome, SourceError> {
        self.updates.lock().unwrap().push((entry_id, status, episodes));
        Ok(UpdateOutcome::Updated)
    }
}

fn listed(id: u64, title: &str, episodes: u32, watched: u32, status: ListStatus) -> ListEntry {
    ListEntry {
        id,
        title: title.to_string(),
        synonyms: String::new(),
        episodes,
        watched_episodes: watched,
        status: Some(status),
    }
}

fn sections() -> Vec<String> {
    vec!["2".to_string()]
}

#[test]
fn test_progress_for() {
    assert_eq!(progress_for(3, 12), (ListStatus::Watching, 3));
    assert_eq!(progress_for(12, 12), (ListStatus::Completed, 12));
    assert_eq!(progress_for(14, 12), (ListStatus::Completed, 12));
    // unknown length never completes
    assert_eq!(progress_for(500, 0), (ListStatus::Watching, 500));
}

#[tokio::test]
async fn test_listed_shows_only_move_forward() {
    let catalog = FakeCatalog::with(&[]);
    let list = Arc::new(FakeList::with(vec![
        listed(20, "Naruto", 220, 10, ListStatus::Watching),
        listed(19, "Monster", 74, 30, ListStatus::Watching),
        listed(1, "Cowboy Bebop", 26, 26, ListStatus::Completed),
        listed(5, "Bleach", 366, 0, ListStatus::PlanToWatch),
    ]));
    let mut progress = ProgressSync::new(
        FakeWatched::with(&[("naruto", 12), ("Monster", 30), ("Cowboy Bebop", 3), ("Bleach", 1)]),
        catalog.clone(),
        list.clone(),
    );

    let result = progress.sync(&sections()).await.unwrap();

    assert_eq!(progress.state(), SyncState::Completed);
    assert_eq!(
        list.updates(),
        vec![(20, ListStatus::Watching, 12), (5, ListStatus::Watching, 1)]
    );
    assert!(list.adds().is_empty());
    assert!(catalog.queries().is_empty());
    assert_eq!((result.updated, result.up_to_date), (2, 2));
}

#[tokio::test]
async fn test_fully_watched_show_is_completed() {
    let list = Arc::new(FakeList::with(vec![listed(
        30,
        "Shingeki no Kyojin",
        25,
        20,
        ListStatus::Watching,
    )]));
    let mut progress = ProgressSync::new(
        FakeWatched::with(&[("Shingeki no Kyojin", 27)]),
        FakeCatalog::with(&[]),
        list.clone(),
    );

    progress.sync(&sections()).await.unwrap();

    assert_eq!(list.updates(), vec![(30, ListStatus::Completed, 25)]);
}

#[tokio::test]
async fn test_unlisted_shows_are_searched_and_added() {
    let catalog = FakeCatalog::with(&[
        ("Monster", vec![CatalogEntry::new(19, "Monster").with_episodes(74)]),
        ("Mushishi", vec![CatalogEntry::new(457, "Mushishi").with_episodes(26)]),
        ("Bleach", vec![CatalogEntry::new(1, "Bleach: Sennen Kessen-hen")]),
    ]);
    let list = Arc::new(FakeList::with(Vec::new()));
    let mut progress = ProgressSync::new(
        FakeWatched::with(&[("Monster", 5), ("Mushishi", 26), ("Bleach", 2), ("Unknown", 1)]),
        catalog.clone(),
        list.clone(),
    );

    let result = progress.sync(&sections()).await.unwrap();

    assert_eq!(
        list.adds(),
        vec![(19, ListStatus::Watching, 5), (457, ListStatus::Completed, 26)]
    );
    assert_eq!(catalog.queries(), vec!["Monster", "Mushishi", "Bleach", "Unknown"]);
    assert_eq!((result.added, result.no_match, result.no_results), (2, 1, 1));
}

#[tokio::test]
async fn test_show_in_two_sections_is_sent_once() {
    let catalog = FakeCatalog::with(&[("Monster", vec![CatalogEntry::new(19, "Monster")])]);
    let list = Arc::new(FakeList::with(Vec::new()));
    let mut progress = ProgressSync::new(
        FakeWatched::with(&[("Monster", 5), ("Monster", 5)]),
        catalog.clone(),
        list.clone(),
    );

    let result = progress.sync(&sections()).await.unwrap();

    assert_eq!(list.adds().len(), 1);
    assert!(list.updates().is_empty());
    assert_eq!(catalog.queries(), vec!["Monster"]);
    assert_eq!((result.added, result.up_to_date), (1, 1));
}

#[tokio::test]
async fn test_already_present_add_becomes_update() {
    let catalog = FakeCatalog::with(&[("Monster", vec![CatalogEntry::new(19, "Monster")])]);
    let list = Arc::new(FakeList {
        entries: Some(Vec::new()),
        add_responses: HashMap::from([(19, AddOutcome::AlreadyPresent)]),
        ..Default::default()
    });
    let mut progress =
        ProgressSync::new(FakeWatched::with(&[("Monster", 8)]), catalog, list.clone());

    let result = progress.sync(&sections()).await.unwrap();

    assert_eq!(list.updates(), vec![(19, ListStatus::Watching, 8)]);
    assert_eq!(result.updated, 1);
}

#[tokio::test]
async fn test_dry_run_sends_nothing() {
    let catalog = FakeCatalog::with(&[("Monster", vec![CatalogEntry::new(19, "Monster")])]);
    let list = Arc::new(FakeList::with(vec![listed(20, "Naruto", 220, 1, ListStatus::Watching)]));
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let mut progress = ProgressSync::new(
        FakeWatched::with(&[("Naruto", 4), ("Monster", 2)]),
        catalog,
        list.clone(),
    )
    .with_dry_run(true)
    .with_event_handler(move |event| sink.lock().unwrap().push(event.clone()));

    let result = progress.sync(&sections()).await.unwrap();

    assert!(list.adds().is_empty());
    assert!(list.updates().is_empty());
    assert_eq!(result.planned, 2);
    let events = events.lock().unwrap();
    assert!(matches!(events[0], ProgressEvent::Fetched { total: 2 }));
    match &events[1] {
        ProgressEvent::Show { title, outcome, .. } => {
            assert_eq!(title, "Naruto");
            assert_eq!(
                *outcome,
                ProgressOutcome::Planned {
                    entry_id: 20,
                    status: ListStatus::Watching,
                    episodes: 4
                }
            );
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_nothing_watched_skips_the_list() {
    let list = Arc::new(FakeList::default());
    let mut progress = ProgressSync::new(FakeWatched::with(&[]), FakeCatalog::with(&[]), list);

    let result = progress.sync(&sections()).await.unwrap();

    assert_eq!(result.shows_fetched, 0);
    assert_eq!(progress.state(), SyncState::Completed);
}

#[tokio::test]
async fn test_failures_stop_the_pass() {
    let mut progress = ProgressSync::new(
        Arc::new(FakeWatched { shows: None }),
        FakeCatalog::with(&[]),
        Arc::new(FakeList::with(Vec::new())),
    );
    assert!(matches!(progress.sync(&sections()).await, Err(SyncError::Library(_))));
    assert_eq!(progress.state(), SyncState::Failed);

    let mut progress = ProgressSync::new(
        FakeWatched::with(&[("Monster", 1)]),
        FakeCatalog::with(&[]),
        Arc::new(FakeList::default()),
    );
    assert!(matches!(progress.sync(&sections()).await, Err(SyncError::Catalog(_))));

    let mut progress = ProgressSync::new(
        FakeWatched::with(&[("Monster", 1)]),
        FakeCatalog::with(&[]),
        Arc::new(FakeList::with(Vec::new())),
    );
    assert!(matches!(
        progress.sync(&[" ".to_string()]).await,
        Err(SyncError::Input(_))
    ));
}
