use super::*;
use async_trait::async_trait;
use media_sync_models::{CatalogEntry, ListStatus};
use media_sync_sources::SourceError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

struct FakeLibrary {
    titles: Option<Vec<String>>,
}

impl FakeLibrary {
    fn with(titles: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            titles: Some(titles.iter().map(|t| t.to_string()).collect()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { titles: None })
    }
}

#[async_trait]
impl LibrarySource for FakeLibrary {
    fn source_name(&self) -> &str {
        "fake-library"
    }

    async fn fetch_section_titles(&self, section: &str) -> Result<Vec<String>, SourceError> {
        self.titles
            .clone()
            .ok_or_else(|| SourceError::fetch(format!("section {}", section), "connection refused"))
    }
}

#[derive(Default)]
struct FakeCatalog {
    results: HashMap<String, Vec<CatalogEntry>>,
    fail_on: Option<String>,
    queries: Mutex<Vec<String>>,
}

impl FakeCatalog {
    fn with(results: &[(&str, Vec<CatalogEntry>)]) -> Self {
        Self {
            results: results
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            ..Default::default()
        }
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
        if self.fail_on.as_deref() == Some(title) {
            return Err(SourceError::Search {
                title: title.to_string(),
                message: "timed out".to_string(),
            });
        }
        Ok(self.results.get(title).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct FakeList {
    responses: HashMap<u64, AddOutcome>,
    adds: Mutex<Vec<(u64, ListStatus)>>,
}

impl FakeList {
    fn adds(&self) -> Vec<(u64, ListStatus)> {
        self.adds.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListUpdater for FakeList {
    fn source_name(&self) -> &str {
        "fake-list"
    }

    async fn add_to_list(
        &self,
        entry_id: u64,
        status: ListStatus,
        _comment: &str,
    ) -> Result<AddOutcome, SourceError> {
        self.adds.lock().unwrap().push((entry_id, status));
        Ok(self
            .responses
            .get(&entry_id)
            .cloned()
            .unwrap_or(AddOutcome::Added))
    }
}

fn session(dir: &TempDir) -> SyncSession {
    SyncSession::new(
        "john",
        vec!["1".to_string()],
        dir.path().join("AnimeProcessed_john.cache"),
    )
    .unwrap()
}

fn processed_path(dir: &TempDir) -> PathBuf {
    dir.path().join("AnimeProcessed_john.cache")
}

fn read_processed(dir: &TempDir) -> String {
    std::fs::read_to_string(processed_path(dir)).unwrap_or_default()
}

fn naruto_and_bleach() -> FakeCatalog {
    FakeCatalog::with(&[
        ("Naruto", vec![CatalogEntry::new(20, "Naruto")]),
        (
            "Bleach",
            vec![CatalogEntry::new(1, "Bleach: Sennen Kessen-hen")],
        ),
    ])
}

#[tokio::test]
async fn test_end_to_end_records_submitted_titles_once() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(FakeCatalog::with(&[
        ("Naruto", vec![CatalogEntry::new(20, "Naruto")]),
        ("Bleach", vec![]),
    ]));
    let list = Arc::new(FakeList::default());
    let mut orchestrator = SyncOrchestrator::new(
        FakeLibrary::with(&["Naruto", "Bleach", "Naruto"]),
        catalog.clone(),
        list.clone(),
    );

    let result = orchestrator.sync(&session(&dir)).await.unwrap();

    assert_eq!(orchestrator.state(), SyncState::Completed);
    assert_eq!(list.adds(), vec![(20, ListStatus::PlanToWatch)]);
    assert_eq!(catalog.queries(), vec!["Naruto", "Bleach"]);
    assert_eq!(read_processed(&dir), "Naruto\n");
    assert_eq!(result.titles_fetched, 3);
    assert_eq!(result.added, 1);
    assert_eq!(result.no_results, 1);
    assert_eq!(result.no_match, 0);
    assert_eq!(result.skipped, 1);
}

#[tokio::test]
async fn test_processed_titles_are_not_searched() {
    let dir = TempDir::new().unwrap();
    std::fs::write(processed_path(&dir), "Naruto\n").unwrap();
    let catalog = Arc::new(naruto_and_bleach());
    let list = Arc::new(FakeList::default());
    let mut orchestrator =
        SyncOrchestrator::new(FakeLibrary::with(&["Naruto"]), catalog.clone(), list.clone());

    let result = orchestrator.sync(&session(&dir)).await.unwrap();

    assert!(catalog.queries().is_empty());
    assert!(list.adds().is_empty());
    assert_eq!(result.skipped, 1);
    assert_eq!(read_processed(&dir), "Naruto\n");
}

#[tokio::test]
async fn test_second_run_skips_what_the_first_recorded() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(naruto_and_bleach());
    let list = Arc::new(FakeList::default());

    for _ in 0..2 {
        let mut orchestrator = SyncOrchestrator::new(
            FakeLibrary::with(&["Naruto", "Bleach"]),
            catalog.clone(),
            list.clone(),
        );
        orchestrator.sync(&session(&dir)).await.unwrap();
    }

    assert_eq!(list.adds().len(), 1);
    // Bleach never matched, so it is searched on both runs
    assert_eq!(catalog.queries(), vec!["Naruto", "Bleach", "Bleach"]);
}

#[tokio::test]
async fn test_title_with_line_break_is_never_submitted() {
    let dir = TempDir::new().unwrap();
    let mut catalog = naruto_and_bleach();
    catalog
        .results
        .insert("Foo\nBar".to_string(), vec![CatalogEntry::new(7, "Foo\nBar")]);
    let catalog = Arc::new(catalog);
    let list = Arc::new(FakeList::default());

    let mut results = Vec::new();
    for _ in 0..2 {
        let mut orchestrator = SyncOrchestrator::new(
            FakeLibrary::with(&["Foo\nBar", "Naruto"]),
            catalog.clone(),
            list.clone(),
        );
        results.push(orchestrator.sync(&session(&dir)).await.unwrap());
        assert_eq!(orchestrator.state(), SyncState::Completed);
    }

    assert_eq!(list.adds(), vec![(20, ListStatus::PlanToWatch)]);
    assert_eq!(catalog.queries(), vec!["Naruto"]);
    assert_eq!(read_processed(&dir), "Naruto\n");
    assert_eq!((results[0].unrecordable, results[0].added), (1, 1));
    assert_eq!((results[1].unrecordable, results[1].skipped), (1, 1));
}

#[tokio::test]
async fn test_zero_results_leaves_record_untouched() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(FakeCatalog::default());
    let list = Arc::new(FakeList::default());
    let mut orchestrator =
        SyncOrchestrator::new(FakeLibrary::with(&["Unknown Show"]), catalog, list.clone());

    let result = orchestrator.sync(&session(&dir)).await.unwrap();

    assert_eq!(result.no_results, 1);
    assert!(list.adds().is_empty());
    assert!(!processed_path(&dir).exists());
}

#[tokio::test]
async fn test_already_present_and_other_responses_are_recorded() {
    let dir = TempDir::new().unwrap();
    let mut catalog = naruto_and_bleach();
    catalog
        .results
        .insert("Monster".to_string(), vec![CatalogEntry::new(19, "Monster")]);
    let catalog = Arc::new(catalog);
    let list = Arc::new(FakeList {
        responses: HashMap::from([
            (20, AddOutcome::AlreadyPresent),
            (19, AddOutcome::Other("Internal Server Error".to_string())),
        ]),
        ..Default::default()
    });
    let mut orchestrator = SyncOrchestrator::new(
        FakeLibrary::with(&["Naruto", "Monster"]),
        catalog,
        list.clone(),
    );

    let result = orchestrator.sync(&session(&dir)).await.unwrap();

    assert_eq!(result.already_present, 1);
    assert_eq!(result.other_responses, 1);
    assert_eq!(result.recorded(), 2);
    assert_eq!(read_processed(&dir), "Naruto\nMonster\n");
}

#[tokio::test]
async fn test_list_status_and_events_follow_options() {
    let dir = TempDir::new().unwrap();
    let list = Arc::new(FakeList::default());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let mut orchestrator = SyncOrchestrator::new(
        FakeLibrary::with(&["Naruto", "Bleach"]),
        Arc::new(naruto_and_bleach()),
        list.clone(),
    )
    .with_options(SyncOptions {
        list_status: ListStatus::Watching,
        ..Default::default()
    })
    .with_event_handler(move |event| sink.lock().unwrap().push(event.clone()));

    orchestrator.sync(&session(&dir)).await.unwrap();

    assert_eq!(list.adds(), vec![(20, ListStatus::Watching)]);
    let events = events.lock().unwrap();
    assert!(matches!(events[0], SyncEvent::Fetched { total: 2 }));
    match &events[2] {
        SyncEvent::Title {
            position,
            total,
            title,
            outcome,
        } => {
            assert_eq!((*position, *total), (2, 2));
            assert_eq!(title, "Bleach");
            assert_eq!(*outcome, TitleOutcome::NoMatch);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_dry_run_neither_adds_nor_records() {
    let dir = TempDir::new().unwrap();
    let list = Arc::new(FakeList::default());
    let mut orchestrator = SyncOrchestrator::new(
        FakeLibrary::with(&["Naruto"]),
        Arc::new(naruto_and_bleach()),
        list.clone(),
    )
    .with_options(SyncOptions {
        dry_run: true,
        ..Default::default()
    });

    let result = orchestrator.sync(&session(&dir)).await.unwrap();

    assert_eq!(result.dry_run_matches, 1);
    assert!(list.adds().is_empty());
    assert!(!processed_path(&dir).exists());
}

#[tokio::test]
async fn test_library_failure_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(naruto_and_bleach());
    let mut orchestrator =
        SyncOrchestrator::new(FakeLibrary::failing(), catalog.clone(), Arc::new(FakeList::default()));

    let result = orchestrator.sync(&session(&dir)).await;

    assert!(matches!(result, Err(SyncError::Library(_))));
    assert_eq!(orchestrator.state(), SyncState::Failed);
    assert!(catalog.queries().is_empty());
}

#[tokio::test]
async fn test_search_failure_stops_after_earlier_titles_are_recorded() {
    let dir = TempDir::new().unwrap();
    let mut catalog = naruto_and_bleach();
    catalog.fail_on = Some("Bleach".to_string());
    let catalog = Arc::new(catalog);
    let list = Arc::new(FakeList::default());
    let mut orchestrator = SyncOrchestrator::new(
        FakeLibrary::with(&["Naruto", "Bleach", "Monster"]),
        catalog.clone(),
        list,
    );

    let result = orchestrator.sync(&session(&dir)).await;

    assert!(matches!(result, Err(SyncError::Catalog(_))));
    assert_eq!(orchestrator.state(), SyncState::Failed);
    assert_eq!(catalog.queries(), vec!["Naruto", "Bleach"]);
    assert_eq!(read_processed(&dir), "Naruto\n");
}

#[tokio::test]
async fn test_empty_library_completes_without_touching_record() {
    let dir = TempDir::new().unwrap();
    let mut orchestrator = SyncOrchestrator::new(
        FakeLibrary::with(&[]),
        Arc::new(FakeCatalog::default()),
        Arc::new(FakeList::default()),
    );
    assert_eq!(orchestrator.state(), SyncState::Idle);

    let result = orchestrator.sync(&session(&dir)).await.unwrap();

    assert_eq!(result.titles_fetched, 0);
    assert_eq!(orchestrator.state(), SyncState::Completed);
    assert!(!processed_path(&dir).exists());
}
