use anime_archive::clients::jikan::{MalAnime, MalGenericInfo, MalImageSet, MalImages, MetadataSource};
use anime_archive::domain::{Genre, LibraryEvent, RecordId};
use anime_archive::models::{AnimeFilters, NewAnime, SortOption};
use anime_archive::services::{AnimeLibrary, EnrichmentService, LibraryError};
use anime_archive::storage::{
    ANIME_KEY, CollectionStorage, FileStore, KeyValueStore, MemoryStore, StorageError,
};
use chrono::NaiveDate;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

/// Answers every search from a fixed catalogue keyed by lowercase query.
struct FakeMetadata {
    catalogue: Vec<(String, MalAnime)>,
    calls: AtomicUsize,
    delay: Duration,
}

impl FakeMetadata {
    fn new() -> Self {
        Self {
            catalogue: vec![
                (
                    "鬼滅の刃".to_string(),
                    mal("Kimetsu no Yaiba", 2019, &["Action"], "https://img.example/kny.jpg"),
                ),
                (
                    "x".to_string(),
                    mal("X", 2005, &["Comedy"], "https://img.example/x.jpg"),
                ),
            ],
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

fn mal(title: &str, year: i32, genres: &[&str], image: &str) -> MalAnime {
    MalAnime {
        mal_id: 1,
        title: title.to_string(),
        images: Some(MalImages {
            jpg: Some(MalImageSet {
                image_url: Some(image.to_string()),
                large_image_url: None,
            }),
        }),
        genres: Some(
            genres
                .iter()
                .map(|name| MalGenericInfo {
                    mal_id: 0,
                    name: (*name).to_string(),
                    url: None,
                })
                .collect(),
        ),
        year: Some(year),
        ..Default::default()
    }
}

#[async_trait::async_trait]
impl MetadataSource for FakeMetadata {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<MalAnime>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let query = query.to_lowercase();
        Ok(self
            .catalogue
            .iter()
            .filter(|(key, _)| *key == query)
            .map(|(_, anime)| anime.clone())
            .collect())
    }
}

/// A store whose writes can be switched off.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                path: key.into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

fn open_library(kv: Arc<dyn KeyValueStore>, metadata: Arc<FakeMetadata>) -> AnimeLibrary {
    let (tx, _) = broadcast::channel(64);
    AnimeLibrary::open(
        CollectionStorage::new(kv),
        EnrichmentService::new(metadata),
        tx,
        false,
    )
    .unwrap()
}

fn empty_library() -> (AnimeLibrary, Arc<FakeMetadata>) {
    let metadata = Arc::new(FakeMetadata::new());
    (open_library(Arc::new(MemoryStore::new()), metadata.clone()), metadata)
}

fn candidate(title: &str) -> NewAnime {
    NewAnime::titled(title, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap())
}

#[tokio::test]
async fn test_add_enriches_missing_fields() {
    let (library, _) = empty_library();

    let record = library.add(candidate("鬼滅の刃")).await.unwrap();

    assert_eq!(record.year, Some(2019));
    assert_eq!(record.genres, vec![Genre::Action]);
    assert_eq!(record.image_url.as_deref(), Some("https://img.example/kny.jpg"));
    assert_eq!(record.personal_rating, 3);
    assert_eq!(library.len().await, 1);
}

#[tokio::test]
async fn test_add_never_overwrites_caller_fields() {
    let (library, _) = empty_library();

    let mut input = candidate("X");
    input.year = Some(1999);
    let record = library.add(input).await.unwrap();

    assert_eq!(record.year, Some(1999));
    assert_eq!(record.genres, vec![Genre::Comedy]);
}

#[tokio::test]
async fn test_complete_candidate_skips_lookup() {
    let (library, metadata) = empty_library();

    let mut input = candidate("X");
    input.year = Some(2000);
    input.genres = vec![Genre::Drama];
    input.image_url = Some("https://img.example/own.jpg".to_string());
    library.add(input).await.unwrap();

    assert_eq!(metadata.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_duplicate_title_is_rejected_case_insensitively() {
    let (library, metadata) = empty_library();
    library.add(candidate("SAO")).await.unwrap();
    let calls_after_first = metadata.calls.load(Ordering::SeqCst);

    let err = library.add(candidate("sao")).await.unwrap_err();

    assert!(matches!(err, LibraryError::Duplicate { ref title } if title == "sao"));
    assert_eq!(library.len().await, 1);
    // Rejected before any lookup.
    assert_eq!(metadata.calls.load(Ordering::SeqCst), calls_after_first);
}

#[tokio::test]
async fn test_duplicate_check_compares_titles_as_entered() {
    let (library, _) = empty_library();
    library.add(candidate("SAO")).await.unwrap();

    let spaced = library.add(candidate(" SAO ")).await.unwrap();

    assert_eq!(spaced.title, " SAO ");
    assert_eq!(library.len().await, 2);
}

#[tokio::test]
async fn test_bulk_add_commits_non_duplicates_and_reports() {
    let (library, _) = empty_library();
    let mut events = library.subscribe();

    let result = library
        .add_bulk(vec![candidate("A"), candidate("B"), candidate("a")])
        .await;

    let Err(LibraryError::BulkDuplicates(report)) = result else {
        panic!("expected a duplicate report");
    };
    assert_eq!(report.added.len(), 2);
    assert_eq!(report.duplicates, vec!["a".to_string()]);

    let records = library.list().await;
    assert_eq!(records.iter().filter(|r| r.has_title("A")).count(), 1);
    assert_eq!(records.len(), 2);

    assert!(matches!(
        events.recv().await.unwrap(),
        LibraryEvent::BulkAddStarted { count: 3 }
    ));
}

#[tokio::test]
async fn test_bulk_add_without_duplicates_is_ok() {
    let (library, _) = empty_library();
    let mut bad = candidate("C");
    bad.watched_date = "someday".to_string();

    let report = library
        .add_bulk(vec![candidate("A"), bad, candidate("B")])
        .await
        .unwrap();

    assert_eq!(report.added.len(), 2);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].0, "C");
}

#[tokio::test]
async fn test_concurrent_adds_of_same_title_commit_once() {
    let metadata = Arc::new(FakeMetadata::new().with_delay(Duration::from_millis(50)));
    let library = Arc::new(open_library(Arc::new(MemoryStore::new()), metadata));

    let (first, second) = tokio::join!(
        library.add(candidate("鬼滅の刃")),
        library.add(candidate("鬼滅の刃"))
    );

    assert_eq!(usize::from(first.is_ok()) + usize::from(second.is_ok()), 1);
    assert_eq!(library.len().await, 1);
}

#[tokio::test]
async fn test_update_does_not_check_duplicates() {
    let (library, _) = empty_library();
    library.add(candidate("A")).await.unwrap();
    let mut b = library.add(candidate("B")).await.unwrap();

    b.title = "a".to_string();
    assert!(library.update(b).await.unwrap());

    let titles: Vec<_> = library.list().await.into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["A", "a"]);
}

#[tokio::test]
async fn test_update_unknown_id_returns_false() {
    let (library, _) = empty_library();
    let mut record = library.add(candidate("A")).await.unwrap();
    record.id = RecordId::from("nope");
    assert!(!library.update(record).await.unwrap());
}

#[tokio::test]
async fn test_delete_absent_is_noop() {
    let (library, _) = empty_library();
    library.add(candidate("A")).await.unwrap();
    let before = library.export().await.unwrap();

    library.delete(&RecordId::from("missing")).await.unwrap();

    assert_eq!(library.len().await, 1);
    assert_eq!(library.export().await.unwrap(), before);
}

#[tokio::test]
async fn test_delete_bulk_removes_listed() {
    let (library, _) = empty_library();
    let a = library.add(candidate("A")).await.unwrap();
    library.add(candidate("B")).await.unwrap();
    let c = library.add(candidate("C")).await.unwrap();

    library
        .delete_bulk(&[a.id, RecordId::from("missing"), c.id])
        .await
        .unwrap();

    let titles: Vec<_> = library.list().await.into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["B"]);
}

#[tokio::test]
async fn test_mark_rewatched_sets_today() {
    let (library, _) = empty_library();
    let record = library.add(candidate("A")).await.unwrap();

    library.mark_rewatched(&record.id).await.unwrap();

    let updated = library.get(&record.id).await.unwrap();
    assert_eq!(
        updated.watched_date,
        chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
    );
}

#[tokio::test]
async fn test_export_import_round_trip_is_identity() {
    let (library, _) = empty_library();
    library.add(candidate("鬼滅の刃")).await.unwrap();
    library.add(candidate("B")).await.unwrap();
    let exported = library.export().await.unwrap();
    let before = library.list().await;

    let count = library.import(&exported).await.unwrap();

    assert_eq!(count, 2);
    assert_eq!(library.list().await, before);
    assert_eq!(library.export().await.unwrap(), exported);
}

#[tokio::test]
async fn test_import_keeps_loosely_typed_entries_across_saves() {
    let (library, _) = empty_library();
    let blob = r#"[
        {"id":"1","title":"A","genres":["アクション"],"personalRating":4,"watchedDate":"2024-01-01"},
        {"id":2,"title":"B","personalRating":3,"watchedDate":"2024-01-02"},
        {"id":"3","title":"C","genres":["冒険"],"watchedDate":"2024-01-03"},
        {"id":"4","title":"D","personalRating":3.5,"watchedDate":"2024-01-04"}
    ]"#;

    let count = library.import(blob).await.unwrap();

    // The numeric id is readable; the other two are kept as stored.
    assert_eq!(count, 2);
    assert!(library.get(&RecordId::from("2")).await.is_some());

    library.delete(&RecordId::from("1")).await.unwrap();

    let stored: Vec<serde_json::Value> =
        serde_json::from_str(&library.export().await.unwrap()).unwrap();
    let titles: Vec<&str> = stored.iter().filter_map(|e| e["title"].as_str()).collect();
    assert_eq!(titles, ["B", "C", "D"]);
    assert_eq!(stored[1]["genres"][0], "冒険");
    assert_eq!(stored[2]["personalRating"], 3.5);
}

#[tokio::test]
async fn test_import_rejects_non_array_without_change() {
    let (library, _) = empty_library();
    library.add(candidate("A")).await.unwrap();

    assert!(matches!(
        library.import(r#"{"title":"x"}"#).await,
        Err(LibraryError::Import(_))
    ));
    assert!(matches!(
        library.import("not json").await,
        Err(LibraryError::Import(_))
    ));
    assert_eq!(library.len().await, 1);
}

#[tokio::test]
async fn test_failed_write_rolls_back() {
    let store = Arc::new(FlakyStore::default());
    let library = open_library(store.clone(), Arc::new(FakeMetadata::new()));
    let a = library.add(candidate("A")).await.unwrap();

    store.fail_writes.store(true, Ordering::SeqCst);

    assert!(matches!(
        library.add(candidate("B")).await,
        Err(LibraryError::Storage(_))
    ));
    assert!(library.delete(&a.id).await.is_err());
    assert!(library.mark_rewatched(&a.id).await.is_err());

    let records = library.list().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0], a);
}

#[tokio::test]
async fn test_validation_errors_are_not_persisted() {
    let (library, _) = empty_library();

    let mut bad_rating = candidate("A");
    bad_rating.personal_rating = 6;
    assert!(matches!(
        library.add(bad_rating).await,
        Err(LibraryError::Validation(_))
    ));
    assert!(matches!(
        library.add(candidate("  ")).await,
        Err(LibraryError::Validation(_))
    ));
    assert!(library.is_empty().await);
}

#[tokio::test]
async fn test_view_and_stats_over_seeded_collection() {
    let (tx, _) = broadcast::channel(8);
    let library = AnimeLibrary::open(
        CollectionStorage::new(Arc::new(MemoryStore::new())),
        EnrichmentService::new(Arc::new(FakeMetadata::new())),
        tx,
        true,
    )
    .unwrap();

    let filters = AnimeFilters {
        selected_genres: vec![Genre::Comedy],
        sort_by: SortOption::WatchedDateDesc,
        ..Default::default()
    };
    let titles: Vec<_> = library
        .view(&filters)
        .await
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["よつばと！", "スパイファミリー"]);

    let stats = library.stats().await;
    assert_eq!(stats.total, 5);
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    let library = open_library(kv.clone(), Arc::new(FakeMetadata::new()));
    let record = library.add(candidate("鬼滅の刃")).await.unwrap();
    drop(library);

    assert!(dir.path().join(format!("{ANIME_KEY}.json")).exists());

    let reopened = open_library(kv, Arc::new(FakeMetadata::new()));
    assert_eq!(reopened.get(&record.id).await, Some(record));
}
