//! The record store and its reconciliation rules.
//!
//! [`AnimeLibrary`] owns the in-memory collection and mirrors every mutation
//! to storage before it becomes visible. Adds are enriched from the metadata
//! source and rejected when a record with the same title (ignoring case)
//! already exists.

use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::domain::{LibraryEvent, RecordId};
use crate::models::anime::{MAX_RATING, format_date, parse_date, today};
use crate::models::{AnimeFilters, AnimeRecord, NewAnime};
use crate::services::enrichment::EnrichmentService;
use crate::services::stats::LibraryStats;
use crate::services::view;
use crate::storage::{CollectionStorage, StorageError};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("「{title}」はすでにリストに追加されています")]
    Duplicate { title: String },

    #[error("{count}件のアニメが重複しています:\n{titles}", count = .0.duplicates.len(), titles = .0.duplicates.join("\n"))]
    BulkDuplicates(BulkAddReport),

    #[error("Invalid record: {0}")]
    Validation(String),

    #[error("Import failed: {0}")]
    Import(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Outcome of a bulk add. Everything in `added` is committed regardless of
/// whether the call as a whole reported failure.
#[derive(Debug, Clone, Default)]
pub struct BulkAddReport {
    pub added: Vec<AnimeRecord>,
    pub duplicates: Vec<String>,
    pub rejected: Vec<(String, String)>,
}

pub struct AnimeLibrary {
    storage: CollectionStorage,
    records: RwLock<Vec<AnimeRecord>>,
    /// Stored entries that could not be read as records. Written back on
    /// every save, after the records.
    retained: RwLock<Vec<Value>>,
    enrichment: EnrichmentService,
    event_bus: broadcast::Sender<LibraryEvent>,
}

impl AnimeLibrary {
    /// Loads the collection from storage (seeding sample data on first run
    /// when `seed` is set).
    pub fn open(
        storage: CollectionStorage,
        enrichment: EnrichmentService,
        event_bus: broadcast::Sender<LibraryEvent>,
        seed: bool,
    ) -> Result<Self, LibraryError> {
        let collection = storage.load(seed)?;
        info!(
            count = collection.records.len(),
            retained = collection.retained.len(),
            "Loaded anime collection"
        );

        Ok(Self {
            storage,
            records: RwLock::new(collection.records),
            retained: RwLock::new(collection.retained),
            enrichment,
            event_bus,
        })
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.event_bus.subscribe()
    }

    /// Writes `records` together with the retained entries. Callers hold the
    /// records write lock.
    async fn persist(&self, records: &[AnimeRecord]) -> Result<(), StorageError> {
        let retained = self.retained.read().await;
        self.storage.save(records, &retained)
    }

    fn emit(&self, event: LibraryEvent) {
        // No subscribers is fine.
        let _ = self.event_bus.send(event);
    }

    pub async fn list(&self) -> Vec<AnimeRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn get(&self, id: &RecordId) -> Option<AnimeRecord> {
        self.records.read().await.iter().find(|r| &r.id == id).cloned()
    }

    /// Filtered and sorted projection of the collection.
    pub async fn view(&self, filters: &AnimeFilters) -> Vec<AnimeRecord> {
        view::filter_and_sort(&self.records.read().await, filters)
    }

    pub async fn stats(&self) -> LibraryStats {
        LibraryStats::compute(&self.records.read().await)
    }

    pub async fn contains_title(&self, title: &str) -> bool {
        self.records.read().await.iter().any(|r| r.has_title(title))
    }

    /// Adds a new record.
    ///
    /// Fails with [`LibraryError::Duplicate`] if a record with the same title
    /// exists, either before the metadata lookup or once it completes.
    pub async fn add(&self, mut candidate: NewAnime) -> Result<AnimeRecord, LibraryError> {
        validate_candidate(&candidate)?;

        if self.contains_title(&candidate.title).await {
            debug!(title = %candidate.title, "Duplicate title rejected");
            return Err(LibraryError::Duplicate {
                title: candidate.title,
            });
        }

        let filled = self.enrichment.enrich(&mut candidate).await;
        if filled.any() {
            debug!(title = %candidate.title, ?filled, "Enriched candidate");
        }

        let mut records = self.records.write().await;
        // Another add may have committed the same title while we were
        // waiting on the lookup.
        if records.iter().any(|r| r.has_title(&candidate.title)) {
            return Err(LibraryError::Duplicate {
                title: candidate.title,
            });
        }

        let record = AnimeRecord::from_candidate(RecordId::generate(), candidate);
        records.push(record.clone());
        if let Err(e) = self.persist(&records).await {
            records.pop();
            return Err(e.into());
        }
        drop(records);

        info!(id = %record.id, title = %record.title, "Added anime");
        self.emit(LibraryEvent::RecordAdded {
            id: record.id.clone(),
            title: record.title.clone(),
        });

        Ok(record)
    }

    /// Adds candidates one after another, each fully completing (lookup
    /// included) before the next starts.
    ///
    /// Duplicates and invalid candidates are skipped without stopping the
    /// batch. If any duplicate was seen the call returns
    /// [`LibraryError::BulkDuplicates`] even though the rest was committed.
    pub async fn add_bulk(&self, candidates: Vec<NewAnime>) -> Result<BulkAddReport, LibraryError> {
        let total = candidates.len();
        info!(count = total, "Starting bulk add");
        self.emit(LibraryEvent::BulkAddStarted { count: total });

        let mut report = BulkAddReport::default();

        for candidate in candidates {
            let title = candidate.title.clone();
            match self.add(candidate).await {
                Ok(record) => report.added.push(record),
                Err(LibraryError::Duplicate { title }) => report.duplicates.push(title),
                Err(LibraryError::Validation(reason)) => {
                    warn!(title = %title, "Skipping invalid candidate: {}", reason);
                    report.rejected.push((title, reason));
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            added = report.added.len(),
            duplicates = report.duplicates.len(),
            rejected = report.rejected.len(),
            "Bulk add finished"
        );
        self.emit(LibraryEvent::BulkAddFinished {
            added: report.added.len(),
            duplicates: report.duplicates.len(),
            rejected: report.rejected.len(),
        });

        if report.duplicates.is_empty() {
            Ok(report)
        } else {
            Err(LibraryError::BulkDuplicates(report))
        }
    }

    /// Replaces the record with the same id. Titles are not re-checked for
    /// duplicates and no lookup is made. Returns `false` if the id is unknown.
    pub async fn update(&self, record: AnimeRecord) -> Result<bool, LibraryError> {
        validate_fields(&record.title, record.personal_rating, &record.watched_date)?;

        let mut records = self.records.write().await;
        let Some(index) = records.iter().position(|r| r.id == record.id) else {
            return Ok(false);
        };

        let previous = std::mem::replace(&mut records[index], record);
        if let Err(e) = self.persist(&records).await {
            records[index] = previous;
            return Err(e.into());
        }
        let id = records[index].id.clone();
        drop(records);

        self.emit(LibraryEvent::RecordUpdated { id });
        Ok(true)
    }

    /// Removes a record. Unknown ids are ignored.
    pub async fn delete(&self, id: &RecordId) -> Result<(), LibraryError> {
        self.delete_bulk(std::slice::from_ref(id)).await
    }

    /// Removes every listed record with a single write. Unknown ids are
    /// ignored.
    pub async fn delete_bulk(&self, ids: &[RecordId]) -> Result<(), LibraryError> {
        let wanted: HashSet<&RecordId> = ids.iter().collect();

        let mut records = self.records.write().await;
        let (removed, kept): (Vec<AnimeRecord>, Vec<AnimeRecord>) = records
            .iter()
            .cloned()
            .partition(|r| wanted.contains(&r.id));

        if removed.is_empty() {
            return Ok(());
        }

        // Memory is only touched once the write has gone through.
        self.persist(&kept).await?;
        *records = kept;
        drop(records);

        let ids: Vec<RecordId> = removed.into_iter().map(|r| r.id).collect();
        info!(count = ids.len(), "Deleted anime");
        self.emit(LibraryEvent::RecordsDeleted { ids });
        Ok(())
    }

    /// Stamps today's date as the watched date. Unknown ids are ignored.
    pub async fn mark_rewatched(&self, id: &RecordId) -> Result<(), LibraryError> {
        let watched_date = format_date(today());

        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|r| &r.id == id) else {
            return Ok(());
        };

        let previous = std::mem::replace(&mut record.watched_date, watched_date.clone());
        if let Err(e) = self.persist(&records).await {
            if let Some(record) = records.iter_mut().find(|r| &r.id == id) {
                record.watched_date = previous;
            }
            return Err(e.into());
        }
        drop(records);

        self.emit(LibraryEvent::RecordRewatched {
            id: id.clone(),
            watched_date,
        });
        Ok(())
    }

    /// The stored collection exactly as persisted.
    pub async fn export(&self) -> Result<String, LibraryError> {
        // Hold the read lock so a concurrent write cannot interleave.
        let _guard = self.records.read().await;
        Ok(self.storage.export()?)
    }

    /// Replaces the whole collection with `json`, which must be a JSON array.
    /// Returns the number of records now loaded. Entries that are not readable
    /// records stay in storage untouched.
    pub async fn import(&self, json: &str) -> Result<usize, LibraryError> {
        let mut records = self.records.write().await;

        self.storage.import(json).map_err(|e| match e {
            StorageError::Json(e) => LibraryError::Import(e.to_string()),
            StorageError::NotAnArray(_) => {
                LibraryError::Import("data must be a JSON array".to_string())
            }
            other => LibraryError::Storage(other),
        })?;

        let collection = self.storage.load(false)?;
        let retained = collection.retained.len();
        *records = collection.records;
        *self.retained.write().await = collection.retained;
        let count = records.len();
        drop(records);

        if retained > 0 {
            warn!(retained, "Imported entries that are not readable records were kept as-is");
        }
        info!(count, "Imported collection");
        self.emit(LibraryEvent::CollectionImported { count });
        Ok(count)
    }
}

/// Splits pasted text into one candidate per non-blank line.
#[must_use]
pub fn bulk_candidates_from_text(text: &str, watched_on: chrono::NaiveDate) -> Vec<NewAnime> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|title| {
            let mut candidate = NewAnime::titled(title, watched_on);
            candidate.notes = Some(String::new());
            candidate
        })
        .collect()
}

fn validate_candidate(candidate: &NewAnime) -> Result<(), LibraryError> {
    validate_fields(
        &candidate.title,
        candidate.personal_rating,
        &candidate.watched_date,
    )
}

fn validate_fields(title: &str, rating: u8, watched_date: &str) -> Result<(), LibraryError> {
    if title.trim().is_empty() {
        return Err(LibraryError::Validation("タイトルは必須です".to_string()));
    }

    if rating > MAX_RATING {
        return Err(LibraryError::Validation(format!(
            "Rating must be between 0 and {MAX_RATING}, got {rating}"
        )));
    }

    if watched_date.trim().is_empty() {
        return Err(LibraryError::Validation("視聴日は必須です".to_string()));
    }

    if parse_date(watched_date).is_none() {
        return Err(LibraryError::Validation(format!(
            "Watched date must be YYYY-MM-DD, got '{watched_date}'"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_bulk_candidates_from_text() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let candidates = bulk_candidates_from_text("  鬼滅の刃 \n\n  \nSAO\r\n", date);
        let titles: Vec<_> = candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["鬼滅の刃", "SAO"]);
        assert_eq!(candidates[0].personal_rating, 3);
        assert_eq!(candidates[0].watched_date, "2024-06-01");
        assert!(candidates[0].genres.is_empty());
    }

    #[test]
    fn test_validation() {
        assert!(validate_fields("A", 3, "2024-01-01").is_ok());
        assert!(validate_fields("   ", 3, "2024-01-01").is_err());
        assert!(validate_fields("A", 6, "2024-01-01").is_err());
        assert!(validate_fields("A", 0, "").is_err());
        assert!(validate_fields("A", 0, "yesterday").is_err());
    }

    #[test]
    fn test_bulk_duplicate_message_lists_titles() {
        let report = BulkAddReport {
            added: Vec::new(),
            duplicates: vec!["A".to_string(), "B".to_string()],
            rejected: Vec::new(),
        };
        let message = LibraryError::BulkDuplicates(report).to_string();
        assert!(message.starts_with("2件"));
        assert!(message.contains("A\nB"));
    }
}
