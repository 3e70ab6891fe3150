use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::{KeyValueStore, StorageError, write_json};
use crate::domain::{Genre, RecordId};
use crate::models::AnimeRecord;

pub const ANIME_KEY: &str = "anime_archive_data";

pub const CUSTOM_LISTS_KEY: &str = "customLists";

/// Whole-collection persistence for anime records.
#[derive(Clone)]
pub struct CollectionStorage {
    kv: Arc<dyn KeyValueStore>,
}

impl CollectionStorage {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    #[must_use]
    pub fn kv(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    /// Loads the collection.
    ///
    /// On first run (nothing stored) the sample records are written and
    /// returned when `seed` is set; otherwise an empty collection is returned.
    /// Records saved with the legacy `coverImage` field are migrated and the
    /// result written back.
    pub fn load(&self, seed: bool) -> Result<StoredCollection, StorageError> {
        let Some(raw) = self.kv.get(ANIME_KEY)? else {
            if !seed {
                return Ok(StoredCollection::default());
            }
            let samples = sample_records();
            self.save(&samples, &[])?;
            info!(count = samples.len(), "Seeded collection with sample records");
            return Ok(StoredCollection {
                records: samples,
                retained: Vec::new(),
            });
        };

        let (collection, migrated) = decode_records(&raw)?;
        if migrated {
            info!("Migrated legacy coverImage fields to imageUrl");
            self.save(&collection.records, &collection.retained)?;
        }
        Ok(collection)
    }

    /// Writes the collection. `retained` entries are written back verbatim
    /// after the records.
    pub fn save(&self, records: &[AnimeRecord], retained: &[Value]) -> Result<(), StorageError> {
        if retained.is_empty() {
            return write_json(self.kv.as_ref(), ANIME_KEY, records);
        }

        let mut entries = Vec::with_capacity(records.len() + retained.len());
        for record in records {
            entries.push(serde_json::to_value(record)?);
        }
        entries.extend_from_slice(retained);
        write_json(self.kv.as_ref(), ANIME_KEY, &entries)
    }

    /// The raw stored blob, or `[]` when nothing has been stored yet.
    pub fn export(&self) -> Result<String, StorageError> {
        Ok(self.kv.get(ANIME_KEY)?.unwrap_or_else(|| "[]".to_string()))
    }

    /// Replaces the stored blob with `json` after checking that it parses
    /// and is an array. Individual entries are not validated.
    pub fn import(&self, json: &str) -> Result<(), StorageError> {
        let parsed: Value = serde_json::from_str(json)?;
        if !parsed.is_array() {
            return Err(StorageError::NotAnArray(ANIME_KEY.to_string()));
        }
        self.kv.set(ANIME_KEY, json)
    }
}

/// The decoded collection blob.
///
/// Entries that could not be read as records are kept in `retained` so that
/// they survive the next whole-collection write.
#[derive(Debug, Clone, Default)]
pub struct StoredCollection {
    pub records: Vec<AnimeRecord>,
    pub retained: Vec<Value>,
}

/// Decodes a stored collection blob. The flag reports whether any entry
/// needed the legacy field migration.
pub fn decode_records(raw: &str) -> Result<(StoredCollection, bool), StorageError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(entries) = value else {
        return Err(StorageError::NotAnArray(ANIME_KEY.to_string()));
    };

    let mut migrated = false;
    let mut collection = StoredCollection {
        records: Vec::with_capacity(entries.len()),
        retained: Vec::new(),
    };
    for (index, mut entry) in entries.into_iter().enumerate() {
        migrated |= migrate_legacy_fields(&mut entry);
        match AnimeRecord::deserialize(&entry) {
            Ok(record) => collection.records.push(record),
            Err(e) => {
                warn!(index, error = %e, "Keeping unreadable entry as-is");
                collection.retained.push(entry);
            }
        }
    }

    Ok((collection, migrated))
}

/// Moves `coverImage` into `imageUrl`. A non-empty `coverImage` wins over an
/// existing `imageUrl`.
fn migrate_legacy_fields(entry: &mut Value) -> bool {
    let Some(object) = entry.as_object_mut() else {
        return false;
    };
    let Some(cover) = object.remove("coverImage") else {
        return false;
    };

    if let Some(url) = cover.as_str().filter(|s| !s.is_empty()) {
        object.insert("imageUrl".to_string(), Value::String(url.to_string()));
    }
    true
}

#[allow(clippy::too_many_arguments)]
fn sample(
    id: &str,
    title: &str,
    year: i32,
    genres: &[Genre],
    rating: u8,
    notes: &str,
    watched_date: &str,
    image_url: &str,
) -> AnimeRecord {
    AnimeRecord {
        id: RecordId::from(id),
        title: title.to_string(),
        image_url: Some(image_url.to_string()),
        year: Some(year),
        genres: genres.to_vec(),
        personal_rating: rating,
        notes: Some(notes.to_string()),
        watched_date: watched_date.to_string(),
    }
}

#[must_use]
pub fn sample_records() -> Vec<AnimeRecord> {
    vec![
        sample(
            "1",
            "進撃の巨人",
            2013,
            &[Genre::Action, Genre::Drama, Genre::Fantasy],
            5,
            "壁の中の人類と巨人との戦い",
            "2023-01-15",
            "https://cdn.myanimelist.net/images/anime/10/47347.jpg",
        ),
        sample(
            "2",
            "ヴァイオレット・エヴァーガーデン",
            2018,
            &[Genre::Drama, Genre::Fantasy, Genre::SliceOfLife],
            4,
            "元軍人の少女が「愛してる」という言葉の意味を探す旅",
            "2022-11-20",
            "https://cdn.myanimelist.net/images/anime/1329/90618.jpg",
        ),
        sample(
            "3",
            "鬼滅の刃",
            2019,
            &[Genre::Action, Genre::Fantasy],
            4,
            "家族を鬼に殺された少年が鬼殺隊に入隊",
            "2022-05-10",
            "https://cdn.myanimelist.net/images/anime/1286/99889.jpg",
        ),
        sample(
            "4",
            "よつばと！",
            2003,
            &[Genre::Comedy, Genre::SliceOfLife],
            5,
            "5歳の女の子よつばの日常",
            "2023-03-22",
            "https://cdn.myanimelist.net/images/manga/5/259524.jpg",
        ),
        sample(
            "5",
            "スパイファミリー",
            2022,
            &[Genre::Action, Genre::Comedy, Genre::SliceOfLife],
            4,
            "スパイ、殺し屋、超能力者が偽装家族を結成",
            "2023-02-05",
            "https://cdn.myanimelist.net/images/anime/1441/122795.jpg",
        ),
    ]
}
