//! User-defined named groupings of records.
//!
//! Lists hold record ids only. Deleting a record leaves any list entries
//! pointing at it in place; [`CustomListService::resolve`] skips them.

use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::info;

use crate::domain::{LibraryEvent, ListId, RecordId};
use crate::models::{AnimeRecord, CustomList, ListUpdate};
use crate::services::library::LibraryError;
use crate::storage::{CUSTOM_LISTS_KEY, KeyValueStore, read_json, write_json};

pub struct CustomListService {
    kv: Arc<dyn KeyValueStore>,
    lists: RwLock<Vec<CustomList>>,
    event_bus: broadcast::Sender<LibraryEvent>,
}

impl CustomListService {
    pub fn open(
        kv: Arc<dyn KeyValueStore>,
        event_bus: broadcast::Sender<LibraryEvent>,
    ) -> Result<Self, LibraryError> {
        let lists: Vec<CustomList> = read_json(kv.as_ref(), CUSTOM_LISTS_KEY)?.unwrap_or_default();
        info!(count = lists.len(), "Loaded custom lists");

        Ok(Self {
            kv,
            lists: RwLock::new(lists),
            event_bus,
        })
    }

    pub async fn lists(&self) -> Vec<CustomList> {
        self.lists.read().await.clone()
    }

    pub async fn get(&self, list_id: &ListId) -> Option<CustomList> {
        self.lists
            .read()
            .await
            .iter()
            .find(|l| &l.id == list_id)
            .cloned()
    }

    pub async fn create(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<CustomList, LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::Validation("リスト名は必須です".to_string()));
        }

        let list = CustomList::new(name, description.filter(|d| !d.trim().is_empty()));

        let mut lists = self.lists.write().await;
        lists.push(list.clone());
        if let Err(e) = write_json(self.kv.as_ref(), CUSTOM_LISTS_KEY, lists.as_slice()) {
            lists.pop();
            return Err(e.into());
        }
        drop(lists);

        info!(list_id = %list.id, name = %list.name, "Created custom list");
        self.emit(LibraryEvent::CustomListChanged {
            list_id: list.id.clone(),
        });
        Ok(list)
    }

    /// Returns `false` when no list has this id.
    pub async fn delete(&self, list_id: &ListId) -> Result<bool, LibraryError> {
        let mut lists = self.lists.write().await;
        let kept: Vec<CustomList> = lists.iter().filter(|l| &l.id != list_id).cloned().collect();
        if kept.len() == lists.len() {
            return Ok(false);
        }

        write_json(self.kv.as_ref(), CUSTOM_LISTS_KEY, kept.as_slice())?;
        *lists = kept;
        drop(lists);

        info!(list_id = %list_id, "Deleted custom list");
        self.emit(LibraryEvent::CustomListDeleted {
            list_id: list_id.clone(),
        });
        Ok(true)
    }

    pub async fn update(&self, list_id: &ListId, update: ListUpdate) -> Result<bool, LibraryError> {
        if let Some(name) = &update.name
            && name.trim().is_empty()
        {
            return Err(LibraryError::Validation("リスト名は必須です".to_string()));
        }

        self.modify(list_id, |list| {
            let mut changed = false;
            if let Some(name) = update.name {
                changed |= list.name != name.trim();
                list.name = name.trim().to_string();
            }
            if let Some(description) = update.description {
                changed |= list.description != description;
                list.description = description;
            }
            changed
        })
        .await
    }

    /// Adds a record to a list, keeping membership unique and in insertion
    /// order.
    pub async fn add_anime(&self, list_id: &ListId, anime_id: RecordId) -> Result<bool, LibraryError> {
        self.modify(list_id, |list| list.insert(anime_id)).await
    }

    pub async fn remove_anime(&self, list_id: &ListId, anime_id: &RecordId) -> Result<bool, LibraryError> {
        self.modify(list_id, |list| list.remove(anime_id)).await
    }

    /// The list's members that still exist in `records`, in list order.
    pub async fn resolve(&self, list_id: &ListId, records: &[AnimeRecord]) -> Vec<AnimeRecord> {
        let Some(list) = self.get(list_id).await else {
            return Vec::new();
        };

        list.anime_ids
            .iter()
            .filter_map(|id| records.iter().find(|r| &r.id == id))
            .cloned()
            .collect()
    }

    /// Applies `change` to a copy of the list and persists it if anything
    /// changed. Unknown list ids are a no-op.
    async fn modify<F>(&self, list_id: &ListId, change: F) -> Result<bool, LibraryError>
    where
        F: FnOnce(&mut CustomList) -> bool,
    {
        let mut lists = self.lists.write().await;
        let Some(index) = lists.iter().position(|l| &l.id == list_id) else {
            return Ok(false);
        };

        let mut updated = lists[index].clone();
        if !change(&mut updated) {
            return Ok(false);
        }

        let previous = std::mem::replace(&mut lists[index], updated);
        if let Err(e) = write_json(self.kv.as_ref(), CUSTOM_LISTS_KEY, lists.as_slice()) {
            lists[index] = previous;
            return Err(e.into());
        }
        drop(lists);

        self.emit(LibraryEvent::CustomListChanged {
            list_id: list_id.clone(),
        });
        Ok(true)
    }

    fn emit(&self, event: LibraryEvent) {
        let _ = self.event_bus.send(event);
    }
}
