//! Events emitted by the record store.
//!
//! Presentation layers subscribe to these instead of polling the collection.

use serde::Serialize;

use super::{ListId, RecordId};

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum LibraryEvent {
    RecordAdded {
        id: RecordId,
        title: String,
    },
    RecordUpdated {
        id: RecordId,
    },
    RecordsDeleted {
        ids: Vec<RecordId>,
    },
    RecordRewatched {
        id: RecordId,
        watched_date: String,
    },

    BulkAddStarted {
        count: usize,
    },
    BulkAddFinished {
        added: usize,
        duplicates: usize,
        rejected: usize,
    },

    CollectionImported {
        count: usize,
    },

    CustomListChanged {
        list_id: ListId,
    },
    CustomListDeleted {
        list_id: ListId,
    },
}
