use serde::{Deserialize, Serialize};

use crate::domain::{ListId, RecordId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomList {
    pub id: ListId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub anime_ids: Vec<RecordId>,
}

impl CustomList {
    #[must_use]
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: ListId::generate(),
            name: name.into(),
            description,
            anime_ids: Vec::new(),
        }
    }

    /// Appends `id` unless it is already a member. Returns whether it was added.
    pub fn insert(&mut self, id: RecordId) -> bool {
        if self.anime_ids.contains(&id) {
            return false;
        }
        self.anime_ids.push(id);
        true
    }

    pub fn remove(&mut self, id: &RecordId) -> bool {
        let before = self.anime_ids.len();
        self.anime_ids.retain(|member| member != id);
        self.anime_ids.len() != before
    }
}

/// Partial update for a list's descriptive fields.
#[derive(Debug, Clone, Default)]
pub struct ListUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_set_like() {
        let mut list = CustomList::new("Favourites", None);
        assert!(list.insert(RecordId::from("a")));
        assert!(list.insert(RecordId::from("b")));
        assert!(!list.insert(RecordId::from("a")));
        assert_eq!(list.anime_ids, vec![RecordId::from("a"), RecordId::from("b")]);
    }

    #[test]
    fn test_persisted_shape() {
        let mut list = CustomList::new("Favourites", Some("best of".to_string()));
        list.insert(RecordId::from("1"));
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["animeIds"], serde_json::json!(["1"]));
        assert_eq!(json["description"], "best of");
    }
}
