use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Genre, RecordId};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const DEFAULT_RATING: u8 = 3;

pub const MAX_RATING: u8 = 5;

/// One tracked anime entry, as persisted in the collection blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeRecord {
    pub id: RecordId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub personal_rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub watched_date: String,
}

impl AnimeRecord {
    #[must_use]
    pub fn from_candidate(id: RecordId, candidate: NewAnime) -> Self {
        Self {
            id,
            title: candidate.title,
            image_url: candidate.image_url.filter(|u| !u.is_empty()),
            year: candidate.year,
            genres: candidate.genres,
            personal_rating: candidate.personal_rating,
            notes: candidate.notes,
            watched_date: candidate.watched_date,
        }
    }

    #[must_use]
    pub fn watched_on(&self) -> Option<NaiveDate> {
        parse_date(&self.watched_date)
    }

    /// Case-insensitive title equality, the duplicate signal.
    #[must_use]
    pub fn has_title(&self, title: &str) -> bool {
        self.title.to_lowercase() == title.to_lowercase()
    }
}

/// A record before it has been given an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnime {
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default = "default_rating")]
    pub personal_rating: u8,
    #[serde(default)]
    pub notes: Option<String>,
    pub watched_date: String,
}

const fn default_rating() -> u8 {
    DEFAULT_RATING
}

impl NewAnime {
    /// A bare title with the same defaults the entry form starts from.
    #[must_use]
    pub fn titled(title: impl Into<String>, watched_on: NaiveDate) -> Self {
        Self {
            title: title.into(),
            image_url: None,
            year: None,
            genres: Vec::new(),
            personal_rating: DEFAULT_RATING,
            notes: None,
            watched_date: format_date(watched_on),
        }
    }

    #[must_use]
    pub fn needs_image(&self) -> bool {
        self.image_url.as_deref().is_none_or(str::is_empty)
    }

    #[must_use]
    pub fn needs_year(&self) -> bool {
        matches!(self.year, None | Some(0))
    }

    #[must_use]
    pub fn needs_genres(&self) -> bool {
        self.genres.is_empty()
    }
}

#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[must_use]
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_uses_camel_case_fields() {
        let record = AnimeRecord {
            id: RecordId::from("1"),
            title: "進撃の巨人".to_string(),
            image_url: Some("https://cdn.myanimelist.net/images/anime/10/47347.jpg".to_string()),
            year: Some(2013),
            genres: vec![Genre::Action, Genre::Drama],
            personal_rating: 5,
            notes: None,
            watched_date: "2023-01-15".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["personalRating"], 5);
        assert_eq!(json["watchedDate"], "2023-01-15");
        assert!(json["imageUrl"].is_string());
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn test_candidate_fill_predicates() {
        let mut candidate = NewAnime::titled("Frieren", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(candidate.needs_image());
        assert!(candidate.needs_year());
        assert!(candidate.needs_genres());

        candidate.image_url = Some(String::new());
        assert!(candidate.needs_image());

        candidate.year = Some(2023);
        candidate.genres = vec![Genre::Fantasy];
        assert!(!candidate.needs_year());
        assert!(!candidate.needs_genres());
    }

    #[test]
    fn test_has_title_ignores_case() {
        let record = AnimeRecord::from_candidate(
            RecordId::from("1"),
            NewAnime::titled("SAO", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        );
        assert!(record.has_title("sao"));
        assert!(!record.has_title("sao2"));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2023-01-15"), NaiveDate::from_ymd_opt(2023, 1, 15));
        assert_eq!(parse_date("15/01/2023"), None);
    }
}
