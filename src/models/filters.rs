use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::Genre;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOption {
    #[default]
    #[serde(rename = "watchedDate_desc")]
    WatchedDateDesc,
    #[serde(rename = "title_asc")]
    TitleAsc,
    #[serde(rename = "personalRating_desc")]
    PersonalRatingDesc,
}

impl SortOption {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WatchedDateDesc => "watchedDate_desc",
            Self::TitleAsc => "title_asc",
            Self::PersonalRatingDesc => "personalRating_desc",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watchedDate_desc" | "date" | "watched" => Ok(Self::WatchedDateDesc),
            "title_asc" | "title" => Ok(Self::TitleAsc),
            "personalRating_desc" | "rating" => Ok(Self::PersonalRatingDesc),
            other => Err(format!(
                "unknown sort option '{other}' (expected date, title or rating)"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeFilters {
    pub search_term: String,
    pub selected_genres: Vec<Genre>,
    pub sort_by: SortOption,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_option_parsing() {
        assert_eq!("title".parse::<SortOption>(), Ok(SortOption::TitleAsc));
        assert_eq!(
            "personalRating_desc".parse::<SortOption>(),
            Ok(SortOption::PersonalRatingDesc)
        );
        assert!("random".parse::<SortOption>().is_err());
    }

    #[test]
    fn test_default_sort_is_watched_date() {
        assert_eq!(AnimeFilters::default().sort_by, SortOption::WatchedDateDesc);
    }
}
