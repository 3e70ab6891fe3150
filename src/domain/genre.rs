//! The closed genre enumeration and the table that maps MyAnimeList genre
//! labels onto it.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    #[serde(rename = "アクション")]
    Action,
    #[serde(rename = "コメディ")]
    Comedy,
    #[serde(rename = "ドラマ")]
    Drama,
    #[serde(rename = "ファンタジー")]
    Fantasy,
    #[serde(rename = "SF")]
    SciFi,
    #[serde(rename = "日常")]
    SliceOfLife,
    #[serde(rename = "恋愛")]
    Romance,
    #[serde(rename = "スポーツ")]
    Sports,
    #[serde(rename = "ミステリー")]
    Mystery,
    #[serde(rename = "ホラー")]
    Horror,
    #[serde(rename = "その他")]
    Other,
}

/// External (Jikan) genre name to app genre. Anything not listed is dropped.
const EXTERNAL_GENRES: &[(&str, Genre)] = &[
    ("Action", Genre::Action),
    ("Comedy", Genre::Comedy),
    ("Drama", Genre::Drama),
    ("Fantasy", Genre::Fantasy),
    ("Sci-Fi", Genre::SciFi),
    ("Slice of Life", Genre::SliceOfLife),
    ("Romance", Genre::Romance),
    ("Sports", Genre::Sports),
    ("Mystery", Genre::Mystery),
    ("Horror", Genre::Horror),
    ("School", Genre::SliceOfLife),
    ("Music", Genre::Other),
    ("Adventure", Genre::Action),
    ("Supernatural", Genre::Fantasy),
];

impl Genre {
    pub const ALL: [Self; 11] = [
        Self::Action,
        Self::Comedy,
        Self::Drama,
        Self::Fantasy,
        Self::SciFi,
        Self::SliceOfLife,
        Self::Romance,
        Self::Sports,
        Self::Mystery,
        Self::Horror,
        Self::Other,
    ];

    /// The label stored on disk and shown to the user.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Action => "アクション",
            Self::Comedy => "コメディ",
            Self::Drama => "ドラマ",
            Self::Fantasy => "ファンタジー",
            Self::SciFi => "SF",
            Self::SliceOfLife => "日常",
            Self::Romance => "恋愛",
            Self::Sports => "スポーツ",
            Self::Mystery => "ミステリー",
            Self::Horror => "ホラー",
            Self::Other => "その他",
        }
    }

    /// Looks up a genre by its Japanese label or its English variant name
    /// (case-insensitive), for CLI input.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::ALL.into_iter().find(|g| {
            g.label() == input || format!("{g:?}").eq_ignore_ascii_case(input)
        })
    }

    /// Maps a single external genre label.
    #[must_use]
    pub fn from_external(name: &str) -> Option<Self> {
        EXTERNAL_GENRES
            .iter()
            .find(|(external, _)| *external == name)
            .map(|(_, genre)| *genre)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Translates a list of external genre labels.
///
/// Unknown labels are dropped and repeats collapse onto their first
/// occurrence. When nothing survives the result is `[Genre::Other]`.
#[must_use]
pub fn map_external_genres<'a, I>(names: I) -> Vec<Genre>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut mapped = Vec::new();
    for genre in names.into_iter().filter_map(Genre::from_external) {
        if !mapped.contains(&genre) {
            mapped.push(genre);
        }
    }

    if mapped.is_empty() {
        mapped.push(Genre::Other);
    }
    mapped
}
