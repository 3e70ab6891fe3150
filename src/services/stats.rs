use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::Genre;
use crate::models::AnimeRecord;
use crate::models::anime::MAX_RATING;

/// Aggregates shown on the statistics page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total: usize,
    pub average_rating: f64,
    /// Every genre, in declaration order, with its record count.
    pub genre_frequency: Vec<(Genre, usize)>,
    /// Counts for ratings 1 through 5. Unrated records are not counted.
    pub rating_distribution: BTreeMap<u8, usize>,
    /// Records per year of the watched date.
    pub yearly_watch_counts: BTreeMap<i32, usize>,
}

impl LibraryStats {
    #[must_use]
    pub fn compute(records: &[AnimeRecord]) -> Self {
        let total = records.len();

        let average_rating = if total == 0 {
            0.0
        } else {
            let sum: u32 = records.iter().map(|r| u32::from(r.personal_rating)).sum();
            f64::from(sum) / total as f64
        };

        let genre_frequency = Genre::ALL
            .iter()
            .map(|genre| {
                let count = records.iter().filter(|r| r.genres.contains(genre)).count();
                (*genre, count)
            })
            .collect();

        let mut rating_distribution: BTreeMap<u8, usize> =
            (1..=MAX_RATING).map(|rating| (rating, 0)).collect();
        for record in records {
            if let Some(count) = rating_distribution.get_mut(&record.personal_rating) {
                *count += 1;
            }
        }

        let mut yearly_watch_counts = BTreeMap::new();
        for date in records.iter().filter_map(AnimeRecord::watched_on) {
            *yearly_watch_counts.entry(chrono::Datelike::year(&date)).or_insert(0) += 1;
        }

        Self {
            total,
            average_rating,
            genre_frequency,
            rating_distribution,
            yearly_watch_counts,
        }
    }

    /// The genres that actually occur, most frequent first.
    #[must_use]
    pub fn top_genres(&self) -> Vec<(Genre, usize)> {
        let mut genres: Vec<_> = self
            .genre_frequency
            .iter()
            .copied()
            .filter(|(_, count)| *count > 0)
            .collect();
        genres.sort_by(|a, b| b.1.cmp(&a.1));
        genres
    }
}
