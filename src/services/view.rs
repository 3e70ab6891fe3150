use std::cmp::Ordering;

use crate::models::{AnimeFilters, AnimeRecord, SortOption};

/// Applies search, genre filter and sort. The input order breaks ties.
#[must_use]
pub fn filter_and_sort(records: &[AnimeRecord], filters: &AnimeFilters) -> Vec<AnimeRecord> {
    let term = filters.search_term.to_lowercase();

    let mut matched: Vec<AnimeRecord> = records
        .iter()
        .filter(|r| matches_search(r, &term))
        .filter(|r| {
            filters.selected_genres.is_empty()
                || r.genres.iter().any(|g| filters.selected_genres.contains(g))
        })
        .cloned()
        .collect();

    match filters.sort_by {
        SortOption::WatchedDateDesc => matched.sort_by(compare_watched_desc),
        SortOption::TitleAsc => matched.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.title.cmp(&b.title))
        }),
        SortOption::PersonalRatingDesc => {
            matched.sort_by(|a, b| b.personal_rating.cmp(&a.personal_rating));
        }
    }

    matched
}

fn matches_search(record: &AnimeRecord, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }

    record.title.to_lowercase().contains(term)
        || record
            .notes
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(term))
}

// Unparseable dates go last.
fn compare_watched_desc(a: &AnimeRecord, b: &AnimeRecord) -> Ordering {
    match (a.watched_on(), b.watched_on()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
