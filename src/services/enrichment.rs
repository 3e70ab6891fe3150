//! Best-effort metadata backfill for new records.
//!
//! Enrichment only ever fills fields the caller left empty, and never fails:
//! any lookup problem leaves the candidate as it was.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::jikan::{MalAnime, MetadataSource};
use crate::domain::genre::map_external_genres;
use crate::models::NewAnime;

/// Which fields an enrichment pass filled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilledFields {
    pub image: bool,
    pub year: bool,
    pub genres: bool,
}

impl FilledFields {
    #[must_use]
    pub const fn any(self) -> bool {
        self.image || self.year || self.genres
    }
}

#[derive(Clone)]
pub struct EnrichmentService {
    source: Arc<dyn MetadataSource>,
}

impl EnrichmentService {
    #[must_use]
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self { source }
    }

    /// Looks the candidate's title up and fills missing image, year and
    /// genres from the best match.
    pub async fn enrich(&self, candidate: &mut NewAnime) -> FilledFields {
        let title = candidate.title.trim().to_string();
        if title.is_empty() {
            debug!("No title given, skipping metadata lookup");
            return FilledFields::default();
        }

        if !candidate.needs_image() && !candidate.needs_year() && !candidate.needs_genres() {
            debug!(title = %title, "Candidate already complete, skipping metadata lookup");
            return FilledFields::default();
        }

        let results = match self.source.search(&title).await {
            Ok(results) => results,
            Err(e) => {
                warn!(title = %title, "Metadata lookup failed: {}", e);
                metrics::counter!("enrichment_lookups_total", "outcome" => "error").increment(1);
                return FilledFields::default();
            }
        };

        let Some(best) = select_best_match(&title, &results) else {
            info!(title = %title, "No metadata found");
            metrics::counter!("enrichment_lookups_total", "outcome" => "empty").increment(1);
            return FilledFields::default();
        };

        debug!(title = %title, mal_id = best.mal_id, matched = %best.title, "Selected metadata match");
        metrics::counter!("enrichment_lookups_total", "outcome" => "matched").increment(1);

        apply_metadata(candidate, best)
    }
}

/// An exact (case-insensitive) match on any title variant, else the
/// highest-ranked result.
#[must_use]
pub fn select_best_match<'a>(title: &str, results: &'a [MalAnime]) -> Option<&'a MalAnime> {
    results
        .iter()
        .find(|anime| anime.matches_title(title))
        .or_else(|| results.first())
}

/// Copies metadata into the candidate's empty fields only.
pub fn apply_metadata(candidate: &mut NewAnime, anime: &MalAnime) -> FilledFields {
    let mut filled = FilledFields::default();

    if candidate.needs_image()
        && let Some(url) = anime.cover_image()
    {
        candidate.image_url = Some(url.to_string());
        filled.image = true;
    }

    if candidate.needs_year()
        && let Some(year) = anime.get_start_year()
    {
        candidate.year = Some(year);
        filled.year = true;
    }

    // An entry without any genres leaves ours untouched rather than
    // defaulting to "other".
    if candidate.needs_genres() && anime.genre_names().next().is_some() {
        candidate.genres = map_external_genres(anime.genre_names());
        filled.genres = true;
    }

    filled
}
