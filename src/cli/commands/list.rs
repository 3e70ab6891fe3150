//! List anime command handler

use super::print_record;
use crate::domain::Genre;
use crate::models::{AnimeFilters, SortOption};
use crate::state::SharedState;

pub async fn cmd_list_anime(
    state: &SharedState,
    search: Option<String>,
    genres: Vec<Genre>,
    sort: SortOption,
) -> anyhow::Result<()> {
    let total = state.library.len().await;

    if total == 0 {
        println!("The collection is empty.");
        println!();
        println!("Add anime with: anime-archive add \"title\"");
        return Ok(());
    }

    let filters = AnimeFilters {
        search_term: search.unwrap_or_default(),
        selected_genres: genres,
        sort_by: sort,
    };
    let records = state.library.view(&filters).await;

    if records.len() == total {
        println!("Anime ({total} total, sorted by {sort})");
    } else {
        println!("Anime ({} of {total}, sorted by {sort})", records.len());
    }
    println!("{:-<70}", "");

    for record in &records {
        print_record(record);
    }

    if records.is_empty() {
        println!("Nothing matches the given filters.");
    }

    Ok(())
}
