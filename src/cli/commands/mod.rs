mod add;
mod ai;
mod edit;
mod import;
mod list;
mod lists;
mod remove;
mod stats;

pub use add::{cmd_add_anime, cmd_bulk_add};
pub use ai::{cmd_chat, cmd_identify};
pub use edit::{cmd_edit_anime, cmd_rewatch};
pub use import::{cmd_export, cmd_import};
pub use list::cmd_list_anime;
pub use lists::{
    cmd_lists_add, cmd_lists_create, cmd_lists_delete, cmd_lists_list, cmd_lists_remove,
    cmd_lists_show, cmd_lists_update,
};
pub use remove::cmd_remove_anime;
pub use stats::cmd_stats;

use crate::domain::Genre;
use crate::models::AnimeRecord;

fn format_genres(genres: &[Genre]) -> String {
    if genres.is_empty() {
        return "-".to_string();
    }
    genres
        .iter()
        .map(|g| g.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

pub(crate) fn print_record(record: &AnimeRecord) {
    let year = record
        .year
        .map_or_else(|| "????".to_string(), |y| y.to_string());
    println!("• {} ({}) {}", record.title, year, stars(record.personal_rating));
    println!(
        "  ID: {} | Watched: {} | Genres: {}",
        record.id,
        record.watched_date,
        format_genres(&record.genres)
    );
    if let Some(notes) = record.notes.as_deref().filter(|n| !n.is_empty()) {
        println!("  {notes}");
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    println!("{prompt}");
    println!("Enter 'y' to confirm, anything else to cancel:");

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
