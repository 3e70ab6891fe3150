use super::print_record;
use crate::cli::RecordFields;
use crate::domain::RecordId;
use crate::services::LibraryError;
use crate::state::SharedState;

pub async fn cmd_edit_anime(
    state: &SharedState,
    id: &str,
    title: Option<String>,
    fields: RecordFields,
) -> anyhow::Result<()> {
    let id = RecordId::from(id);
    let Some(mut record) = state.library.get(&id).await else {
        println!("Anime with ID {id} not found.");
        println!("Use 'anime-archive list' to see IDs.");
        return Ok(());
    };

    if let Some(title) = title {
        record.title = title.trim().to_string();
    }
    if let Some(year) = fields.year {
        record.year = Some(year);
    }
    if !fields.genres.is_empty() {
        record.genres = fields.genres;
    }
    if let Some(rating) = fields.rating {
        record.personal_rating = rating;
    }
    if let Some(notes) = fields.notes {
        record.notes = Some(notes);
    }
    if let Some(image) = fields.image {
        record.image_url = Some(image).filter(|u| !u.is_empty());
    }
    if let Some(date) = fields.date {
        record.watched_date = date;
    }

    match state.library.update(record.clone()).await {
        Ok(true) => {
            println!("✓ Updated: {}", record.title);
            print_record(&record);
        }
        Ok(false) => println!("Anime with ID {id} not found."),
        Err(e @ LibraryError::Validation(_)) => println!("{e}"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

pub async fn cmd_rewatch(state: &SharedState, id: &str) -> anyhow::Result<()> {
    let id = RecordId::from(id);
    let Some(record) = state.library.get(&id).await else {
        println!("Anime with ID {id} not found.");
        return Ok(());
    };

    state.library.mark_rewatched(&id).await?;

    if let Some(updated) = state.library.get(&id).await {
        println!("✓ Rewatched: {} on {}", record.title, updated.watched_date);
    }
    Ok(())
}
