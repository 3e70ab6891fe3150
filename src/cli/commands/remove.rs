use super::confirm;
use crate::domain::RecordId;
use crate::state::SharedState;

pub async fn cmd_remove_anime(state: &SharedState, ids: &[String], yes: bool) -> anyhow::Result<()> {
    let mut found = Vec::new();
    for id in ids.iter().map(|s| RecordId::from(s.as_str())) {
        match state.library.get(&id).await {
            Some(record) => found.push(record),
            None => println!("Anime with ID {id} not found, skipping."),
        }
    }

    if found.is_empty() {
        println!("Use 'anime-archive list' to see IDs.");
        return Ok(());
    }

    let titles: Vec<&str> = found.iter().map(|r| r.title.as_str()).collect();
    if !yes && !confirm(&format!("Remove {}?", titles.join(", ")))? {
        println!("Cancelled.");
        return Ok(());
    }

    let ids: Vec<RecordId> = found.iter().map(|r| r.id.clone()).collect();
    state.library.delete_bulk(&ids).await?;

    for title in titles {
        println!("✓ Removed: {title}");
    }
    Ok(())
}
