use super::print_record;
use crate::domain::{ListId, RecordId};
use crate::models::ListUpdate;
use crate::services::LibraryError;
use crate::state::SharedState;

pub async fn cmd_lists_list(state: &SharedState) -> anyhow::Result<()> {
    let lists = state.custom_lists.lists().await;

    if lists.is_empty() {
        println!("No custom lists.");
        println!();
        println!("Create one with: anime-archive lists create \"name\"");
        return Ok(());
    }

    println!("Custom Lists ({} total)", lists.len());
    println!("{:-<60}", "");
    for list in lists {
        println!("• {} ({} anime)", list.name, list.anime_ids.len());
        println!("  ID: {}", list.id);
        if let Some(description) = &list.description {
            println!("  {description}");
        }
    }

    Ok(())
}

pub async fn cmd_lists_create(
    state: &SharedState,
    name: &str,
    description: Option<String>,
) -> anyhow::Result<()> {
    match state.custom_lists.create(name, description).await {
        Ok(list) => println!("✓ Created list: {} (ID: {})", list.name, list.id),
        Err(e @ LibraryError::Validation(_)) => println!("{e}"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub async fn cmd_lists_delete(state: &SharedState, list_id: &str) -> anyhow::Result<()> {
    let list_id = ListId::from(list_id);
    if state.custom_lists.delete(&list_id).await? {
        println!("✓ Deleted list {list_id}");
    } else {
        println!("List {list_id} not found.");
    }
    Ok(())
}

pub async fn cmd_lists_update(
    state: &SharedState,
    list_id: &str,
    update: ListUpdate,
) -> anyhow::Result<()> {
    let list_id = ListId::from(list_id);
    match state.custom_lists.update(&list_id, update).await {
        Ok(true) => println!("✓ Updated list {list_id}"),
        Ok(false) => println!("Nothing changed (unknown list or same values)."),
        Err(e @ LibraryError::Validation(_)) => println!("{e}"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub async fn cmd_lists_add(state: &SharedState, list_id: &str, anime_id: &str) -> anyhow::Result<()> {
    let list_id = ListId::from(list_id);
    let anime_id = RecordId::from(anime_id);

    let Some(record) = state.library.get(&anime_id).await else {
        println!("Anime with ID {anime_id} not found.");
        return Ok(());
    };

    if state.custom_lists.add_anime(&list_id, anime_id).await? {
        println!("✓ Added {} to list {list_id}", record.title);
    } else {
        println!("Not added (unknown list, or already a member).");
    }
    Ok(())
}

pub async fn cmd_lists_remove(
    state: &SharedState,
    list_id: &str,
    anime_id: &str,
) -> anyhow::Result<()> {
    let list_id = ListId::from(list_id);
    let anime_id = RecordId::from(anime_id);

    if state.custom_lists.remove_anime(&list_id, &anime_id).await? {
        println!("✓ Removed {anime_id} from list {list_id}");
    } else {
        println!("Not removed (unknown list, or not a member).");
    }
    Ok(())
}

pub async fn cmd_lists_show(state: &SharedState, list_id: &str) -> anyhow::Result<()> {
    let list_id = ListId::from(list_id);
    let Some(list) = state.custom_lists.get(&list_id).await else {
        println!("List {list_id} not found.");
        return Ok(());
    };

    let records = state.library.list().await;
    let members = state.custom_lists.resolve(&list_id, &records).await;

    println!("{} ({} anime)", list.name, members.len());
    if let Some(description) = &list.description {
        println!("{description}");
    }
    println!("{:-<60}", "");
    for record in &members {
        print_record(record);
    }

    Ok(())
}
