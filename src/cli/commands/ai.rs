use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

use crate::models::NewAnime;
use crate::models::anime::today;
use crate::services::{IdentifyResult, LibraryError};
use crate::services::identify::strip_html_tags;
use crate::state::SharedState;

pub async fn cmd_chat(state: &SharedState, prompt: &str) -> anyhow::Result<()> {
    let Some(reply) = state.ai.chat_optimize(prompt).await else {
        println!("No reply from the AI backend at {}.", state.ai.base_url());
        println!("Is 'anime-archive serve' running?");
        return Ok(());
    };

    println!("{}", strip_html_tags(&reply).trim());
    Ok(())
}

pub async fn cmd_identify(state: &SharedState, image: &Path, add: bool) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(image).with_context(|| format!("Failed to read {}", image.display()))?;
    let encoded = STANDARD.encode(bytes);

    println!("Identifying {}...", image.display());

    let Some(reply) = state.ai.image_identify(&encoded).await else {
        println!("No reply from the AI backend at {}.", state.ai.base_url());
        return Ok(());
    };

    let Some(result) = IdentifyResult::parse(&reply) else {
        println!("Could not work out the title. Try another image.");
        return Ok(());
    };

    println!();
    println!("「{}」", result.title);
    println!(
        "Confidence: {}% ({})",
        result.confidence_percent,
        result.confidence()
    );

    if add {
        match state
            .library
            .add(NewAnime::titled(result.title.clone(), today()))
            .await
        {
            Ok(record) => println!("✓ Added: {} (ID: {})", record.title, record.id),
            Err(e @ LibraryError::Duplicate { .. }) => println!("{e}"),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
