use anyhow::Context;
use std::path::Path;

use crate::services::LibraryError;
use crate::state::SharedState;

pub async fn cmd_export(state: &SharedState, output: Option<&Path>) -> anyhow::Result<()> {
    let json = state.library.export().await?;

    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "✓ Exported {} anime to {}",
                state.library.len().await,
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}

pub async fn cmd_import(state: &SharedState, file: &Path) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    match state.library.import(&json).await {
        Ok(count) => {
            println!("✓ Imported {count} anime from {}", file.display());
            Ok(())
        }
        Err(e @ LibraryError::Import(_)) => {
            println!("{e}");
            println!("The collection was left unchanged.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
