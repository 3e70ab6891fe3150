use anyhow::Context;
use std::io::Read;
use std::path::Path;

use super::print_record;
use crate::cli::RecordFields;
use crate::models::NewAnime;
use crate::models::anime::today;
use crate::services::{LibraryError, bulk_candidates_from_text};
use crate::state::SharedState;

pub async fn cmd_add_anime(state: &SharedState, title: &str, fields: RecordFields) -> anyhow::Result<()> {
    let mut candidate = NewAnime::titled(title, today());
    candidate.year = fields.year;
    candidate.genres = fields.genres;
    candidate.image_url = fields.image;
    candidate.notes = fields.notes;
    if let Some(rating) = fields.rating {
        candidate.personal_rating = rating;
    }
    if let Some(date) = fields.date {
        candidate.watched_date = date;
    }

    println!("Adding: {title}");

    match state.library.add(candidate).await {
        Ok(record) => {
            println!();
            println!("✓ Added: {} (ID: {})", record.title, record.id);
            println!("{:-<60}", "");
            print_record(&record);
            Ok(())
        }
        Err(e @ (LibraryError::Duplicate { .. } | LibraryError::Validation(_))) => {
            println!("{e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn cmd_bulk_add(state: &SharedState, file: Option<&Path>) -> anyhow::Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let candidates = bulk_candidates_from_text(&text, today());
    if candidates.is_empty() {
        println!("No titles given.");
        return Ok(());
    }

    println!("Adding {} titles (one lookup per second)...", candidates.len());

    let report = match state.library.add_bulk(candidates).await {
        Ok(report) => report,
        Err(LibraryError::BulkDuplicates(report)) => {
            println!();
            println!("{}", LibraryError::BulkDuplicates(report.clone()));
            report
        }
        Err(e) => return Err(e.into()),
    };

    println!();
    println!("{:-<60}", "");
    for record in &report.added {
        println!("✓ Added: {}", record.title);
    }
    for (title, reason) in &report.rejected {
        println!("✗ Skipped: {title} ({reason})");
    }
    println!(
        "{} added, {} duplicates, {} skipped",
        report.added.len(),
        report.duplicates.len(),
        report.rejected.len()
    );

    Ok(())
}
