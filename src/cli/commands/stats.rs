use crate::state::SharedState;

pub async fn cmd_stats(state: &SharedState) -> anyhow::Result<()> {
    let stats = state.library.stats().await;

    println!("Collection Statistics");
    println!("{:-<60}", "");
    println!("Total:          {}", stats.total);
    println!("Average rating: {:.1}", stats.average_rating);

    let top = stats.top_genres();
    if !top.is_empty() {
        println!();
        println!("Genres:");
        for (genre, count) in top {
            println!("  {:<12} {count}", genre.label());
        }
    }

    println!();
    println!("Ratings:");
    for (rating, count) in stats.rating_distribution.iter().rev() {
        println!("  {rating}★ {}", "▇".repeat(*count));
    }

    if !stats.yearly_watch_counts.is_empty() {
        println!();
        println!("Watched per year:");
        for (year, count) in &stats.yearly_watch_counts {
            println!("  {year}: {count}");
        }
    }

    Ok(())
}
