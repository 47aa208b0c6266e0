//! Simple test harness for the recommendation orchestrator.
//!
//! Runs one scripted session end to end: resolve a query, pick the first
//! match, show two pages of recommendations and a few predictions.
//!
//! Usage: `server [DATA_DIR] [QUERY]` (defaults: `data`, `toy story`)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use data_loader::DataIndex;
use server::{Config, DEFAULT_PREDICTIONS, RecommendationOrchestrator, poster_source};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,sources=debug,pipeline=debug")),
        )
        .init();

    info!("Starting ReelRecs server test harness");

    let mut args = std::env::args().skip(1);
    let data_dir = PathBuf::from(args.next().unwrap_or_else(|| "data".to_string()));
    let query = args.next().unwrap_or_else(|| "toy story".to_string());

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Loading data index from {}...", data_dir.display());
    let data_index = Arc::new(
        DataIndex::load_from_files(&data_dir)
            .with_context(|| format!("Failed to load data from {}", data_dir.display()))?,
    );
    info!("Data index loaded successfully");

    let orchestrator =
        RecommendationOrchestrator::new(data_index.clone(), &config, poster_source(&config));
    let mut session = orchestrator.new_session();

    let titles = orchestrator.search(&query);
    let Some(title) = titles.first() else {
        info!("No match for {:?}", query);
        return Ok(());
    };
    info!("Resolved {:?} to {} titles, picking {:?}", query, titles.len(), title);
    orchestrator.select(&mut session, title)?;

    orchestrator.recommend(&mut session).await?;
    let page = orchestrator.show_more(&mut session).await?;
    for (i, item) in page.items.iter().enumerate() {
        info!(
            "{}. {} - Similarity: {:.2} [{}]",
            i + 1,
            item.movie.title,
            item.movie.score,
            item.poster.url().unwrap_or("no image available")
        );
    }

    if let Some(&user_id) = data_index.user_ids().first() {
        for prediction in orchestrator.top_predictions(user_id, DEFAULT_PREDICTIONS)? {
            info!(
                "User {} might rate {} at {:.2}",
                user_id, prediction.title, prediction.display_estimate
            );
        }
    }

    Ok(())
}
