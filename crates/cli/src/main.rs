use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{DataIndex, UserId};
use server::{
    Config, MoviePrediction, RecommendationOrchestrator, RecommendationPage, SessionState,
    poster_source,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// ReelRecs - Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Movie recommendations from genre similarity and rating prediction", long_about = None)]
struct Cli {
    /// Directory holding movies.csv (and ratings.csv for predictions)
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session: search, pick, recommend, show more
    Session,

    /// Resolve free text into catalog titles
    Search {
        /// Text to look for (fuzzy and substring match)
        #[arg(long)]
        query: String,
    },

    /// Movies tagged like the given one
    Similar {
        /// Exact catalog title, e.g. "Toy Story (1995)"
        #[arg(long)]
        title: String,

        /// Number of pages to show
        #[arg(long, default_value = "1")]
        pages: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Predicted ratings for movies a user has not rated yet
    Predict {
        /// User ID to predict for
        #[arg(long)]
        user_id: UserId,

        /// Number of predictions to return
        #[arg(long, default_value = "5")]
        limit: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    // Ratings are only needed for predictions
    let with_ratings = matches!(cli.command, Commands::Predict { .. });
    let data_index = load_data(&cli.data_dir, with_ratings)?;
    let orchestrator = RecommendationOrchestrator::new(data_index, &config, poster_source(&config));

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Session => handle_session(orchestrator).await?,
        Commands::Search { query } => handle_search(&orchestrator, &query),
        Commands::Similar { title, pages, json } => {
            handle_similar(&orchestrator, &title, pages, json).await?
        }
        Commands::Predict {
            user_id,
            limit,
            json,
        } => handle_predict(&orchestrator, user_id, limit, json)?,
        Commands::Benchmark { requests } => handle_benchmark(orchestrator, requests).await?,
    }

    Ok(())
}

fn load_data(data_dir: &Path, with_ratings: bool) -> Result<Arc<DataIndex>> {
    println!("Loading dataset from {}...", data_dir.display());
    let start = Instant::now();
    let data_index = if with_ratings {
        DataIndex::load_from_files(data_dir)
    } else {
        DataIndex::load_catalog(data_dir)
    }
    .context("Failed to load dataset")?;

    let (movies, users, ratings) = data_index.counts();
    println!(
        "{} Loaded {} movies, {} users, {} ratings in {:?}",
        "✓".green(),
        movies,
        users,
        ratings,
        start.elapsed()
    );
    Ok(Arc::new(data_index))
}

/// Handle the 'session' command
async fn handle_session(orchestrator: RecommendationOrchestrator) -> Result<()> {
    let mut session = orchestrator.new_session();
    let mut candidates: Vec<String> = Vec::new();

    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".cyan());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        let (command, argument) = line.split_once(' ').unwrap_or((line, ""));
        let argument = argument.trim();

        let outcome = match command {
            "" => Ok(()),
            "search" => {
                candidates = orchestrator.search(argument);
                print_candidates(argument, &candidates);
                Ok(())
            }
            "pick" => pick(&orchestrator, &mut session, &candidates, argument),
            "recommend" => orchestrator
                .recommend(&mut session)
                .await
                .map(|page| print_page(&page, &session)),
            "more" => orchestrator
                .show_more(&mut session)
                .await
                .map(|page| print_page(&page, &session)),
            "help" => {
                print_help();
                Ok(())
            }
            "quit" | "exit" => break,
            other => Err(anyhow!("Unknown command '{}', type 'help'", other)),
        };

        if let Err(e) = outcome {
            println!("{} {:#}", "✗".red(), e);
        }
    }
    Ok(())
}

fn pick(
    orchestrator: &RecommendationOrchestrator,
    session: &mut SessionState,
    candidates: &[String],
    argument: &str,
) -> Result<()> {
    let number: usize = argument
        .parse()
        .with_context(|| format!("'{}' is not a number", argument))?;
    let title = number
        .checked_sub(1)
        .and_then(|i| candidates.get(i))
        .ok_or_else(|| anyhow!("Pick a number between 1 and {}", candidates.len()))?;

    let movie = orchestrator.select(session, title)?;
    println!(
        "{} Selected {} [{}]",
        "✓".green(),
        movie.title.bold(),
        movie.genres.join(", ")
    );
    Ok(())
}

/// Handle the 'search' command
fn handle_search(orchestrator: &RecommendationOrchestrator, query: &str) {
    let titles = orchestrator.search(query);
    print_candidates(query, &titles);
}

/// Handle the 'similar' command
async fn handle_similar(
    orchestrator: &RecommendationOrchestrator,
    title: &str,
    pages: usize,
    json: bool,
) -> Result<()> {
    let mut session = orchestrator.new_session();
    orchestrator.select(&mut session, title)?;

    let mut page = orchestrator.recommend(&mut session).await?;
    for _ in 1..pages {
        if !page.can_show_more {
            break;
        }
        page = orchestrator.show_more(&mut session).await?;
    }

    if json {
        let movies: Vec<_> = page.items.iter().map(|item| &item.movie).collect();
        println!("{}", serde_json::to_string_pretty(&movies)?);
    } else {
        print_page(&page, &session);
    }
    Ok(())
}

/// Handle the 'predict' command
fn handle_predict(
    orchestrator: &RecommendationOrchestrator,
    user_id: UserId,
    limit: usize,
    json: bool,
) -> Result<()> {
    let data_index = orchestrator.data_index();
    if data_index.get_user_ratings(user_id).is_empty() {
        println!(
            "{} User {} has no ratings, predictions fall back to movie averages",
            "!".yellow(),
            user_id
        );
    }

    let predictions = orchestrator.top_predictions(user_id, limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&predictions)?);
    } else {
        print_predictions(user_id, &predictions);
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(orchestrator: RecommendationOrchestrator, requests: usize) -> Result<()> {
    let titles = orchestrator.data_index().titles();
    if titles.is_empty() || requests == 0 {
        bail!("Benchmark needs a non-empty catalog and at least one request");
    }

    let start = Instant::now();
    orchestrator.similarity_matrix();
    println!("Similarity matrix built in {:?}", start.elapsed());

    // Random catalog titles, queried by their first word
    let queries: Vec<String> = (0..requests)
        .map(|_| {
            let title = &titles[rand::random::<u32>() as usize % titles.len()];
            title.split_whitespace().next().unwrap_or(title).to_lowercase()
        })
        .collect();

    // Use tokio::spawn to make concurrent requests
    let wall_clock = Instant::now();
    let mut handles = vec![];
    for query in queries {
        let orchestrator = orchestrator.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let resolved = orchestrator.search(&query);
            if let Some(title) = resolved.first() {
                let movie_id = orchestrator
                    .data_index()
                    .find_by_title(title)
                    .map(|movie| movie.id)
                    .ok_or_else(|| anyhow!("Resolved title {:?} vanished", title))?;
                orchestrator.rank_similar(movie_id)?;
            } else {
                debug!("No match for {:?}", query);
            }
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    // Wait for all tasks to complete and collect timings
    let mut timings: Vec<Duration> = vec![];
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall_clock.elapsed();

    let summed: Duration = timings.iter().sum();
    let avg_latency = summed / (timings.len() as u32);
    timings.sort();
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f32 / total_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

fn print_help() {
    println!("{}", "Commands:".bold().blue());
    println!("  search <text>   find movies by title");
    println!("  pick <n>        select the n-th search result");
    println!("  recommend       show movies similar to the selection");
    println!("  more            show the next page");
    println!("  help            show this help");
    println!("  quit            leave the session");
}

fn print_candidates(query: &str, titles: &[String]) {
    if titles.is_empty() {
        println!("{} No match for '{}'", "✗".red(), query);
        return;
    }
    println!("{}", format!("Matches for '{}':", query).bold().blue());
    for (i, title) in titles.iter().enumerate() {
        println!("{}. {}", (i + 1).to_string().green(), title);
    }
}

/// Helper function to format and print a recommendation page
fn print_page(page: &RecommendationPage, session: &SessionState) {
    println!(
        "{} {}",
        "Because you picked".bold().blue(),
        page.selected.title.bold()
    );
    print_poster(page.selected_poster.url());

    for (i, item) in page.items.iter().enumerate() {
        println!(
            "{}. {} [{}] - Similarity: {:.2}",
            (i + 1).to_string().green(),
            item.movie.title,
            item.movie.genres.join(", "),
            item.movie.score
        );
        print_poster(item.poster.url());
    }

    println!(
        "Showing {} of {} (at most {})",
        page.items.len(),
        page.available,
        session.max_shown()
    );
    if page.can_show_more {
        println!("Type {} for more", "more".cyan());
    }
}

fn print_poster(url: Option<&str>) {
    match url {
        Some(url) => println!("   {}", url.dimmed()),
        None => println!("   {}", "no image available".dimmed()),
    }
}

fn print_predictions(user_id: UserId, predictions: &[MoviePrediction]) {
    if predictions.is_empty() {
        println!("Nothing left to predict for user {}", user_id);
        return;
    }
    println!(
        "{}",
        format!("Top predictions for user {}:", user_id).bold().blue()
    );
    for (i, prediction) in predictions.iter().enumerate() {
        println!(
            "{}. {} - Predicted rating: {:.2}",
            (i + 1).to_string().green(),
            prediction.title,
            prediction.display_estimate
        );
    }
}
