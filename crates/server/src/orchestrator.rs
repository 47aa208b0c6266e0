//! # Recommendation Orchestrator
//!
//! This module coordinates both recommendation pipelines:
//!
//! Content ("more like this"):
//! 1. Resolve the viewer's text into candidate titles
//! 2. Select one title, updating the session state
//! 3. Rank every other movie by tag similarity to the selection
//! 4. Cut the ranking to the session's pagination cursor
//! 5. Enrich the selection and each shown movie with a poster
//!
//! Latent-factor ("you might rate highly"):
//! 1. Predict a rating for every movie the user has not rated
//! 2. Return the best few, rounded for display only
//!
//! The similarity matrix and the rating model are built lazily, at most once
//! per process, and shared read-only by every clone of the orchestrator.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::posters::{Poster, PosterSource};
use crate::session::SessionState;
use data_loader::{DataIndex, Movie, MovieId, UserId};
use pipeline::filters::{AlreadyRatedFilter, SelectedMovieFilter};
use pipeline::{FilterPipeline, TitleResolver};
use sources::{
    Candidate, ContentSimilarityIndex, ContentSource, LatentFactorConfig, LatentFactorModel,
    LatentFactorSource, RequestContext, SimilarityMatrix, build_user_context, round_estimate,
};

/// Default number of predictions returned by [`RecommendationOrchestrator::top_predictions`]
pub const DEFAULT_PREDICTIONS: usize = 5;

/// One ranked recommendation
#[derive(Debug, Clone, Serialize)]
pub struct ScoredMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub year: Option<u16>,
    /// Cosine similarity to the selected movie
    pub score: f32,
}

/// A recommendation as presented, poster included
#[derive(Debug, Clone)]
pub struct PresentedMovie {
    pub movie: ScoredMovie,
    pub poster: Poster,
}

/// Everything the viewer sees after "recommend" or "show more"
#[derive(Debug, Clone)]
pub struct RecommendationPage {
    pub selected: Movie,
    pub selected_poster: Poster,
    /// Shown entries, best first
    pub items: Vec<PresentedMovie>,
    /// Number of recommendations that exist for this selection
    pub available: usize,
    pub can_show_more: bool,
}

/// Predicted rating for a movie the user has not rated
#[derive(Debug, Clone, Serialize)]
pub struct MoviePrediction {
    pub movie_id: MovieId,
    pub title: String,
    /// Raw model output, used for ranking
    pub estimate: f32,
    /// `estimate` rounded to 2 decimals
    pub display_estimate: f32,
}

/// Main orchestrator that coordinates the recommendation pipelines
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    data_index: Arc<DataIndex>,
    resolver: Arc<TitleResolver>,
    similarity: Arc<OnceLock<Arc<SimilarityMatrix>>>,
    model: Arc<OnceLock<Arc<LatentFactorModel>>>,
    latent_config: LatentFactorConfig,
    content_filters: Arc<FilterPipeline>,
    prediction_filters: Arc<FilterPipeline>,
    posters: Arc<dyn PosterSource>,
    page_size: usize,
    max_shown: usize,
}

impl RecommendationOrchestrator {
    /// Create a new orchestrator over a loaded catalog
    ///
    /// Nothing expensive happens here; the matrix and the model are built on
    /// first use.
    pub fn new(data_index: Arc<DataIndex>, config: &Config, posters: Arc<dyn PosterSource>) -> Self {
        let resolver = TitleResolver::new(data_index.titles())
            .with_cutoff(config.match_cutoff)
            .with_max_candidates(config.max_candidates);

        Self {
            data_index,
            resolver: Arc::new(resolver),
            similarity: Arc::new(OnceLock::new()),
            model: Arc::new(OnceLock::new()),
            latent_config: LatentFactorConfig::default(),
            content_filters: Arc::new(FilterPipeline::new().add_filter(SelectedMovieFilter)),
            prediction_filters: Arc::new(FilterPipeline::new().add_filter(AlreadyRatedFilter)),
            posters,
            page_size: config.page_size,
            max_shown: config.max_shown,
        }
    }

    /// Override the rating model's hyper-parameters (before first use)
    pub fn with_latent_config(mut self, latent_config: LatentFactorConfig) -> Self {
        self.latent_config = latent_config;
        self
    }

    pub fn data_index(&self) -> &Arc<DataIndex> {
        &self.data_index
    }

    /// Fresh session using the configured page size and cap
    pub fn new_session(&self) -> SessionState {
        SessionState::new(self.page_size, self.max_shown)
    }

    /// The similarity matrix, built on first call
    pub fn similarity_matrix(&self) -> Arc<SimilarityMatrix> {
        Arc::clone(
            self.similarity
                .get_or_init(|| Arc::new(ContentSimilarityIndex::build(&self.data_index))),
        )
    }

    /// The rating model, trained on first call
    pub fn latent_model(&self) -> Arc<LatentFactorModel> {
        Arc::clone(self.model.get_or_init(|| {
            Arc::new(LatentFactorModel::train(
                self.data_index.all_ratings(),
                &self.latent_config,
            ))
        }))
    }

    /// Resolve free text into catalog titles
    ///
    /// An empty result is the "no match" answer.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str) -> Vec<String> {
        let titles = self.resolver.resolve(query);
        debug!("Resolved {} candidate titles", titles.len());
        titles
    }

    /// Select a movie by exact title (first match in catalog order)
    pub fn select(&self, session: &mut SessionState, title: &str) -> Result<&Movie> {
        let movie = self
            .data_index
            .find_by_title(title)
            .with_context(|| format!("No movie titled {:?}", title))?;

        if session.select(movie.id) {
            debug!(movie_id = movie.id, "Selection changed, pagination reset");
        }
        Ok(movie)
    }

    /// Rank every other movie by similarity to `movie_id`
    ///
    /// Sorted by descending score, ties by ascending movie id. The selected
    /// movie is excluded by id, so a different movie carrying the same title
    /// is still recommended.
    #[instrument(skip(self))]
    pub fn rank_similar(&self, movie_id: MovieId) -> Result<Vec<ScoredMovie>> {
        if self.data_index.get_movie(movie_id).is_none() {
            bail!("Movie {} is not in the catalog", movie_id);
        }

        let context = RequestContext::for_movie(movie_id);
        let source = ContentSource::new(Arc::clone(&self.data_index), self.similarity_matrix());
        let candidates = source.get_candidates(&context, self.data_index.movies().len());

        let filtered = self
            .content_filters
            .apply(candidates, &context)
            .context("Failed to apply filters")?;

        Ok(self.to_scored(filtered))
    }

    /// Show the first page of recommendations for the session's selection
    #[instrument(skip(self, session), fields(selected = ?session.selected()))]
    pub async fn recommend(&self, session: &mut SessionState) -> Result<RecommendationPage> {
        let movie_id = session.selected().context("No movie selected")?;
        let ranked = self.rank_in_background(movie_id).await?;

        session.trigger(ranked.len());
        self.present(movie_id, ranked, session).await
    }

    /// Reveal one more page for the session's selection
    #[instrument(skip(self, session), fields(selected = ?session.selected()))]
    pub async fn show_more(&self, session: &mut SessionState) -> Result<RecommendationPage> {
        let movie_id = session.selected().context("No movie selected")?;
        if !session.is_triggered() {
            bail!("Recommendations have not been requested yet");
        }
        let ranked = self.rank_in_background(movie_id).await?;

        if !session.show_more(ranked.len()) {
            debug!("Nothing more to show");
        }
        self.present(movie_id, ranked, session).await
    }

    /// Best `limit` predicted ratings among the movies `user_id` has not rated
    ///
    /// A user who rated everything, or an empty catalog, gives an empty list.
    #[instrument(skip(self))]
    pub fn top_predictions(&self, user_id: UserId, limit: usize) -> Result<Vec<MoviePrediction>> {
        let start = Instant::now();
        let context = build_user_context(&self.data_index, user_id);
        let source = LatentFactorSource::new(Arc::clone(&self.data_index), self.latent_model());
        let candidates = source.get_candidates(&context, self.data_index.movies().len());

        let mut filtered = self
            .prediction_filters
            .apply(candidates, &context)
            .context("Failed to apply filters")?;
        filtered.truncate(limit);

        let predictions: Vec<MoviePrediction> = filtered
            .into_iter()
            .filter_map(|candidate| {
                let movie = self.data_index.get_movie(candidate.movie_id)?;
                Some(MoviePrediction {
                    movie_id: movie.id,
                    title: movie.title.clone(),
                    estimate: candidate.score,
                    display_estimate: round_estimate(candidate.score),
                })
            })
            .collect();

        info!(
            "Predicted {} movies for user {} in {:.2?}",
            predictions.len(),
            user_id,
            start.elapsed()
        );
        Ok(predictions)
    }

    /// Ranking is CPU-bound (and may build the matrix), keep it off the runtime
    async fn rank_in_background(&self, movie_id: MovieId) -> Result<Vec<ScoredMovie>> {
        tokio::task::spawn_blocking({
            let orchestrator = self.clone();
            move || orchestrator.rank_similar(movie_id)
        })
        .await
        .context("Ranking task panicked")?
    }

    /// Cut the ranking to the visible window and attach posters
    ///
    /// Posters are fetched one after another, selection first.
    async fn present(
        &self,
        movie_id: MovieId,
        ranked: Vec<ScoredMovie>,
        session: &SessionState,
    ) -> Result<RecommendationPage> {
        let selected = self
            .data_index
            .get_movie(movie_id)
            .with_context(|| format!("Movie {} is not in the catalog", movie_id))?
            .clone();

        let available = ranked.len();
        let visible = session.visible(available);
        let selected_poster = self.posters.fetch_poster(&selected.title).await;

        let mut items = Vec::with_capacity(visible);
        for movie in ranked.into_iter().take(visible) {
            let poster = self.posters.fetch_poster(&movie.title).await;
            items.push(PresentedMovie { movie, poster });
        }

        info!(
            "Presenting {} of {} recommendations for {:?}",
            items.len(),
            available,
            selected.title
        );

        Ok(RecommendationPage {
            selected,
            selected_poster,
            items,
            available,
            can_show_more: session.can_show_more(available),
        })
    }

    fn to_scored(&self, candidates: Vec<Candidate>) -> Vec<ScoredMovie> {
        candidates
            .into_iter()
            .filter_map(|candidate| {
                let movie = self.data_index.get_movie(candidate.movie_id)?;
                Some(ScoredMovie {
                    movie_id: movie.id,
                    title: movie.title.clone(),
                    genres: movie.genres.clone(),
                    year: movie.year,
                    score: candidate.score,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posters::NoPosterSource;
    use data_loader::Rating;

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    fn build_test_data_index() -> Arc<DataIndex> {
        let mut data_index = DataIndex::new();
        let movies = [
            (1, "The Matrix (1999)", vec!["Action", "Sci-Fi"]),
            (2, "Toy Story (1995)", vec!["Animation", "Children", "Comedy"]),
            (3, "Pulp Fiction (1994)", vec!["Crime", "Drama"]),
            (4, "Forrest Gump (1994)", vec!["Drama", "Romance"]),
            (5, "The Shawshank Redemption (1994)", vec!["Drama"]),
            (6, "Die Hard (1988)", vec!["Action", "Thriller"]),
        ];
        for (id, title, genres) in movies {
            data_index.insert_movie(Movie {
                id,
                title: title.to_string(),
                year: data_loader::parser::extract_year_from_title(title),
                genres: genres.into_iter().map(String::from).collect(),
            });
        }

        for (user_id, movie_id, rating) in [
            (1, 1, 5.0),
            (1, 2, 4.0),
            (1, 3, 5.0),
            (2, 4, 3.5),
            (2, 5, 4.5),
        ] {
            data_index.insert_rating(Rating {
                user_id,
                movie_id,
                rating,
                timestamp: 978300760,
            });
        }

        Arc::new(data_index)
    }

    fn build_test_orchestrator() -> RecommendationOrchestrator {
        RecommendationOrchestrator::new(
            build_test_data_index(),
            &Config::default(),
            Arc::new(NoPosterSource),
        )
        .with_latent_config(LatentFactorConfig::default().with_factors(8))
    }

    // ============================================================================
    // Unit Tests: rank_similar
    // ============================================================================

    #[test]
    fn test_rank_similar_excludes_selected_and_sorts() {
        let orchestrator = build_test_orchestrator();

        let ranked = orchestrator.rank_similar(3).unwrap();
        let ids: Vec<MovieId> = ranked.iter().map(|m| m.movie_id).collect();

        assert_eq!(ranked.len(), 5);
        assert!(!ids.contains(&3), "Selected movie must not be recommended");
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        // Shawshank (Drama only) beats Forrest Gump (Drama + Romance)
        assert_eq!(&ids[..2], &[5, 4]);
    }

    #[test]
    fn test_rank_similar_ties_break_by_id() {
        let orchestrator = build_test_orchestrator();

        // Nothing shares a tag with Toy Story: all zeros, ascending id
        let ranked = orchestrator.rank_similar(2).unwrap();
        let ids: Vec<MovieId> = ranked.iter().map(|m| m.movie_id).collect();
        assert_eq!(ids, vec![1, 3, 4, 5, 6]);
        assert!(ranked.iter().all(|m| m.score == 0.0));
    }

    #[test]
    fn test_rank_similar_unknown_movie() {
        let orchestrator = build_test_orchestrator();
        assert!(orchestrator.rank_similar(999).is_err());
    }

    #[test]
    fn test_matrix_is_built_once_across_clones() {
        let orchestrator = build_test_orchestrator();
        let clone = orchestrator.clone();
        assert!(Arc::ptr_eq(
            &orchestrator.similarity_matrix(),
            &clone.similarity_matrix()
        ));
    }

    // ============================================================================
    // Unit Tests: search / select
    // ============================================================================

    #[test]
    fn test_search_and_select() {
        let orchestrator = build_test_orchestrator();
        let mut session = orchestrator.new_session();

        let titles = orchestrator.search("matrix");
        assert_eq!(titles[0], "The Matrix (1999)");

        let movie = orchestrator.select(&mut session, &titles[0]).unwrap();
        assert_eq!(movie.id, 1);
        assert_eq!(session.selected(), Some(1));

        assert!(orchestrator.select(&mut session, "Not A Movie").is_err());
        assert_eq!(session.selected(), Some(1));
    }

    // ============================================================================
    // Unit Tests: top_predictions
    // ============================================================================

    #[test]
    fn test_top_predictions_skip_rated_movies() {
        let orchestrator = build_test_orchestrator();

        let predictions = orchestrator.top_predictions(1, DEFAULT_PREDICTIONS).unwrap();
        assert_eq!(predictions.len(), 3);
        for prediction in &predictions {
            assert!(![1, 2, 3].contains(&prediction.movie_id));
            assert!((0.5..=5.0).contains(&prediction.estimate));
            assert_eq!(prediction.display_estimate, round_estimate(prediction.estimate));
        }
        assert!(predictions.windows(2).all(|w| w[0].estimate >= w[1].estimate));
    }

    #[test]
    fn test_top_predictions_respects_limit() {
        let orchestrator = build_test_orchestrator();

        // Unknown user: nothing rated, so every movie is a candidate
        let predictions = orchestrator.top_predictions(42, 5).unwrap();
        assert_eq!(predictions.len(), 5);
    }

    #[test]
    fn test_top_predictions_when_everything_is_rated() {
        let mut data_index = DataIndex::new();
        for id in 1..=2 {
            data_index.insert_movie(Movie {
                id,
                title: format!("Movie {}", id),
                year: None,
                genres: vec!["Drama".to_string()],
            });
            data_index.insert_rating(Rating {
                user_id: 7,
                movie_id: id,
                rating: 4.0,
                timestamp: 0,
            });
        }
        let orchestrator = RecommendationOrchestrator::new(
            Arc::new(data_index),
            &Config::default(),
            Arc::new(NoPosterSource),
        );

        assert!(orchestrator.top_predictions(7, 5).unwrap().is_empty());
    }

    #[test]
    fn test_top_predictions_on_empty_catalog() {
        let orchestrator = RecommendationOrchestrator::new(
            Arc::new(DataIndex::new()),
            &Config::default(),
            Arc::new(NoPosterSource),
        );
        assert!(orchestrator.top_predictions(1, 5).unwrap().is_empty());
    }
}
