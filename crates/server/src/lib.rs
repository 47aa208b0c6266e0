//! Server crate for the ReelRecs recommendation engine.
//!
//! This crate contains the orchestrator that coordinates all components
//! of the recommendation pipelines, the per-viewer session state, poster
//! enrichment and runtime configuration.

pub mod config;
pub mod orchestrator;
pub mod posters;
pub mod session;

pub use config::{Config, ConfigError};
pub use orchestrator::{
    DEFAULT_PREDICTIONS, MoviePrediction, PresentedMovie, RecommendationOrchestrator,
    RecommendationPage, ScoredMovie,
};
pub use posters::{NoPosterSource, Poster, PosterError, PosterSource, TmdbPosterClient, poster_source};
pub use session::SessionState;
