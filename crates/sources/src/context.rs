//! Per-request context handed to sources and filters.
//!
//! The context is gathered once up front so neither the sources nor the
//! filters go back to the DataIndex for every candidate.

use data_loader::{DataIndex, MovieId, UserId};
use std::collections::HashSet;

/// What a single recommendation request is about
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Movie the viewer picked (content mode)
    pub selected_movie: Option<MovieId>,
    /// User we predict for (latent-factor mode)
    pub user_id: Option<UserId>,
    /// Movies the user has already rated
    pub rated_movies: HashSet<MovieId>,
}

impl RequestContext {
    /// Context for "more like this movie"
    pub fn for_movie(movie_id: MovieId) -> Self {
        Self {
            selected_movie: Some(movie_id),
            ..Self::default()
        }
    }
}

/// Build the context for a latent-factor request
///
/// A user without ratings is not an error: the rated set is simply empty and
/// every catalog movie stays a candidate.
pub fn build_user_context(data_index: &DataIndex, user_id: UserId) -> RequestContext {
    let rated_movies = data_index
        .get_user_ratings(user_id)
        .iter()
        .map(|rating| rating.movie_id)
        .collect();

    RequestContext {
        selected_movie: None,
        user_id: Some(user_id),
        rated_movies,
    }
}
