//! Filter to remove the movie the viewer picked from its own recommendations.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, RequestContext};

/// Removes the selected movie by id.
///
/// Exclusion is by identity, so another catalog entry that happens to share
/// the selected movie's title stays in the list.
pub struct SelectedMovieFilter;

impl Filter for SelectedMovieFilter {
    fn name(&self) -> &str {
        "SelectedMovieFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &RequestContext,
    ) -> Result<Vec<Candidate>> {
        let Some(selected) = context.selected_movie else {
            return Ok(candidates);
        };
        Ok(candidates
            .into_iter()
            .filter(|candidate| candidate.movie_id != selected)
            .collect())
    }
}
