//! Filter to remove movies the user has already rated.
//!
//! The latent-factor pipeline only recommends movies the user has not rated
//! yet, so this runs before the top-N cut.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, RequestContext};

/// Removes candidates that the user has already rated.
///
/// ## Algorithm
/// Uses the HashSet in RequestContext.rated_movies for O(1) lookups.
pub struct AlreadyRatedFilter;

impl Filter for AlreadyRatedFilter {
    fn name(&self) -> &str {
        "AlreadyRatedFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &RequestContext,
    ) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !context.rated_movies.contains(&candidate.movie_id))
            .collect();
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::{Candidate, CandidateSource};

    #[test]
    fn test_already_rated_filter() {
        let mut context = RequestContext::default();
        context.rated_movies.insert(100);
        context.rated_movies.insert(200);

        let candidates = vec![
            Candidate::new(100, CandidateSource::LatentFactor, 4.9),
            Candidate::new(101, CandidateSource::LatentFactor, 4.8),
            Candidate::new(200, CandidateSource::LatentFactor, 4.7),
            Candidate::new(300, CandidateSource::LatentFactor, 4.6),
        ];

        let filter = AlreadyRatedFilter;
        let filtered = filter.apply(candidates, &context).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].movie_id, 101);
        assert_eq!(filtered[1].movie_id, 300);
    }

    #[test]
    fn test_everything_rated_leaves_nothing() {
        let mut context = RequestContext::default();
        context.rated_movies.extend([1, 2]);

        let candidates = vec![
            Candidate::new(1, CandidateSource::LatentFactor, 4.0),
            Candidate::new(2, CandidateSource::LatentFactor, 3.0),
        ];

        assert!(AlreadyRatedFilter.apply(candidates, &context).unwrap().is_empty());
    }
}
