//! Candidate types shared by every source and by the filter pipeline.

use data_loader::MovieId;
use std::cmp::Ordering;

/// Which source produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    /// Row of the tag-based cosine similarity matrix
    Content,
    /// Point prediction of the latent-factor rating model
    LatentFactor,
}

/// A scored movie on its way to the presenter
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub movie_id: MovieId,
    pub source: CandidateSource,
    /// Cosine similarity for `Content`, predicted rating for `LatentFactor`
    pub score: f32,
}

impl Candidate {
    pub fn new(movie_id: MovieId, source: CandidateSource, score: f32) -> Self {
        Self {
            movie_id,
            source,
            score,
        }
    }
}

/// Descending score, ascending movie id on ties.
pub fn compare_ranked(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.movie_id.cmp(&b.movie_id))
}

/// Sort candidates into presentation order (see [`compare_ranked`])
pub fn rank_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(compare_ranked);
}
