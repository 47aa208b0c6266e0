//! Content Source - tag-based item-to-item similarity
//!
//! ## Algorithm
//! 1. Encode every catalog movie's genre tags as a term-count vector
//! 2. Compute the cosine similarity of every pair of rows
//! 3. Store the result as a dense `n x n` matrix in catalog row order
//!
//! The matrix is O(n²) in memory and is only meant for catalogs of a few
//! thousand movies. It is built once and shared read-only afterwards.

use crate::types::{Candidate, CandidateSource, rank_candidates};
use crate::context::RequestContext;
use crate::vectorizer::{SparseVector, TagVectorizer};
use data_loader::DataIndex;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Dense, symmetric cosine similarity matrix indexed by catalog row.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    size: usize,
    /// Row-major `size * size` values
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute all-pairs cosine similarity over sparse term vectors
    ///
    /// Rows are computed in parallel. The diagonal is fixed at 1.0, also for
    /// items without any tag.
    pub fn from_vectors(vectors: &[SparseVector]) -> Self {
        let size = vectors.len();
        let norms: Vec<f64> = vectors.iter().map(norm).collect();
        let norms = norms.as_slice();

        let values: Vec<f32> = (0..size)
            .into_par_iter()
            .flat_map_iter(move |i| {
                (0..size).map(move |j| {
                    if i == j {
                        1.0
                    } else {
                        cosine(&vectors[i], norms[i], &vectors[j], norms[j])
                    }
                })
            })
            .collect();

        Self { size, values }
    }

    /// Vectorize tag lists with the default vectorizer and build the matrix
    pub fn from_tag_lists<D, S>(documents: &[D]) -> Self
    where
        D: AsRef<[S]>,
        S: AsRef<str>,
    {
        let (_, vectors) = TagVectorizer::new().fit_transform(documents);
        Self::from_vectors(&vectors)
    }

    /// Number of rows (= number of catalog movies)
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Similarity between rows `i` and `j`
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i < self.size && j < self.size {
            Some(self.values[i * self.size + j])
        } else {
            None
        }
    }

    /// Full similarity row for catalog row `i`
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i < self.size {
            Some(&self.values[i * self.size..(i + 1) * self.size])
        } else {
            None
        }
    }
}

fn norm(vector: &SparseVector) -> f64 {
    vector
        .iter()
        .map(|&(_, count)| (count as f64) * (count as f64))
        .sum::<f64>()
        .sqrt()
}

/// Cosine of two sparse vectors sorted by term index
fn cosine(a: &SparseVector, norm_a: f64, b: &SparseVector, norm_b: f64) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0; // Zero vector is orthogonal to everything
    }

    let (mut x, mut y) = (0, 0);
    let mut dot = 0.0_f64;
    while x < a.len() && y < b.len() {
        match a[x].0.cmp(&b[y].0) {
            std::cmp::Ordering::Less => x += 1,
            std::cmp::Ordering::Greater => y += 1,
            std::cmp::Ordering::Equal => {
                dot += a[x].1 as f64 * b[y].1 as f64;
                x += 1;
                y += 1;
            }
        }
    }

    ((dot / (norm_a * norm_b)) as f32).clamp(0.0, 1.0)
}

/// Builds the similarity matrix for a loaded catalog.
pub struct ContentSimilarityIndex;

impl ContentSimilarityIndex {
    /// Build the matrix in `data_index` row order
    #[instrument(skip(data_index))]
    pub fn build(data_index: &DataIndex) -> SimilarityMatrix {
        let start = Instant::now();
        let documents: Vec<&[String]> = data_index
            .movies()
            .iter()
            .map(|movie| movie.genres.as_slice())
            .collect();

        let (vocabulary, vectors) = TagVectorizer::new().fit_transform(&documents);
        let matrix = SimilarityMatrix::from_vectors(&vectors);

        info!(
            movies = matrix.len(),
            vocabulary = vocabulary.len(),
            elapsed = ?start.elapsed(),
            "Built content similarity matrix"
        );
        matrix
    }
}

/// Content source turns a similarity row into ranked candidates
#[derive(Clone)]
pub struct ContentSource {
    /// Shared reference to the data index (read-only, so no Mutex needed)
    data_index: Arc<DataIndex>,
    matrix: Arc<SimilarityMatrix>,
}

impl ContentSource {
    /// Create a new content source
    ///
    /// `matrix` must have been built from this same `data_index`.
    pub fn new(data_index: Arc<DataIndex>, matrix: Arc<SimilarityMatrix>) -> Self {
        Self { data_index, matrix }
    }

    /// Every catalog movie scored against the selected movie, best first
    ///
    /// The selected movie itself is still in the list (score 1.0); removing
    /// it is the filter pipeline's job. Returns nothing without a selection.
    #[instrument(skip(self, context), fields(selected = ?context.selected_movie))]
    pub fn get_candidates(&self, context: &RequestContext, limit: usize) -> Vec<Candidate> {
        let Some(row) = context
            .selected_movie
            .and_then(|movie_id| self.data_index.row_of(movie_id))
        else {
            debug!("No selected movie in the catalog, no content candidates");
            return Vec::new();
        };
        let Some(scores) = self.matrix.row(row) else {
            return Vec::new();
        };

        let mut candidates: Vec<Candidate> = scores
            .iter()
            .zip(self.data_index.movies())
            .map(|(&score, movie)| Candidate::new(movie.id, CandidateSource::Content, score))
            .collect();

        rank_candidates(&mut candidates);
        candidates.truncate(limit);

        debug!("Generated {} content candidates", candidates.len());
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Movie, MovieId};

    fn create_test_index() -> DataIndex {
        let mut index = DataIndex::new();
        let movies = [
            (1, "Toy Story (1995)", vec!["Animation", "Comedy"]),
            (2, "Jumanji (1995)", vec!["Adventure", "Comedy"]),
            (3, "Heat (1995)", vec!["Action", "Crime"]),
            (4, "Untagged (2000)", vec![]),
        ];
        for (id, title, genres) in movies {
            index.insert_movie(Movie {
                id,
                title: title.to_string(),
                year: None,
                genres: genres.into_iter().map(String::from).collect(),
            });
        }
        index
    }

    #[test]
    fn test_matrix_is_symmetric_with_unit_diagonal() {
        let index = create_test_index();
        let matrix = ContentSimilarityIndex::build(&index);

        assert_eq!(matrix.len(), 4);
        for i in 0..matrix.len() {
            assert_eq!(matrix.get(i, i), Some(1.0));
            for j in 0..matrix.len() {
                let value = matrix.get(i, j).unwrap();
                assert_eq!(value, matrix.get(j, i).unwrap());
                assert!((0.0..=1.0).contains(&value));
            }
        }
    }

    #[test]
    fn test_shared_tag_scores_half() {
        let index = create_test_index();
        let matrix = ContentSimilarityIndex::build(&index);

        // One shared tag out of two on each side: 1 / (sqrt(2) * sqrt(2))
        assert!((matrix.get(0, 1).unwrap() - 0.5).abs() < 1e-6);
        assert_eq!(matrix.get(0, 2), Some(0.0));
        assert_eq!(matrix.get(3, 0), Some(0.0));
        assert!(matrix.get(4, 0).is_none());
    }

    #[test]
    fn test_from_tag_lists_empty_catalog() {
        let docs: Vec<Vec<&str>> = Vec::new();
        let matrix = SimilarityMatrix::from_tag_lists(&docs);
        assert!(matrix.is_empty());
        assert!(matrix.row(0).is_none());
    }

    #[test]
    fn test_get_candidates_ranked() {
        let index = Arc::new(create_test_index());
        let matrix = Arc::new(ContentSimilarityIndex::build(&index));
        let source = ContentSource::new(Arc::clone(&index), matrix);

        let candidates = source.get_candidates(&RequestContext::for_movie(1), 10);
        let ids: Vec<MovieId> = candidates.iter().map(|c| c.movie_id).collect();

        // Self first (1.0), Jumanji (0.5), then zero scores by ascending id
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(candidates.iter().all(|c| c.source == CandidateSource::Content));
    }

    #[test]
    fn test_get_candidates_without_selection() {
        let index = Arc::new(create_test_index());
        let matrix = Arc::new(ContentSimilarityIndex::build(&index));
        let source = ContentSource::new(index, matrix);

        assert!(source.get_candidates(&RequestContext::default(), 10).is_empty());
        assert!(source.get_candidates(&RequestContext::for_movie(42), 10).is_empty());
    }
}
