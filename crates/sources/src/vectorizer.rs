//! Bag-of-tags vectorizer.
//!
//! Each item's tag list is already split, so tokenization is just
//! lowercasing. The vocabulary is the sorted union of all tags minus stop
//! words, and every item becomes a sparse term-count vector over it.

use crate::stopwords::StopWordsFilter;
use std::collections::{BTreeSet, HashMap};

/// Sparse term-count vector: `(term index, count)` pairs sorted by term index
pub type SparseVector = Vec<(usize, f32)>;

/// Term list produced by [`TagVectorizer::fit_transform`]
#[derive(Debug, Clone, Default)]
pub struct TagVocabulary {
    terms: Vec<String>,
    positions: HashMap<String, usize>,
}

impl TagVocabulary {
    /// Terms in index order
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn position(&self, term: &str) -> Option<usize> {
        self.positions.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Count vectorizer over pre-split tag lists
#[derive(Debug, Clone, Default)]
pub struct TagVectorizer {
    stop_words: StopWordsFilter,
}

impl TagVectorizer {
    /// Vectorizer with the English stop word list
    pub fn new() -> Self {
        Self {
            stop_words: StopWordsFilter::english(),
        }
    }

    /// Replace the stop word list
    pub fn with_stop_words(mut self, stop_words: StopWordsFilter) -> Self {
        self.stop_words = stop_words;
        self
    }

    /// Build the vocabulary from `documents` and encode each of them
    ///
    /// The returned vectors are in the same order as `documents`.
    pub fn fit_transform<D, S>(&self, documents: &[D]) -> (TagVocabulary, Vec<SparseVector>)
    where
        D: AsRef<[S]>,
        S: AsRef<str>,
    {
        let normalized: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| {
                doc.as_ref()
                    .iter()
                    .map(|tag| tag.as_ref().trim().to_lowercase())
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .collect();

        // BTreeSet gives the sorted union in one pass
        let terms: Vec<String> = normalized
            .iter()
            .flatten()
            .filter(|term| !self.stop_words.is_stop_word(term))
            .cloned()
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();

        let positions: HashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        let vectors = normalized
            .iter()
            .map(|doc| {
                let mut counts: HashMap<usize, f32> = HashMap::new();
                for term in doc {
                    if let Some(&position) = positions.get(term) {
                        *counts.entry(position).or_insert(0.0) += 1.0;
                    }
                }
                let mut vector: SparseVector = counts.into_iter().collect();
                vector.sort_unstable_by_key(|&(position, _)| position);
                vector
            })
            .collect();

        (TagVocabulary { terms, positions }, vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_is_sorted_and_lowercased() {
        let docs = vec![
            vec!["Comedy", "Animation"],
            vec!["Adventure", "comedy"],
        ];
        let (vocab, vectors) = TagVectorizer::new().fit_transform(&docs);

        assert_eq!(vocab.terms(), ["adventure", "animation", "comedy"]);
        assert_eq!(vectors[0], vec![(1, 1.0), (2, 1.0)]);
        assert_eq!(vectors[1], vec![(0, 1.0), (2, 1.0)]);
    }

    #[test]
    fn test_stop_words_are_dropped_from_vocabulary() {
        let docs = vec![vec!["The", "Western"]];
        let (vocab, vectors) = TagVectorizer::new().fit_transform(&docs);

        assert_eq!(vocab.len(), 1);
        assert!(vocab.position("the").is_none());
        assert_eq!(vectors[0], vec![(0, 1.0)]);
    }

    #[test]
    fn test_repeated_tag_counts_twice() {
        let docs = vec![vec!["Drama", "Drama"]];
        let (_, vectors) = TagVectorizer::new()
            .with_stop_words(StopWordsFilter::none())
            .fit_transform(&docs);
        assert_eq!(vectors[0], vec![(0, 2.0)]);
    }
}
