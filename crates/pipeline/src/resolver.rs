//! Free-text title resolution.
//!
//! Turns whatever the viewer typed into a short, ordered list of catalog
//! titles:
//! 1. Approximate matches by similarity ratio (best first, capped)
//! 2. Every title containing the query as a substring (catalog order)
//! 3. Concatenate, drop repeats keeping the first occurrence
//! 4. Map lowercase matches back to the catalog's original casing
//!
//! An empty result means "no match"; it is not an error.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Default minimum similarity ratio for an approximate match
///
/// Tuned for `similarity_ratio`, which scores short queries low against long
/// titles: "hat" vs "heat (1995)" is about 0.18, so short typos are only
/// found when they also occur as a substring.
pub const DEFAULT_CUTOFF: f64 = 0.4;
/// Default cap on approximate matches
pub const DEFAULT_MAX_CANDIDATES: usize = 5;

/// Similarity ratio in `[0, 1]` between two already-lowercased strings
///
/// Dice coefficient over character bigrams: twice the shared bigrams over
/// the total bigram count of both strings.
///
/// Whitespace is ignored before counting bigrams, and any input shorter than
/// two characters scores 0 unless both strings are equal.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    strsim::sorensen_dice(a, b)
}

/// Resolves free-text queries against a fixed title list
#[derive(Debug, Clone)]
pub struct TitleResolver {
    /// Lowercased titles in catalog order
    lowered: Vec<String>,
    /// Lowercase -> original casing. On a collision the later title wins.
    originals: HashMap<String, String>,
    cutoff: f64,
    max_candidates: usize,
}

impl TitleResolver {
    /// Build a resolver over `titles` (catalog order) with default settings
    pub fn new<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lowered = Vec::new();
        let mut originals = HashMap::new();
        for title in titles {
            let title = title.as_ref();
            let lower = title.to_lowercase();
            originals.insert(lower.clone(), title.to_string());
            lowered.push(lower);
        }

        Self {
            lowered,
            originals,
            cutoff: DEFAULT_CUTOFF,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }

    /// Configure the minimum ratio for approximate matches (default: 0.4)
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Configure how many approximate matches are kept (default: 5)
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Resolve a query into original-cased titles, approximate matches first
    pub fn resolve(&self, query: &str) -> Vec<String> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let close = self.close_matches(&query);
        let contained = self.substring_matches(&query);
        debug!(
            query = %query,
            approximate = close.len(),
            substring = contained.len(),
            "Resolved title query"
        );

        let mut seen = HashSet::new();
        close
            .into_iter()
            .chain(contained)
            .filter(|lower| seen.insert(*lower))
            .filter_map(|lower| self.originals.get(lower).cloned())
            .collect()
    }

    /// Up to `max_candidates` lowercased titles whose ratio reaches the cutoff,
    /// best first; equal ratios keep catalog order
    pub fn close_matches(&self, query: &str) -> Vec<&str> {
        let mut scored: Vec<(usize, f64)> = self
            .lowered
            .par_iter()
            .enumerate()
            .map(|(position, title)| (position, similarity_ratio(query, title)))
            .filter(|&(_, ratio)| ratio >= self.cutoff)
            .collect();

        // Stable sort keeps catalog order on ties
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.max_candidates);

        scored
            .into_iter()
            .map(|(position, _)| self.lowered[position].as_str())
            .collect()
    }

    /// Every lowercased title that contains `query`, in catalog order
    pub fn substring_matches(&self, query: &str) -> Vec<&str> {
        self.lowered
            .iter()
            .filter(|title| title.contains(query))
            .map(String::as_str)
            .collect()
    }
}

/// One-shot resolution over `titles` with the given cutoff
pub fn resolve<S: AsRef<str>>(query: &str, titles: &[S], cutoff: f64) -> Vec<String> {
    TitleResolver::new(titles.iter().map(|title| title.as_ref()))
        .with_cutoff(cutoff)
        .resolve(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<&'static str> {
        vec![
            "Toy Story (1995)",
            "Jumanji (1995)",
            "Heat (1995)",
            "Toy Story 2 (1999)",
            "Heat and Dust (1983)",
        ]
    }

    #[test]
    fn test_empty_query_has_no_matches() {
        assert!(resolve("", &catalog(), DEFAULT_CUTOFF).is_empty());
        assert!(resolve("   ", &catalog(), DEFAULT_CUTOFF).is_empty());
    }

    #[test]
    fn test_substring_match_restores_case() {
        let titles = vec!["Toy Story (1995)", "Jumanji (1995)", "Heat (1995)"];
        assert_eq!(resolve("toy", &titles, DEFAULT_CUTOFF), vec!["Toy Story (1995)"]);
        assert_eq!(resolve("TOY", &titles, DEFAULT_CUTOFF), vec!["Toy Story (1995)"]);
    }

    #[test]
    fn test_no_duplicates_in_output() {
        // "heat (1995)" is both a close match and a substring match
        let resolved = resolve("heat (1995)", &catalog(), DEFAULT_CUTOFF);
        let unique: HashSet<&String> = resolved.iter().collect();
        assert_eq!(unique.len(), resolved.len());
        assert_eq!(resolved[0], "Heat (1995)");
    }

    #[test]
    fn test_approximate_matches_come_before_substring_matches() {
        // Misspelled: no substring hit, only the close match
        let resolver = TitleResolver::new(catalog());
        assert_eq!(resolver.resolve("jumanjii"), vec!["Jumanji (1995)"]);

        // Catalog order puts "Heat and Dust" first, the closer title still leads
        let resolver = TitleResolver::new(["Heat and Dust (1983)", "Heat (1995)"]).with_cutoff(0.5);
        assert_eq!(
            resolver.resolve("heat"),
            vec!["Heat (1995)", "Heat and Dust (1983)"]
        );
    }

    #[test]
    fn test_short_typo_falls_below_cutoff() {
        let ratio = similarity_ratio("hat", "heat (1995)");
        assert!(ratio < DEFAULT_CUTOFF, "ratio was {}", ratio);
        assert_eq!(similarity_ratio("h", "heat (1995)"), 0.0);
        // Spaces do not count towards the bigrams
        assert_eq!(similarity_ratio("toy story", "toystory"), 1.0);

        let resolver = TitleResolver::new(["Heat (1995)"]);
        assert!(resolver.resolve("hat").is_empty());
        assert_eq!(resolver.resolve("h"), vec!["Heat (1995)"]);
    }

    #[test]
    fn test_max_candidates_caps_only_approximate_matches() {
        let resolver = TitleResolver::new(catalog())
            .with_cutoff(0.0)
            .with_max_candidates(1);
        assert_eq!(resolver.close_matches("toy story").len(), 1);

        // Substring matches are unbounded
        let resolved = resolver.resolve("(19");
        assert_eq!(resolved.len(), catalog().len());
    }

    #[test]
    fn test_case_collision_keeps_later_title() {
        let resolver = TitleResolver::new(["Solaris (1972)", "SOLARIS (1972)"]);
        assert_eq!(resolver.resolve("solaris"), vec!["SOLARIS (1972)"]);
    }

    #[test]
    fn test_no_match() {
        assert!(resolve("zzzzzz", &catalog(), DEFAULT_CUTOFF).is_empty());
    }
}
