//! Core domain types for the movie catalog and rating table.
//!
//! Key Rust concepts demonstrated here:
//! - Type aliases for domain clarity (UserId, MovieId)
//! - Plain structs with public fields for immutable records
//! - A `Vec` that preserves file order next to a `HashMap` index

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with movie IDs

/// Unique identifier for a user (taken from the rating table)
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

// =============================================================================
// Movie
// =============================================================================

/// A single catalog entry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    /// Display title, usually suffixed with the release year: "Toy Story (1995)"
    pub title: String,
    /// Year extracted from the title suffix
    ///
    /// Rust concept: `Option<T>` represents a value that may or may not exist
    pub year: Option<u16>,
    /// Genre tags in file order, e.g. `["Adventure", "Animation", "Children"]`
    pub genres: Vec<String>,
}

// =============================================================================
// Rating
// =============================================================================

/// A single rating from a user for a movie
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value from 0.5 to 5.0 in half-star steps
    pub rating: f32,
    /// Unix timestamp when the rating was made (0 when the source has none)
    pub timestamp: i64,
}

// =============================================================================
// DataIndex - The In-Memory Catalog
// =============================================================================

/// Holds the catalog (and optionally the rating table) for the life of the process.
///
/// The catalog is kept in file row order. That order is what the content
/// similarity matrix is indexed by, so `movie_at(row)` and `row_of(id)` are
/// the only sanctioned way to go between matrix rows and movies.
#[derive(Debug)]
pub struct DataIndex {
    /// Movies in the order they were loaded
    pub(crate) movies: Vec<Movie>,
    /// Movie id -> row position in `movies` (first occurrence wins)
    pub(crate) movie_rows: HashMap<MovieId, usize>,

    /// Every rating, in load order
    pub(crate) ratings: Vec<Rating>,
    /// All ratings made by each user
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self {
            movies: Vec::new(),
            movie_rows: HashMap::new(),
            ratings: Vec::new(),
            user_ratings: HashMap::new(),
        }
    }

    /// All movies in catalog row order
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.row_of(id).map(|row| &self.movies[row])
    }

    /// Row position of a movie in the catalog
    pub fn row_of(&self, id: MovieId) -> Option<usize> {
        self.movie_rows.get(&id).copied()
    }

    /// Movie stored at a catalog row
    pub fn movie_at(&self, row: usize) -> Option<&Movie> {
        self.movies.get(row)
    }

    /// Find a movie by exact title. The first catalog match wins when titles repeat.
    pub fn find_by_title(&self, title: &str) -> Option<&Movie> {
        self.movies.iter().find(|movie| movie.title == title)
    }

    /// Titles in catalog row order
    pub fn titles(&self) -> Vec<String> {
        self.movies.iter().map(|movie| movie.title.clone()).collect()
    }

    /// Get all ratings made by a user
    ///
    /// Returns an empty slice if the user has no ratings
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Every rating in load order
    pub fn all_ratings(&self) -> &[Rating] {
        &self.ratings
    }

    /// Users that have at least one rating, ascending
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.user_ratings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Insert a movie at the end of the catalog
    ///
    /// A repeated id keeps its first row in the id index; `validate` reports it.
    pub fn insert_movie(&mut self, movie: Movie) {
        let row = self.movies.len();
        self.movie_rows.entry(movie.id).or_insert(row);
        self.movies.push(movie);
    }

    /// Insert a rating and update the per-user index
    pub fn insert_rating(&mut self, rating: Rating) {
        self.user_ratings
            .entry(rating.user_id)
            .or_default()
            .push(rating);
        self.ratings.push(rating);
    }

    /// (movies, users, ratings) counts for logging
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.movies.len(), self.user_ratings.len(), self.ratings.len())
    }
}

impl Default for DataIndex {
    fn default() -> Self {
        Self::new()
    }
}
