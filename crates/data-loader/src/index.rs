//! DataIndex building and validation.
//!
//! Loads the catalog (and the rating table when the latent-factor pipeline
//! needs it), then validates the invariants the rest of the system relies on:
//! unique movie ids, ratings in range, and every rating joined to a catalog movie.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::info;

/// Lowest rating value accepted from the rating source
pub const MIN_RATING: f32 = 0.5;
/// Highest rating value accepted from the rating source
pub const MAX_RATING: f32 = 5.0;

impl DataIndex {
    /// Load only the catalog (`movies.csv`) from a directory
    ///
    /// This is all the content-similarity pipeline needs.
    pub fn load_catalog(data_dir: &Path) -> Result<Self> {
        info!("Loading catalog from {:?}", data_dir);

        let movies = parser::parse_movies(&data_dir.join("movies.csv"))?;

        let mut index = DataIndex::new();
        for movie in movies {
            index.insert_movie(movie);
        }
        index.validate()?;

        info!("Loaded {} movies", index.movies.len());
        Ok(index)
    }

    /// Load the catalog and the rating table from a directory
    ///
    /// Steps:
    /// 1. Parse movies.csv and ratings.csv in parallel
    /// 2. Insert movies in file order (row order = similarity matrix order)
    /// 3. Insert ratings and build the per-user index
    /// 4. Validate data integrity
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading catalog and ratings from {:?}", data_dir);

        let movies_path = data_dir.join("movies.csv");
        let ratings_path = data_dir.join("ratings.csv");

        // Rayon's `join` runs both parsers in parallel
        let (movies, ratings) = rayon::join(
            || parser::parse_movies(&movies_path),
            || parser::parse_ratings(&ratings_path),
        );
        let movies = movies?;
        let ratings = ratings?;

        info!("Parsed {} movies, {} ratings", movies.len(), ratings.len());

        let mut index = DataIndex::new();
        for movie in movies {
            index.insert_movie(movie);
        }
        for rating in ratings {
            index.insert_rating(rating);
        }

        index.validate()?;

        let (movies, users, ratings) = index.counts();
        info!(movies, users, ratings, "DataIndex successfully built and validated");
        Ok(index)
    }

    /// Validate data integrity
    ///
    /// Check that:
    /// - Movie ids are unique (row alignment depends on it)
    /// - All rating.movie_id references exist in the catalog
    /// - Ratings are in the valid range (0.5 - 5.0)
    pub fn validate(&self) -> Result<()> {
        if self.movie_rows.len() != self.movies.len() {
            let mut seen = std::collections::HashSet::new();
            let duplicate = self
                .movies
                .iter()
                .find(|movie| !seen.insert(movie.id))
                .map(|movie| movie.id)
                .unwrap_or_default();
            return Err(DataLoadError::ValidationError(format!(
                "duplicate movie id {}",
                duplicate
            )));
        }

        for rating in &self.ratings {
            if !self.movie_rows.contains_key(&rating.movie_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "Movie".to_string(),
                    id: rating.movie_id,
                });
            }
            if !(MIN_RATING..=MAX_RATING).contains(&rating.rating) {
                return Err(DataLoadError::InvalidValue {
                    field: "rating".to_string(),
                    value: rating.rating.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_dataset(movies: &str, ratings: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("movies.csv"), movies).unwrap();
        if let Some(ratings) = ratings {
            fs::write(dir.path().join("ratings.csv"), ratings).unwrap();
        }
        dir
    }

    const MOVIES: &str = "movieId,title,genres\n\
        1,Toy Story (1995),Animation|Comedy\n\
        2,Jumanji (1995),Adventure|Comedy\n\
        3,Heat (1995),Action|Crime\n";

    #[test]
    fn test_load_catalog_keeps_row_order() {
        let dir = write_dataset(MOVIES, None);
        let index = DataIndex::load_catalog(dir.path()).unwrap();

        assert_eq!(index.movies().len(), 3);
        assert_eq!(index.row_of(3), Some(2));
        assert_eq!(index.movie_at(0).unwrap().title, "Toy Story (1995)");
    }

    #[test]
    fn test_load_from_files() {
        let dir = write_dataset(
            MOVIES,
            Some("userId,movieId,rating,timestamp\n1,1,4.0,964982703\n1,3,0.5,964981247\n2,2,5.0,964982224\n"),
        );
        let index = DataIndex::load_from_files(dir.path()).unwrap();

        assert_eq!(index.counts(), (3, 2, 3));
        assert_eq!(index.get_user_ratings(1).len(), 2);
        assert_eq!(index.user_ids(), vec![1, 2]);
    }

    #[test]
    fn test_rating_out_of_range_is_rejected() {
        let dir = write_dataset(MOVIES, Some("userId,movieId,rating\n1,1,5.5\n"));
        let result = DataIndex::load_from_files(dir.path());
        assert!(matches!(result, Err(DataLoadError::InvalidValue { .. })));
    }

    #[test]
    fn test_rating_for_unknown_movie_is_rejected() {
        let dir = write_dataset(MOVIES, Some("userId,movieId,rating\n1,99,3.0\n"));
        let result = DataIndex::load_from_files(dir.path());
        assert!(matches!(
            result,
            Err(DataLoadError::MissingReference { id: 99, .. })
        ));
    }

    #[test]
    fn test_duplicate_movie_id_is_rejected() {
        let dir = write_dataset(
            "movieId,title,genres\n1,A (2000),Drama\n1,B (2001),Drama\n",
            None,
        );
        let result = DataIndex::load_catalog(dir.path());
        assert!(matches!(result, Err(DataLoadError::ValidationError(_))));
    }

    #[test]
    fn test_missing_catalog_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = DataIndex::load_catalog(dir.path());
        assert!(matches!(result, Err(DataLoadError::FileNotFound { .. })));
    }
}
