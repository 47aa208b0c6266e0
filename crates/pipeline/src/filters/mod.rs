//! Filter implementations for the candidate pipeline.

pub mod already_rated;
pub mod selected_movie;

// Re-export for convenience
pub use already_rated::AlreadyRatedFilter;
pub use selected_movie::SelectedMovieFilter;
