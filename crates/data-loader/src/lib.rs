//! # Data Loader Crate
//!
//! This crate loads the movie catalog and the rating table into memory once
//! per process and exposes them read-only afterwards.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Rating, DataIndex)
//! - **parser**: Parse the CSV files into Rust structs
//! - **index**: Load, index and validate the dataset
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use std::path::Path;
//!
//! // Catalog only (content-similarity mode)
//! let index = DataIndex::load_catalog(Path::new("data"))?;
//!
//! // Catalog + ratings (latent-factor mode)
//! let index = DataIndex::load_from_files(Path::new("data"))?;
//! let movie = index.find_by_title("Toy Story (1995)").unwrap();
//! println!("{} is row {}", movie.title, index.row_of(movie.id).unwrap());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::{MAX_RATING, MIN_RATING};
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    // Core types
    Movie,
    Rating,
    DataIndex,
};
