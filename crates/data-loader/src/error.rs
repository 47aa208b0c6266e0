//! Error types for the data-loader crate.
//!
//! Every variant here is fatal at startup: the recommender cannot run
//! without its catalog, so callers propagate these with `?` up to `main`.

use thiserror::Error;

/// Errors that can occur while loading and validating the catalog and ratings
///
/// The `#[derive(Error)]` macro from thiserror implements `std::error::Error`
/// and `Display` from the `#[error(...)]` attributes.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File does not exist
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// The CSV reader itself failed (bad quoting, invalid UTF-8, ...)
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// A row in a data file couldn't be turned into a typed record
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: u64,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Referenced entity doesn't exist (e.g., rating for a movie not in the catalog)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: u32 },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
