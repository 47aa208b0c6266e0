//! Pipeline for resolving queries and filtering movie candidates.
//!
//! This crate provides:
//! - TitleResolver for turning free text into catalog titles
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//!
//! ## Architecture
//! A recommendation request flows through these stages:
//! 1. The resolver maps the viewer's text to candidate titles
//! 2. A source (content or latent-factor) produces ranked candidates
//! 3. Filters remove unwanted candidates (the selected movie, already rated ones)
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FilterPipeline, TitleResolver};
//! use pipeline::filters::*;
//!
//! let resolver = TitleResolver::new(index.titles());
//! let titles = resolver.resolve("toy story");
//!
//! let pipeline = FilterPipeline::new().add_filter(SelectedMovieFilter);
//! let filtered = pipeline.apply(candidates, &context)?;
//! ```

pub mod traits;
pub mod filters;
pub mod filter_pipeline;
pub mod resolver;

// Re-export main types
pub use traits::Filter;
pub use filter_pipeline::FilterPipeline;
pub use resolver::{DEFAULT_CUTOFF, DEFAULT_MAX_CANDIDATES, TitleResolver, resolve, similarity_ratio};
