//! # Sources Crate
//!
//! This crate implements the two candidate sources of the recommender.
//!
//! ## Components
//!
//! ### Content Source
//! Item-to-item similarity over genre tags:
//! - Tags are encoded as term-count vectors (stop words filtered)
//! - All-pairs cosine similarity is precomputed into a dense matrix
//! - "Movies tagged like the one you picked"
//!
//! ### Latent-Factor Source
//! Rating prediction from a matrix-factorization model:
//! - Users and movies are embedded as low-dimensional factor vectors
//! - Fitted once over the full rating table
//! - "Movies you would probably rate highly"
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{ContentSimilarityIndex, ContentSource, RequestContext};
//! use data_loader::DataIndex;
//! use std::sync::Arc;
//!
//! let data_index = Arc::new(DataIndex::load_catalog(Path::new("data"))?);
//! let matrix = Arc::new(ContentSimilarityIndex::build(&data_index));
//!
//! let content = ContentSource::new(data_index.clone(), matrix);
//! let candidates = content.get_candidates(&RequestContext::for_movie(1), 50);
//! ```
//!
//! Both the matrix and the model are expensive to build and immutable once
//! built, so callers build them once and share them behind `Arc`.

// Public modules
pub mod types;
pub mod context;
pub mod stopwords;
pub mod vectorizer;
pub mod content;
pub mod latent;

// Re-export commonly used types
pub use types::{Candidate, CandidateSource, compare_ranked, rank_candidates};
pub use context::{RequestContext, build_user_context};
pub use content::{ContentSimilarityIndex, ContentSource, SimilarityMatrix};
pub use latent::{LatentFactorConfig, LatentFactorModel, LatentFactorSource, round_estimate};
