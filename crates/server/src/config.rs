//! Runtime configuration read from the process environment.
//!
//! A `.env` file in the working directory is honoured. Every value except
//! `TMDB_API_KEY` has a default; without a key posters are simply not
//! looked up.

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading or validating [`Config`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key, posters are skipped without one
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix joined with a result's `poster_path`
    #[serde(default = "default_tmdb_image_base")]
    pub tmdb_image_base: String,

    /// Minimum similarity ratio for approximate title matches
    #[serde(default = "default_match_cutoff")]
    pub match_cutoff: f64,

    /// Maximum number of approximate title matches
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Recommendations added per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Hard cap on recommendations shown for one selection
    #[serde(default = "default_max_shown")]
    pub max_shown: usize,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_match_cutoff() -> f64 {
    pipeline::DEFAULT_CUTOFF
}

fn default_max_candidates() -> usize {
    pipeline::DEFAULT_MAX_CANDIDATES
}

fn default_page_size() -> usize {
    crate::session::DEFAULT_PAGE_SIZE
}

fn default_max_shown() -> usize {
    crate::session::DEFAULT_MAX_SHOWN
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_api_url: default_tmdb_api_url(),
            tmdb_image_base: default_tmdb_image_base(),
            match_cutoff: default_match_cutoff(),
            max_candidates: default_max_candidates(),
            page_size: default_page_size(),
            max_shown: default_max_shown(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Config = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from explicit `(NAME, value)` pairs
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::from_iter(pairs)?;
        config.validate()?;
        Ok(config)
    }

    /// API key, if one is configured and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.tmdb_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.match_cutoff) {
            return Err(ConfigError::Invalid {
                field: "MATCH_CUTOFF",
                reason: format!("{} is outside [0, 1]", self.match_cutoff),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "PAGE_SIZE",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.page_size > self.max_shown {
            return Err(ConfigError::Invalid {
                field: "PAGE_SIZE",
                reason: format!("{} exceeds MAX_SHOWN ({})", self.page_size, self.max_shown),
            });
        }
        Ok(())
    }
}
