//! Poster enrichment.
//!
//! Posters are decoration: a lookup that fails for any reason yields
//! [`Poster::Unavailable`] and the listing carries on without it.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Poster slot for one presented movie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poster {
    /// Absolute image URL
    Url(String),
    /// Explicit "no image available" placeholder
    Unavailable,
}

impl Poster {
    pub fn url(&self) -> Option<&str> {
        match self {
            Poster::Url(url) => Some(url),
            Poster::Unavailable => None,
        }
    }
}

/// Anything that can find a poster for a catalog title
#[async_trait]
pub trait PosterSource: Send + Sync {
    /// Never fails; problems are reported as [`Poster::Unavailable`]
    async fn fetch_poster(&self, title: &str) -> Poster;
}

/// Source used when no API key is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPosterSource;

#[async_trait]
impl PosterSource for NoPosterSource {
    async fn fetch_poster(&self, _title: &str) -> Poster {
        Poster::Unavailable
    }
}

/// Why a TMDB lookup produced no poster
#[derive(Debug, Error)]
pub enum PosterError {
    /// Built through `PosterError::http`, which strips the request URL
    #[error("HTTP client error: {0}")]
    HttpClient(reqwest::Error),

    #[error("TMDB returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("No search results for {0:?}")]
    NoResults(String),

    #[error("First result for {0:?} has no poster")]
    MissingPoster(String),
}

impl PosterError {
    /// Wrap a reqwest error without its URL, which carries the API key
    fn http(err: reqwest::Error) -> Self {
        PosterError::HttpClient(err.without_url())
    }
}

/// Drop a trailing `(YYYY)` year from a catalog title
///
/// Example: "Toy Story (1995)" -> "Toy Story"
///          "Babe (a.k.a. Pig)" -> unchanged
pub fn strip_year_suffix(title: &str) -> &str {
    let trimmed = title.trim_end();
    let Some(rest) = trimmed.strip_suffix(')') else {
        return trimmed;
    };
    let Some(open) = rest.rfind('(') else {
        return trimmed;
    };
    let year = &rest[open + 1..];
    if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
        rest[..open].trim_end()
    } else {
        trimmed
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    poster_path: Option<String>,
}

/// TMDB `/search/movie` client
#[derive(Clone)]
pub struct TmdbPosterClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base: String,
}

impl TmdbPosterClient {
    pub fn new(
        api_key: impl Into<String>,
        api_url: impl Into<String>,
        image_base: impl Into<String>,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key: api_key.into(),
            api_url: api_url.into(),
            image_base: image_base.into(),
        }
    }

    /// Look up the first search hit's poster URL
    pub async fn search_poster(&self, title: &str) -> Result<String, PosterError> {
        let query = strip_year_suffix(title);
        let url = format!("{}/search/movie", self.api_url.trim_end_matches('/'));

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", query)])
            .send()
            .await
            .map_err(PosterError::http)?;

        if !response.status().is_success() {
            return Err(PosterError::Status(response.status()));
        }

        let body: SearchResponse = response.json().await.map_err(PosterError::http)?;
        let first = body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| PosterError::NoResults(query.to_string()))?;
        let path = first
            .poster_path
            .filter(|path| !path.is_empty())
            .ok_or_else(|| PosterError::MissingPoster(query.to_string()))?;

        Ok(format!("{}{}", self.image_base, path))
    }
}

#[async_trait]
impl PosterSource for TmdbPosterClient {
    async fn fetch_poster(&self, title: &str) -> Poster {
        match self.search_poster(title).await {
            Ok(url) => Poster::Url(url),
            Err(e @ (PosterError::NoResults(_) | PosterError::MissingPoster(_))) => {
                debug!(title = %title, reason = %e, "No poster available");
                Poster::Unavailable
            }
            Err(e) => {
                warn!(title = %title, error = %e, "Poster lookup failed");
                Poster::Unavailable
            }
        }
    }
}

/// Pick the poster source for `config`
pub fn poster_source(config: &Config) -> Arc<dyn PosterSource> {
    match config.api_key() {
        Some(key) => Arc::new(TmdbPosterClient::new(
            key,
            config.tmdb_api_url.clone(),
            config.tmdb_image_base.clone(),
        )),
        None => {
            info!("TMDB_API_KEY not set, posters disabled");
            Arc::new(NoPosterSource)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one HTTP response, returning the raw request text
    async fn serve_once(status: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock TMDB");
        let addr = listener.local_addr().expect("Failed to get local address");
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept failed");
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.expect("read failed");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write failed");
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_strip_year_suffix() {
        assert_eq!(strip_year_suffix("Toy Story (1995)"), "Toy Story");
        assert_eq!(strip_year_suffix("Heat (1995) "), "Heat");
        assert_eq!(strip_year_suffix("Babe (a.k.a. Pig)"), "Babe (a.k.a. Pig)");
        assert_eq!(strip_year_suffix("Movie Title"), "Movie Title");
        assert_eq!(strip_year_suffix("(1995)"), "");
    }

    #[tokio::test]
    async fn test_first_result_poster_is_used() {
        let (addr, handle) = serve_once(
            "200 OK",
            r#"{"results":[{"poster_path":"/toy.jpg"},{"poster_path":"/other.jpg"}]}"#,
        )
        .await;
        let client = TmdbPosterClient::new("secret", addr, "https://img.test/w500");

        let poster = client.fetch_poster("Toy Story (1995)").await;
        assert_eq!(poster, Poster::Url("https://img.test/w500/toy.jpg".to_string()));

        let request = handle.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("GET /search/movie?"));
        assert!(request_line.contains("api_key=secret"));
        assert!(request_line.contains("query=Toy+Story"));
        assert!(!request_line.contains("1995"));
    }

    #[tokio::test]
    async fn test_empty_results_are_unavailable() {
        let (addr, handle) = serve_once("200 OK", r#"{"results":[]}"#).await;
        let client = TmdbPosterClient::new("secret", addr, "https://img.test/w500");

        assert_eq!(client.fetch_poster("Heat (1995)").await, Poster::Unavailable);
        handle.abort();
    }

    #[tokio::test]
    async fn test_null_poster_path_is_unavailable() {
        let (addr, handle) = serve_once("200 OK", r#"{"results":[{"poster_path":null}]}"#).await;
        let client = TmdbPosterClient::new("secret", addr, "https://img.test/w500");

        assert!(matches!(
            client.search_poster("Heat (1995)").await,
            Err(PosterError::MissingPoster(_))
        ));
        handle.abort();
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let (addr, handle) = serve_once("401 Unauthorized", r#"{"status_code":7}"#).await;
        let client = TmdbPosterClient::new("wrong", addr, "https://img.test/w500");

        assert_eq!(client.fetch_poster("Heat (1995)").await, Poster::Unavailable);
        handle.abort();
    }

    #[tokio::test]
    async fn test_malformed_body_is_unavailable() {
        let (addr, handle) = serve_once("200 OK", "not json").await;
        let client = TmdbPosterClient::new("secret", addr, "https://img.test/w500");

        let err = client.search_poster("Heat (1995)").await.unwrap_err();
        assert!(matches!(err, PosterError::HttpClient(_)));
        assert!(!err.to_string().contains("secret"));
        handle.abort();
    }

    #[tokio::test]
    async fn test_refused_connection_keeps_api_key_out_of_error() {
        // Bind then drop so nothing is listening on the port
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let client = TmdbPosterClient::new(
            "TOPSECRETKEY",
            format!("http://{}", addr),
            "https://img.test/w500",
        );

        let err = client.search_poster("Heat (1995)").await.unwrap_err();
        assert!(matches!(err, PosterError::HttpClient(_)));
        let message = err.to_string();
        assert!(!message.contains("TOPSECRETKEY"), "key leaked: {}", message);
        assert!(!message.contains("api_key"), "query leaked: {}", message);

        assert_eq!(client.fetch_poster("Heat (1995)").await, Poster::Unavailable);
    }

    #[tokio::test]
    async fn test_no_api_key_disables_posters() {
        let source = poster_source(&Config::default());
        assert_eq!(source.fetch_poster("Toy Story (1995)").await, Poster::Unavailable);
    }
}
