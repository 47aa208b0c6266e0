//! Parser for the catalog and rating CSV files.
//!
//! This module handles the two tabular sources:
//! - movies.csv: movieId,title,genres   (genres are pipe-joined: "Adventure|Comedy")
//! - ratings.csv: userId,movieId,rating,timestamp
//!
//! Rows are deserialized into loosely-typed raw records with serde and then
//! converted into the typed `Movie` / `Rating` records. Any bad row is a
//! line-numbered `ParseError`; the whole load fails on the first one.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// Raw row of movies.csv. Column names follow MovieLens, with the generic
/// `id` / `tags` names accepted as well.
#[derive(Debug, Deserialize)]
struct MovieRecord {
    #[serde(rename = "movieId", alias = "id")]
    movie_id: MovieId,
    title: String,
    #[serde(alias = "tags")]
    genres: String,
}

/// Raw row of ratings.csv
#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "userId", alias = "user_id")]
    user_id: UserId,
    #[serde(rename = "movieId", alias = "movie_id", alias = "item_id")]
    movie_id: MovieId,
    rating: f32,
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Open a CSV file with headers, trimming whitespace around every field
fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    Ok(reader)
}

/// Turn a csv deserialization failure into a line-numbered parse error
fn row_error(file: &str, err: csv::Error) -> DataLoadError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: err.to_string(),
    }
}

/// File name used in error messages
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse the movies.csv file
///
/// The title often includes year in parentheses: "Toy Story (1995)"
/// Genres are pipe-separated: "Adventure|Animation|Children|Comedy|Fantasy"
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let file = file_label(path);
    let mut reader = open_reader(path)?;
    let mut movies = Vec::new();

    for record in reader.deserialize::<MovieRecord>() {
        let record = record.map_err(|e| row_error(&file, e))?;
        movies.push(Movie {
            id: record.movie_id,
            year: extract_year_from_title(&record.title),
            genres: parse_genres(&record.genres),
            title: record.title,
        });
    }
    Ok(movies)
}

/// Parse the ratings.csv file
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let file = file_label(path);
    let mut reader = open_reader(path)?;
    let mut ratings = Vec::new();

    for record in reader.deserialize::<RatingRecord>() {
        let record = record.map_err(|e| row_error(&file, e))?;
        ratings.push(Rating {
            user_id: record.user_id,
            movie_id: record.movie_id,
            rating: record.rating,
            timestamp: record.timestamp.unwrap_or(0),
        });
    }
    Ok(ratings)
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
pub fn extract_year_from_title(title: &str) -> Option<u16> {
    let title = title.trim_end();
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        let year_str = &title[start + 1..end];
        if year_str.len() == 4 {
            return year_str.parse::<u16>().ok();
        }
    }
    None
}

/// Split a pipe-joined tag string into its tags
///
/// Example: "Action|Adventure|Sci-Fi" -> ["Action", "Adventure", "Sci-Fi"]
fn parse_genres(s: &str) -> Vec<String> {
    s.split('|')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
