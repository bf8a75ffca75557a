// SPDX-License-Identifier: GPL-3.0-or-later

//! Filename-based metadata (fallback when a file carries no usable tags).
//!
//! Library files are conventionally named `Artist - Title.ext`. The stem is
//! split on the first `" - "`; without a separator the whole stem is taken
//! as the title.

use std::path::Path;
use thiserror::Error;
use tracing::debug;

const SEPARATOR: &str = " - ";

/// Errors that can occur during filename parsing
#[derive(Debug, Error)]
pub enum FilenameHeuristicsError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Could not parse filename: {0}")]
    ParsingFailed(String),
}

/// Result type for filename heuristics operations
pub type FilenameHeuristicsResult<T> = Result<T, FilenameHeuristicsError>;

/// Metadata extracted from a filename. `artist` is empty when the stem has
/// no separator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFilename {
    pub artist: String,
    pub title: String,
}

#[derive(Debug, Default, Clone)]
pub struct FilenameHeuristicsService;

impl FilenameHeuristicsService {
    /// Parse `Artist - Title` from the file stem of `path`.
    ///
    /// # Returns
    /// * `Ok(ParsedFilename)` - Artist (possibly empty) and title
    /// * `Err(FilenameHeuristicsError::FileNotFound)` - File does not exist
    /// * `Err(FilenameHeuristicsError::ParsingFailed)` - Stem is missing or not UTF-8
    pub fn parse_filename(&self, path: impl AsRef<Path>) -> FilenameHeuristicsResult<ParsedFilename> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(FilenameHeuristicsError::FileNotFound(
                path.display().to_string(),
            ));
        }

        let stem = file_stem(path).ok_or_else(|| {
            FilenameHeuristicsError::ParsingFailed(format!(
                "invalid filename '{}'",
                path.display()
            ))
        })?;

        let parsed = parse_stem(stem);
        debug!(
            target: "library",
            filename = %stem,
            artist = %parsed.artist,
            title = %parsed.title,
            "parsed filename"
        );
        Ok(parsed)
    }
}

/// Split a stem on the first separator.
pub fn parse_stem(stem: &str) -> ParsedFilename {
    match stem.split_once(SEPARATOR) {
        Some((artist, title)) => ParsedFilename {
            artist: artist.trim().to_string(),
            title: title.trim().to_string(),
        },
        None => ParsedFilename {
            artist: String::new(),
            title: stem.trim().to_string(),
        },
    }
}

/// Title guess used when tags exist but carry no title: the last segment.
pub fn title_from_stem(stem: &str) -> String {
    stem.rsplit(SEPARATOR)
        .next()
        .unwrap_or(stem)
        .trim()
        .to_string()
}

/// Artist guess used when tags exist but carry no artist: the first segment,
/// or empty without a separator.
pub fn artist_from_stem(stem: &str) -> String {
    stem.split_once(SEPARATOR)
        .map(|(artist, _)| artist.trim().to_string())
        .unwrap_or_default()
}

pub(crate) fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}
