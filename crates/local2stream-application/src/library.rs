// SPDX-License-Identifier: GPL-3.0-or-later

//! Local music library: directory scan and per-file metadata extraction.
//!
//! Everything here is blocking filesystem work; async callers run it on the
//! blocking pool.

use crate::embedded_tags::{EmbeddedTagReader, EmbeddedTags};
use crate::filename_heuristics::{
    artist_from_stem, file_stem, title_from_stem, FilenameHeuristicsService, ParsedFilename,
};
use local2stream_domain::{LocalTrack, MetadataSource, TrackQuery};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Extensions picked up by the scan, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["mp3", "flac", "m4a", "mp4", "wav", "ogg"];

#[derive(Debug, Error)]
pub enum LibraryScanError {
    #[error("path does not exist: {0}")]
    PathNotFound(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("I/O error: {0}")]
    Io(String),
}

/// Recursively collect supported audio files under `root`, sorted by path.
/// Symlinks are not followed.
pub fn scan_audio_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>, LibraryScanError> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(LibraryScanError::PathNotFound(root.display().to_string()));
    }
    if !root.is_dir() {
        return Err(LibraryScanError::NotADirectory(root.display().to_string()));
    }

    let mut scanned = Vec::new();
    visit_directory(root, &mut scanned)?;
    scanned.sort();

    debug!(target: "library", root = %root.display(), files = scanned.len(), "library scanned");
    Ok(scanned)
}

/// Scan `root` and extract metadata for every file found.
pub fn load_library(root: impl AsRef<Path>) -> Result<Vec<LocalTrack>, LibraryScanError> {
    Ok(scan_audio_files(root)?
        .into_iter()
        .map(extract_local_track)
        .collect())
}

/// Build a [`LocalTrack`] for one file.
///
/// Embedded tags win; a missing tag title or artist is guessed from the
/// filename. A file that cannot be read or carries no tags is described by
/// its filename alone.
pub fn extract_local_track(path: PathBuf) -> LocalTrack {
    match EmbeddedTagReader.read(&path) {
        Ok(Some(tags)) => from_tags(path, tags),
        Ok(None) => from_filename(path),
        Err(err) => {
            debug!(target: "library", path = %path.display(), error = %err, "tags unreadable, using filename");
            from_filename(path)
        }
    }
}

fn from_tags(path: PathBuf, tags: EmbeddedTags) -> LocalTrack {
    let stem = file_stem(&path).unwrap_or_default();
    let title = tags.title.unwrap_or_else(|| title_from_stem(stem));
    let artist = tags.artist.unwrap_or_else(|| artist_from_stem(stem));

    LocalTrack {
        query: TrackQuery::new(title, artist),
        album: tags.album.unwrap_or_default(),
        duration_seconds: tags.duration_seconds,
        source: MetadataSource::EmbeddedTags,
        path,
    }
}

fn from_filename(path: PathBuf) -> LocalTrack {
    let parsed = FilenameHeuristicsService
        .parse_filename(&path)
        .unwrap_or_else(|err| {
            warn!(target: "library", path = %path.display(), error = %err, "could not derive metadata from filename");
            ParsedFilename::default()
        });

    LocalTrack {
        query: TrackQuery::new(parsed.title, parsed.artist),
        album: String::new(),
        duration_seconds: None,
        source: MetadataSource::FilenameHeuristics,
        path,
    }
}

fn visit_directory(directory: &Path, scanned: &mut Vec<PathBuf>) -> Result<(), LibraryScanError> {
    let entries = fs::read_dir(directory).map_err(|err| LibraryScanError::Io(err.to_string()))?;

    for entry in entries {
        let entry = entry.map_err(|err| LibraryScanError::Io(err.to_string()))?;
        let path = entry.path();

        let file_type = entry
            .file_type()
            .map_err(|err| LibraryScanError::Io(err.to_string()))?;

        if file_type.is_symlink() {
            continue;
        }

        if file_type.is_dir() {
            visit_directory(&path, scanned)?;
            continue;
        }

        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            continue;
        };

        if is_audio_extension(extension) {
            scanned.push(path);
        }
    }

    Ok(())
}

fn is_audio_extension(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(extension))
}
