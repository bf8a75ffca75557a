// SPDX-License-Identifier: GPL-3.0-or-later

//! Embedded tag reading (ID3, Vorbis comments, MP4 atoms, RIFF INFO).

use lofty::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while reading embedded tags
#[derive(Debug, Error)]
pub enum EmbeddedTagError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unreadable audio file {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Result type used throughout the embedded tag module.
pub type EmbeddedTagResult<T> = Result<T, EmbeddedTagError>;

/// Values taken from a file's tag block. Blank values are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_seconds: Option<u64>,
}

#[derive(Debug, Default, Clone)]
pub struct EmbeddedTagReader;

impl EmbeddedTagReader {
    /// Read the primary tag of `path`, falling back to the first tag present.
    ///
    /// Returns `Ok(None)` for a readable file that carries no tag at all.
    pub fn read(&self, path: impl AsRef<Path>) -> EmbeddedTagResult<Option<EmbeddedTags>> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(EmbeddedTagError::FileNotFound(path.display().to_string()));
        }

        let tagged_file =
            lofty::read_from_path(path).map_err(|err| EmbeddedTagError::Unreadable {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;

        let Some(tag) = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
        else {
            debug!(target: "library", path = %path.display(), "file carries no tags");
            return Ok(None);
        };

        let duration = tagged_file.properties().duration().as_secs();
        let tags = EmbeddedTags {
            title: non_blank(tag.title().as_deref()),
            artist: non_blank(tag.artist().as_deref()),
            album: non_blank(tag.album().as_deref()),
            duration_seconds: (duration > 0).then_some(duration),
        };

        debug!(
            target: "library",
            path = %path.display(),
            title = ?tags.title,
            artist = ?tags.artist,
            "read embedded tags"
        );
        Ok(Some(tags))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
