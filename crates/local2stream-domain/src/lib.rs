// SPDX-License-Identifier: GPL-3.0-or-later
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound on results requested from the catalog per search.
pub const MAX_SEARCH_LIMIT: u32 = 50;

// ============================================================================
// Match Input
// ============================================================================

/// Title/artist pair describing a local track, as read from tags or guessed
/// from the filename. The artist may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackQuery {
    pub title: String,
    #[serde(default)]
    pub artist: String,
}

impl TrackQuery {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }

    pub fn title_only(title: impl Into<String>) -> Self {
        Self::new(title, String::new())
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn has_artist(&self) -> bool {
        !self.artist.trim().is_empty()
    }
}

impl std::fmt::Display for TrackQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

// ============================================================================
// Catalog Values
// ============================================================================

/// A single catalog search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCandidate {
    pub id: String,
    pub name: String,
    pub artist_name: String,
}

impl CatalogCandidate {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        artist_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artist_name: artist_name.into(),
        }
    }
}

/// Field-scoped catalog search request.
///
/// Renders to the catalog query syntax `track:"X" artist:"Y"`; either clause
/// may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub track: Option<String>,
    pub artist: Option<String>,
    pub limit: u32,
}

impl CatalogQuery {
    pub fn track_and_artist(track: &str, artist: &str) -> Self {
        Self {
            track: Some(track.to_string()),
            artist: Some(artist.to_string()).filter(|a| !a.trim().is_empty()),
            limit: MAX_SEARCH_LIMIT,
        }
    }

    pub fn track(track: &str) -> Self {
        Self {
            track: Some(track.to_string()),
            artist: None,
            limit: MAX_SEARCH_LIMIT,
        }
    }

    pub fn artist(artist: &str) -> Self {
        Self {
            track: None,
            artist: Some(artist.to_string()),
            limit: MAX_SEARCH_LIMIT,
        }
    }

    /// Set the result limit, clamped to `1..=MAX_SEARCH_LIMIT`.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        self
    }

    pub fn to_query_string(&self) -> String {
        let mut clauses = Vec::with_capacity(2);
        if let Some(track) = self.track.as_deref() {
            clauses.push(format!("track:\"{}\"", quote_literal(track)));
        }
        if let Some(artist) = self.artist.as_deref() {
            clauses.push(format!("artist:\"{}\"", quote_literal(artist)));
        }
        clauses.join(" ")
    }
}

impl std::fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

// Literals cannot carry an embedded double quote.
fn quote_literal(value: &str) -> String {
    value.replace('"', " ").trim().to_string()
}

// ============================================================================
// Match Output
// ============================================================================

/// Which matcher phase produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    TitleOnly,
    ArtistFallback,
}

impl MatchKind {
    pub const ALL: [MatchKind; 4] = [
        MatchKind::Exact,
        MatchKind::Fuzzy,
        MatchKind::TitleOnly,
        MatchKind::ArtistFallback,
    ];
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::Exact => write!(f, "Exact"),
            MatchKind::Fuzzy => write!(f, "Fuzzy"),
            MatchKind::TitleOnly => write!(f, "Title Only"),
            MatchKind::ArtistFallback => write!(f, "Artist Fallback"),
        }
    }
}

/// The catalog entry selected for a query.
///
/// `confidence` is exactly 1.0 for [`MatchKind::Exact`] and strictly below
/// 1.0 for every other kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub candidate_id: String,
    pub candidate_name: String,
    pub candidate_artist: String,
    pub kind: MatchKind,
    pub confidence: f64,
}

/// Largest confidence a non-exact outcome may report.
pub const MAX_INEXACT_CONFIDENCE: f64 = 1.0 - f64::EPSILON;

impl MatchOutcome {
    pub fn exact(candidate: &CatalogCandidate) -> Self {
        Self::from_candidate(candidate, MatchKind::Exact, 1.0)
    }

    /// Build a non-exact outcome; the score is capped below 1.0.
    pub fn scored(candidate: &CatalogCandidate, kind: MatchKind, score: f64) -> Self {
        let confidence = if kind == MatchKind::Exact {
            1.0
        } else {
            score.clamp(0.0, MAX_INEXACT_CONFIDENCE)
        };
        Self::from_candidate(candidate, kind, confidence)
    }

    fn from_candidate(candidate: &CatalogCandidate, kind: MatchKind, confidence: f64) -> Self {
        Self {
            candidate_id: candidate.id.clone(),
            candidate_name: candidate.name.clone(),
            candidate_artist: candidate.artist_name.clone(),
            kind,
            confidence,
        }
    }
}

// ============================================================================
// Local Library
// ============================================================================

/// Where the metadata of a [`LocalTrack`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataSource {
    EmbeddedTags,
    FilenameHeuristics,
}

impl std::fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataSource::EmbeddedTags => write!(f, "tags"),
            MetadataSource::FilenameHeuristics => write!(f, "filename"),
        }
    }
}

/// A local audio file together with the metadata extracted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTrack {
    pub path: PathBuf,
    pub query: TrackQuery,
    #[serde(default)]
    pub album: String,
    pub duration_seconds: Option<u64>,
    pub source: MetadataSource,
}
