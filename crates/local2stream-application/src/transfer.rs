// SPDX-License-Identifier: GPL-3.0-or-later

//! Library-to-playlist transfer.
//!
//! Scans a directory, matches every file against the catalog, then creates a
//! playlist holding the matched tracks in scan order. The playlist is only
//! created once at least one track matched. Outside a dry run the playlist
//! account is checked before any search is issued.

use crate::catalog::{CatalogSearch, PlaylistSink};
use crate::library::{load_library, LibraryScanError};
use crate::matcher::CandidateMatcher;
use chrono::{Local, NaiveDateTime};
use futures_util::stream::{self, StreamExt};
use local2stream_catalog::CatalogError;
use local2stream_domain::{LocalTrack, MatchKind, MatchOutcome};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("failed to scan music directory: {0}")]
    Scan(#[from] LibraryScanError),
    #[error("no music files found in {0}")]
    NoMusicFiles(String),
    #[error("catalog authentication failed: {0}")]
    Authentication(#[source] CatalogError),
    #[error("no scanned file matched a catalog track")]
    NoTracksMatched(Box<TransferReport>),
    #[error("failed to create playlist: {0}")]
    PlaylistCreation(#[source] CatalogError),
    #[error("failed to add tracks to playlist {playlist_id}: {source}")]
    PlaylistUpdate {
        playlist_id: String,
        #[source]
        source: CatalogError,
    },
    #[error("background task failed: {0}")]
    Join(String),
}

/// Result type for transfer operations
pub type TransferResult<T> = Result<T, TransferError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub music_directory: PathBuf,
    pub playlist_name: String,
    /// Match only; no playlist is created.
    pub dry_run: bool,
}

/// What happened to one local file.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackStatus {
    Matched(MatchOutcome),
    NotFound,
    /// The catalog could not be queried for this track.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackResult {
    pub track: LocalTrack,
    pub status: TrackStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub total_files: usize,
    pub exact: usize,
    pub fuzzy: usize,
    pub title_only: usize,
    pub artist_fallback: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl TransferStats {
    pub fn record(&mut self, status: &TrackStatus) {
        self.total_files += 1;
        match status {
            TrackStatus::Matched(outcome) => match outcome.kind {
                MatchKind::Exact => self.exact += 1,
                MatchKind::Fuzzy => self.fuzzy += 1,
                MatchKind::TitleOnly => self.title_only += 1,
                MatchKind::ArtistFallback => self.artist_fallback += 1,
            },
            TrackStatus::NotFound => self.not_found += 1,
            TrackStatus::Failed(_) => self.failed += 1,
        }
    }

    pub fn matched(&self) -> usize {
        self.exact + self.fuzzy + self.title_only + self.artist_fallback
    }

    /// Matched files as a percentage of all files; 0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            return 0.0;
        }
        self.matched() as f64 / self.total_files as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferReport {
    pub stats: TransferStats,
    /// One entry per scanned file, in scan order.
    pub results: Vec<TrackResult>,
    pub playlist_id: Option<String>,
    pub dry_run: bool,
}

impl TransferReport {
    /// Catalog ids of matched tracks, in scan order. Duplicates are kept.
    pub fn track_ids(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|result| match &result.status {
                TrackStatus::Matched(outcome) => Some(outcome.candidate_id.clone()),
                _ => None,
            })
            .collect()
    }
}

pub struct TransferService<C, P> {
    matcher: CandidateMatcher<C>,
    sink: P,
    max_concurrent_matches: usize,
}

impl<C: CatalogSearch, P: PlaylistSink> TransferService<C, P> {
    pub fn new(catalog: C, sink: P) -> Self {
        Self {
            matcher: CandidateMatcher::new(catalog),
            sink,
            max_concurrent_matches: 1,
        }
    }

    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.matcher = self.matcher.with_search_limit(limit);
        self
    }

    /// Matches in flight at once; at least one.
    pub fn with_max_concurrent_matches(mut self, max: usize) -> Self {
        self.max_concurrent_matches = max.max(1);
        self
    }

    pub async fn run(&self, request: &TransferRequest) -> TransferResult<TransferReport> {
        let root = request.music_directory.clone();
        let tracks = tokio::task::spawn_blocking(move || load_library(root))
            .await
            .map_err(|err| TransferError::Join(err.to_string()))??;

        if tracks.is_empty() {
            return Err(TransferError::NoMusicFiles(
                request.music_directory.display().to_string(),
            ));
        }

        info!(
            target: "transfer",
            directory = %request.music_directory.display(),
            files = tracks.len(),
            "matching local files"
        );

        if !request.dry_run {
            let user = self
                .sink
                .current_user()
                .await
                .map_err(TransferError::Authentication)?;
            debug!(target: "transfer", user = %user, "playlist account verified");
        }

        let results = self.match_tracks(tracks).await;

        let mut stats = TransferStats::default();
        for result in &results {
            stats.record(&result.status);
        }

        let mut report = TransferReport {
            stats,
            results,
            playlist_id: None,
            dry_run: request.dry_run,
        };

        info!(
            target: "transfer",
            total = report.stats.total_files,
            matched = report.stats.matched(),
            not_found = report.stats.not_found,
            failed = report.stats.failed,
            "matching complete"
        );

        let track_ids = report.track_ids();
        if track_ids.is_empty() {
            return Err(TransferError::NoTracksMatched(Box::new(report)));
        }

        if request.dry_run {
            info!(target: "transfer", tracks = track_ids.len(), "dry run, skipping playlist creation");
            return Ok(report);
        }

        let description =
            playlist_description(report.stats.total_files, Local::now().naive_local());
        let playlist_id = self
            .sink
            .create_playlist(&request.playlist_name, &description)
            .await
            .map_err(TransferError::PlaylistCreation)?;

        info!(target: "transfer", playlist_id = %playlist_id, name = %request.playlist_name, "playlist created");

        self.sink
            .add_tracks(&playlist_id, &track_ids)
            .await
            .map_err(|source| TransferError::PlaylistUpdate {
                playlist_id: playlist_id.clone(),
                source,
            })?;

        info!(target: "transfer", playlist_id = %playlist_id, tracks = track_ids.len(), "tracks added to playlist");

        report.playlist_id = Some(playlist_id);
        Ok(report)
    }

    async fn match_tracks(&self, tracks: Vec<LocalTrack>) -> Vec<TrackResult> {
        let total = tracks.len();
        let matcher = &self.matcher;

        stream::iter(tracks)
            .map(|track| async move {
                let status = match matcher.find_match(&track.query).await {
                    Ok(Some(outcome)) => TrackStatus::Matched(outcome),
                    Ok(None) => TrackStatus::NotFound,
                    Err(err) => {
                        warn!(
                            target: "transfer",
                            path = %track.path.display(),
                            error = %err,
                            "catalog search failed, counting track as failed"
                        );
                        TrackStatus::Failed(err.to_string())
                    }
                };
                TrackResult { track, status }
            })
            .buffered(self.max_concurrent_matches)
            .enumerate()
            .map(|(index, result)| {
                log_progress(index + 1, total, &result);
                result
            })
            .collect()
            .await
    }
}

fn log_progress(done: usize, total: usize, result: &TrackResult) {
    let percent = done as f64 / total as f64 * 100.0;
    match &result.status {
        TrackStatus::Matched(outcome) => info!(
            target: "transfer",
            progress = %format!("{:.1}%", percent),
            track = %result.track.query,
            matched = %format!("{} - {}", outcome.candidate_artist, outcome.candidate_name),
            kind = %outcome.kind,
            confidence = outcome.confidence,
            "[{}/{}] matched", done, total
        ),
        TrackStatus::NotFound => info!(
            target: "transfer",
            progress = %format!("{:.1}%", percent),
            track = %result.track.query,
            "[{}/{}] not found", done, total
        ),
        TrackStatus::Failed(_) => debug!(
            target: "transfer",
            progress = %format!("{:.1}%", percent),
            track = %result.track.query,
            "[{}/{}] failed", done, total
        ),
    }
}

/// Playlist description stamped with the file count and local time.
pub fn playlist_description(total_files: usize, at: NaiveDateTime) -> String {
    format!(
        "Auto-generated by Local2Stream - {} files processed on {}",
        total_files,
        at.format("%Y-%m-%d %H:%M")
    )
}
