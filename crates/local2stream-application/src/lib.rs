// SPDX-License-Identifier: GPL-3.0-or-later
pub mod catalog;
pub mod embedded_tags;
pub mod filename_heuristics;
pub mod library;
pub mod matcher;
pub mod normalize;
pub mod similarity;
pub mod transfer;

pub use catalog::{CatalogSearch, PlaylistSink};
pub use embedded_tags::{EmbeddedTagError, EmbeddedTagReader, EmbeddedTags};
pub use filename_heuristics::{FilenameHeuristicsError, FilenameHeuristicsService, ParsedFilename};
pub use library::{extract_local_track, load_library, scan_audio_files, LibraryScanError};
pub use matcher::{CandidateMatcher, MatchingResult};
pub use normalize::normalize;
pub use similarity::similarity;
pub use transfer::{
    TrackResult, TrackStatus, TransferError, TransferReport, TransferRequest, TransferResult,
    TransferService, TransferStats,
};
