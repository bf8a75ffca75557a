// SPDX-License-Identifier: GPL-3.0-or-later

use local2stream_domain::CatalogCandidate;
use serde::{Deserialize, Serialize};

/// Response of `GET /search?type=track`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Absent when the search did not include the `track` type.
    #[serde(default)]
    pub tracks: Option<TrackPage>,
}

impl SearchResponse {
    /// Convert the page into candidates, preserving relevance order.
    pub fn into_candidates(self) -> Vec<CatalogCandidate> {
        self.tracks
            .map(|page| {
                page.items
                    .into_iter()
                    .flatten()
                    .filter_map(TrackObject::into_candidate)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// One page of track results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPage {
    /// Spotify occasionally returns `null` in place of an item.
    #[serde(default)]
    pub items: Vec<Option<TrackObject>>,
}

/// Track object as returned by search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackObject {
    /// Spotify track ID; local files in playlists have none.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    /// Credited artists in billing order.
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
}

impl TrackObject {
    /// Candidate artist is the first credited artist, or empty.
    pub fn into_candidate(self) -> Option<CatalogCandidate> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let artist_name = self
            .artists
            .into_iter()
            .next()
            .map(|artist| artist.name)
            .unwrap_or_default();
        Some(CatalogCandidate {
            id,
            name: self.name,
            artist_name,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimplifiedArtist {
    pub name: String,
}

/// Response of `GET /me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistRequest<'a> {
    pub name: &'a str,
    pub public: bool,
    pub description: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

/// Response of `POST /api/token` on the accounts service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    /// Only present when the accounts service rotates the refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

pub fn track_uri(track_id: &str) -> String {
    format!("spotify:track:{}", track_id)
}
