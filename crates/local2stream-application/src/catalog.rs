// SPDX-License-Identifier: GPL-3.0-or-later

//! Capabilities the matcher and the transfer pipeline consume.
//!
//! The matcher only needs [`CatalogSearch`]; the pipeline additionally
//! needs a [`PlaylistSink`]. Both are implemented by the Spotify client and
//! by in-memory fakes in tests.

use async_trait::async_trait;
use local2stream_catalog::{CatalogError, SpotifyClient};
use local2stream_domain::{CatalogCandidate, CatalogQuery};
use std::sync::Arc;

#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Run a track search; results are in the catalog's relevance order.
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogCandidate>, CatalogError>;
}

#[async_trait]
pub trait PlaylistSink: Send + Sync {
    /// Account that will own created playlists. Fails when the session
    /// cannot act for a user.
    async fn current_user(&self) -> Result<String, CatalogError>;

    async fn create_playlist(&self, name: &str, description: &str)
        -> Result<String, CatalogError>;

    /// Append tracks in the given order.
    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String])
        -> Result<(), CatalogError>;
}

#[async_trait]
impl CatalogSearch for SpotifyClient {
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogCandidate>, CatalogError> {
        self.search_tracks(query).await
    }
}

#[async_trait]
impl PlaylistSink for SpotifyClient {
    async fn current_user(&self) -> Result<String, CatalogError> {
        self.current_user_id().await
    }

    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, CatalogError> {
        SpotifyClient::create_playlist(self, name, description).await
    }

    async fn add_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        SpotifyClient::add_tracks(self, playlist_id, track_ids).await
    }
}

#[async_trait]
impl<T: CatalogSearch + ?Sized> CatalogSearch for Arc<T> {
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogCandidate>, CatalogError> {
        (**self).search(query).await
    }
}

#[async_trait]
impl<T: PlaylistSink + ?Sized> PlaylistSink for Arc<T> {
    async fn current_user(&self) -> Result<String, CatalogError> {
        (**self).current_user().await
    }

    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, CatalogError> {
        (**self).create_playlist(name, description).await
    }

    async fn add_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), CatalogError> {
        (**self).add_tracks(playlist_id, track_ids).await
    }
}
