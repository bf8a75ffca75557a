// SPDX-License-Identifier: GPL-3.0-or-later

use crate::auth::AuthSession;
use crate::error::{CatalogError, Result};
use crate::models::{
    track_uri, AddTracksRequest, CreatePlaylistRequest, Playlist, SearchResponse,
    SnapshotResponse, UserProfile,
};
use crate::rate_limiter::RateLimiter;
use local2stream_domain::{CatalogCandidate, CatalogQuery};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
const USER_AGENT: &str = concat!("Local2Stream/", env!("CARGO_PKG_VERSION"));

/// Spotify refuses more than this many URIs per playlist insertion.
pub const MAX_PLAYLIST_BATCH: usize = 100;

/// Spotify Web API client with rate limiting.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    base_url: String,
    auth: Arc<dyn AuthSession>,
    rate_limiter: RateLimiter,
    search_limit: u32,
    batch_size: usize,
    batch_delay: Duration,
}

impl std::fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("base_url", &self.base_url)
            .field("search_limit", &self.search_limit)
            .field("batch_size", &self.batch_size)
            .field("batch_delay", &self.batch_delay)
            .finish_non_exhaustive()
    }
}

impl SpotifyClient {
    /// Create a client builder around the given token provider.
    pub fn builder(auth: impl AuthSession + 'static) -> SpotifyClientBuilder {
        SpotifyClientBuilder::new(Arc::new(auth))
    }

    /// Search for tracks, returning candidates in the catalog's relevance order.
    ///
    /// The limit of `query` is capped by the client's configured search limit.
    ///
    /// # Example
    /// ```no_run
    /// # use local2stream_catalog::{SpotifyClient, StaticToken};
    /// # use local2stream_domain::CatalogQuery;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = SpotifyClient::builder(StaticToken::new("token")).build()?;
    /// let query = CatalogQuery::track_and_artist("One More Time", "Daft Punk");
    /// let candidates = client.search_tracks(&query).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search_tracks(&self, query: &CatalogQuery) -> Result<Vec<CatalogCandidate>> {
        let endpoint = format!("{}/search", self.base_url);
        let mut url = Url::parse(&endpoint)
            .map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", endpoint, e)))?;

        let limit = query.limit.min(self.search_limit).max(1);
        url.query_pairs_mut()
            .append_pair("q", &query.to_query_string())
            .append_pair("type", "track")
            .append_pair("limit", &limit.to_string());

        let response: SearchResponse = self.send(self.client.get(url.as_str()), url.as_str()).await?;
        let candidates = response.into_candidates();
        debug!(
            target: "catalog",
            query = %query,
            results = candidates.len(),
            "track search complete"
        );
        Ok(candidates)
    }

    /// ID of the user owning the access token.
    pub async fn current_user_id(&self) -> Result<String> {
        let url = format!("{}/me", self.base_url);
        let profile: UserProfile = self.send(self.client.get(&url), &url).await?;
        Ok(profile.id)
    }

    /// Create a private playlist for the current user and return its ID.
    pub async fn create_playlist(&self, name: &str, description: &str) -> Result<String> {
        let user_id = self.current_user_id().await?;
        let url = format!("{}/users/{}/playlists", self.base_url, user_id);
        let body = CreatePlaylistRequest {
            name,
            public: false,
            description,
        };

        let playlist: Playlist = self.send(self.client.post(&url).json(&body), &url).await?;
        debug!(target: "catalog", playlist_id = %playlist.id, name = %playlist.name, "playlist created");
        Ok(playlist.id)
    }

    /// Append tracks to a playlist in order, in batches with a pause after each.
    pub async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let url = format!("{}/playlists/{}/tracks", self.base_url, playlist_id);

        for (index, batch) in track_ids.chunks(self.batch_size).enumerate() {
            let body = AddTracksRequest {
                uris: batch.iter().map(|id| track_uri(id)).collect(),
            };
            let snapshot: SnapshotResponse =
                self.send(self.client.post(&url).json(&body), &url).await?;
            trace!(
                target: "catalog",
                batch = index,
                size = batch.len(),
                snapshot_id = %snapshot.snapshot_id,
                "playlist batch added"
            );
            tokio::time::sleep(self.batch_delay).await;
        }

        Ok(())
    }

    /// Authorize, rate-limit and send a request, decoding the JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        self.rate_limiter.acquire().await;
        let token = self.auth.access_token().await?;

        trace!(target: "catalog", "request {}", url);

        let response = request.bearer_auth(token).send().await?;

        let response = check_status(response, url).await?;
        let body = response.text().await?;
        trace!(target: "catalog", "response body: {}", body);

        serde_json::from_str(&body).map_err(|e| {
            CatalogError::InvalidResponse(format!("Failed to parse response: {}", e))
        })
    }
}

async fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    debug!(target: "catalog", "response status: {}", status);

    if status == 401 {
        return Err(CatalogError::Unauthorized);
    }

    if status == 404 {
        return Err(CatalogError::NotFound(url.to_string()));
    }

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        return Err(CatalogError::RateLimited { retry_after_secs });
    }

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(CatalogError::ApiError {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response)
}

/// Builder for configuring a Spotify client.
pub struct SpotifyClientBuilder {
    auth: Arc<dyn AuthSession>,
    base_url: String,
    timeout: Duration,
    rate_limit_interval: Duration,
    search_limit: u32,
    batch_size: usize,
    batch_delay: Duration,
}

impl SpotifyClientBuilder {
    fn new(auth: Arc<dyn AuthSession>) -> Self {
        Self {
            auth,
            base_url: SPOTIFY_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            rate_limit_interval: Duration::from_millis(100),
            search_limit: local2stream_domain::MAX_SEARCH_LIMIT,
            batch_size: MAX_PLAYLIST_BATCH,
            batch_delay: Duration::from_millis(100),
        }
    }

    /// Set a custom base URL (useful for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout duration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set rate limit interval between requests.
    pub fn rate_limit_interval(mut self, interval: Duration) -> Self {
        self.rate_limit_interval = interval;
        self
    }

    /// Cap on search results per request, clamped to `1..=50`.
    pub fn search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit.clamp(1, local2stream_domain::MAX_SEARCH_LIMIT);
        self
    }

    /// Playlist insertion batch size, clamped to `1..=100`.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.clamp(1, MAX_PLAYLIST_BATCH);
        self
    }

    /// Pause after each playlist insertion batch.
    pub fn batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Build the Spotify client.
    pub fn build(self) -> Result<SpotifyClient> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(SpotifyClient {
            client,
            base_url: self.base_url,
            auth: self.auth,
            rate_limiter: RateLimiter::new(self.rate_limit_interval),
            search_limit: self.search_limit,
            batch_size: self.batch_size,
            batch_delay: self.batch_delay,
        })
    }
}
