// SPDX-License-Identifier: GPL-3.0-or-later

//! Access-token providers for the Spotify Web API.
//!
//! The interactive authorization-code flow happens outside this crate. What
//! remains here is turning configured credentials into bearer tokens:
//! a pre-issued token, a refresh-token grant (needed for playlist
//! modification), or a client-credentials grant (search only).

use crate::error::{CatalogError, Result};
use crate::models::TokenResponse;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

const SPOTIFY_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Tokens are renewed this long before their advertised expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Supplies bearer tokens for catalog requests.
#[async_trait]
pub trait AuthSession: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A fixed bearer token, typically obtained out of band.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AuthSession for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
enum Grant {
    ClientCredentials,
    RefreshToken,
}

#[derive(Debug)]
struct TokenState {
    refresh_token: Option<String>,
    cached: Option<CachedToken>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Token provider backed by the Spotify accounts service.
#[derive(Debug, Clone)]
pub struct SpotifyAuth {
    client: Client,
    accounts_base_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    grant: Grant,
    state: Arc<Mutex<TokenState>>,
}

impl SpotifyAuth {
    pub fn builder() -> SpotifyAuthBuilder {
        SpotifyAuthBuilder::default()
    }

    /// Whether tokens from this provider carry a user context.
    ///
    /// Client-credentials tokens can search but cannot touch playlists.
    pub fn has_user_context(&self) -> bool {
        matches!(self.grant, Grant::RefreshToken)
    }

    async fn request_token(&self, state: &TokenState) -> Result<TokenResponse> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or(CatalogError::MissingCredentials("catalog.client_id"))?;
        let client_secret = self
            .client_secret
            .as_deref()
            .ok_or(CatalogError::MissingCredentials("catalog.client_secret"))?;

        let mut form = vec![("grant_type", "client_credentials".to_string())];
        if let Grant::RefreshToken = self.grant {
            let refresh_token = state
                .refresh_token
                .clone()
                .ok_or(CatalogError::MissingCredentials("catalog.refresh_token"))?;
            form = vec![
                ("grant_type", "refresh_token".to_string()),
                ("refresh_token", refresh_token),
            ];
        }

        let url = format!("{}/api/token", self.accounts_base_url);
        trace!(target: "catalog", grant = ?self.grant, "POST {}", url);

        let response = self
            .client
            .post(&url)
            .basic_auth(client_id, Some(client_secret))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        debug!(target: "catalog", "token response status: {}", status);

        if status == 400 || status == 401 {
            return Err(CatalogError::Unauthorized);
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

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            CatalogError::InvalidResponse(format!("Failed to parse token response: {}", e))
        })
    }
}

#[async_trait]
impl AuthSession for SpotifyAuth {
    async fn access_token(&self) -> Result<String> {
        let mut state = self.state.lock().await;

        if let Some(cached) = state.cached.as_ref().filter(|token| token.is_fresh()) {
            return Ok(cached.value.clone());
        }

        let token = self.request_token(&state).await?;
        debug!(target: "catalog", expires_in = token.expires_in, "access token issued");

        if let Some(rotated) = token.refresh_token {
            state.refresh_token = Some(rotated);
        }
        // An expiry beyond the clock's range is not cached; the next call asks again.
        state.cached = Instant::now()
            .checked_add(Duration::from_secs(token.expires_in))
            .map(|expires_at| CachedToken {
                value: token.access_token.clone(),
                expires_at,
            });

        Ok(token.access_token)
    }
}

/// Builder for [`SpotifyAuth`].
#[derive(Debug)]
pub struct SpotifyAuthBuilder {
    accounts_base_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    timeout: Duration,
}

impl Default for SpotifyAuthBuilder {
    fn default() -> Self {
        Self {
            accounts_base_url: SPOTIFY_ACCOUNTS_BASE.to_string(),
            client_id: None,
            client_secret: None,
            refresh_token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl SpotifyAuthBuilder {
    /// Set a custom accounts service URL (useful for testing with mock servers).
    pub fn accounts_base_url(mut self, url: impl Into<String>) -> Self {
        self.accounts_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn client_id(mut self, client_id: Option<String>) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn client_secret(mut self, client_secret: Option<String>) -> Self {
        self.client_secret = client_secret;
        self
    }

    /// Use the refresh-token grant instead of client credentials.
    pub fn refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<SpotifyAuth> {
        let client = Client::builder().timeout(self.timeout).build()?;
        let grant = if self.refresh_token.is_some() {
            Grant::RefreshToken
        } else {
            Grant::ClientCredentials
        };

        Ok(SpotifyAuth {
            client,
            accounts_base_url: self.accounts_base_url,
            client_id: self.client_id,
            client_secret: self.client_secret,
            grant,
            state: Arc::new(Mutex::new(TokenState {
                refresh_token: self.refresh_token,
                cached: None,
            })),
        })
    }
}
