// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub api_base_url: String,
    pub accounts_base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Refresh token from a prior authorization-code grant; needed to modify playlists.
    pub refresh_token: Option<String>,
    /// Pre-issued bearer token, used verbatim when set.
    pub access_token: Option<String>,
    pub timeout_secs: u64,
    pub rate_limit_interval_ms: u64,
    pub search_limit: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.spotify.com/v1".to_string(),
            accounts_base_url: "https://accounts.spotify.com".to_string(),
            client_id: None,
            client_secret: None,
            refresh_token: None,
            access_token: None,
            timeout_secs: 30,
            rate_limit_interval_ms: 100,
            search_limit: 50,
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LibraryConfig {
    pub music_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    pub name: String,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            name: "Local2Stream Playlist".to_string(),
            batch_size: 100,
            batch_delay_ms: 100,
        }
    }
}

impl PlaylistConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub max_concurrent_matches: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_matches: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub library: LibraryConfig,
    pub playlist: PlaylistConfig,
    pub pipeline: PipelineConfig,
    pub telemetry: TelemetryConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: LOCAL2STREAM_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("LOCAL2STREAM_").split("__"));

    let config: AppConfig = figment
        .extract()
        .context("failed to load local2stream configuration")?;
    info!(target: "config", "configuration loaded");
    Ok(config)
}
