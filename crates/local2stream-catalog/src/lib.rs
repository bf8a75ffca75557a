// SPDX-License-Identifier: GPL-3.0-or-later

//! Spotify Web API client used as the remote track catalog.
//!
//! This crate provides track search, playlist creation and playlist
//! population against the Spotify Web API. Requests are serialized through
//! a minimum-interval rate limiter and authorized by an [`AuthSession`]
//! token provider.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod rate_limiter;

pub use auth::{AuthSession, SpotifyAuth, SpotifyAuthBuilder, StaticToken};
pub use client::{SpotifyClient, SpotifyClientBuilder};
pub use error::{CatalogError, Result};
pub use models::{SearchResponse, TrackObject};
