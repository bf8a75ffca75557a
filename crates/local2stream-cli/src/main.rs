// SPDX-License-Identifier: GPL-3.0-or-later
mod cli;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Args, Command};
use local2stream_application::{
    load_library, CandidateMatcher, TransferError, TransferRequest, TransferService,
    TransferStats,
};
use local2stream_catalog::{SpotifyAuth, SpotifyClient, StaticToken};
use local2stream_config::{load as load_config, AppConfig};
use local2stream_domain::{LocalTrack, MatchOutcome, TrackQuery};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    init_tracing(&config.telemetry.log_level);

    tokio::select! {
        result = run(args.command, &config) => result,
        signal = shutdown_signal() => {
            signal?;
            bail!("interrupted")
        }
    }
}

fn init_tracing(default_level: &str) {
    let fmt_layer = fmt::layer().with_target(true).with_level(true);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

async fn run(command: Command, config: &AppConfig) -> Result<()> {
    match command {
        Command::Scan { path } => scan(&path).await,
        Command::Match {
            title,
            artist,
            json,
        } => match_one(config, TrackQuery::new(title, artist), json).await,
        Command::Transfer {
            dir,
            playlist,
            dry_run,
        } => transfer(config, dir, playlist, dry_run).await,
    }
}

async fn scan(path: &Path) -> Result<()> {
    let root = path.to_path_buf();
    let tracks = tokio::task::spawn_blocking(move || load_library(root))
        .await
        .context("library scan task failed")??;

    for track in &tracks {
        println!("{}", describe_track(track));
    }
    println!("{} audio files", tracks.len());
    Ok(())
}

async fn match_one(config: &AppConfig, query: TrackQuery, json: bool) -> Result<()> {
    let matcher = CandidateMatcher::new(build_client(config)?)
        .with_search_limit(config.catalog.search_limit);
    let outcome = matcher
        .find_match(&query)
        .await
        .with_context(|| format!("catalog search failed for '{}'", query))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        Some(outcome) => println!("{}", describe_outcome(&outcome)),
        None => println!("not found"),
    }
    Ok(())
}

async fn transfer(
    config: &AppConfig,
    dir: Option<PathBuf>,
    playlist: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let Some(music_directory) = dir.or_else(|| config.library.music_directory.clone()) else {
        bail!("no music directory given; pass --dir or set library.music_directory");
    };

    let client = Arc::new(build_client(config)?);
    let service = TransferService::new(Arc::clone(&client), client)
        .with_search_limit(config.catalog.search_limit)
        .with_max_concurrent_matches(config.pipeline.max_concurrent_matches);

    let request = TransferRequest {
        music_directory,
        playlist_name: playlist.unwrap_or_else(|| config.playlist.name.clone()),
        dry_run,
    };

    info!(
        target: "cli",
        directory = %request.music_directory.display(),
        playlist = %request.playlist_name,
        dry_run,
        "starting transfer"
    );

    match service.run(&request).await {
        Ok(report) => {
            println!("{}", render_summary(&report.stats));
            match report.playlist_id {
                Some(id) => println!("Playlist: {} ({})", request.playlist_name, id),
                None => println!("Dry run: {} tracks would be added", report.track_ids().len()),
            }
            Ok(())
        }
        Err(TransferError::NoTracksMatched(report)) => {
            println!("{}", render_summary(&report.stats));
            bail!("no tracks matched on the catalog")
        }
        Err(err) => Err(err.into()),
    }
}

fn build_client(config: &AppConfig) -> Result<SpotifyClient> {
    let catalog = &config.catalog;

    let builder = match catalog.access_token.as_deref() {
        Some(token) => SpotifyClient::builder(StaticToken::new(token)),
        None => {
            let auth = SpotifyAuth::builder()
                .accounts_base_url(&catalog.accounts_base_url)
                .client_id(catalog.client_id.clone())
                .client_secret(catalog.client_secret.clone())
                .refresh_token(catalog.refresh_token.clone())
                .timeout(catalog.timeout())
                .build()
                .context("failed to build catalog auth session")?;
            if !auth.has_user_context() {
                warn!(target: "cli", "no refresh token configured; playlist creation will fail");
            }
            SpotifyClient::builder(auth)
        }
    };

    builder
        .base_url(&catalog.api_base_url)
        .timeout(catalog.timeout())
        .rate_limit_interval(catalog.rate_limit_interval())
        .search_limit(catalog.search_limit)
        .batch_size(config.playlist.batch_size)
        .batch_delay(config.playlist.batch_delay())
        .build()
        .context("failed to build catalog client")
}

fn describe_track(track: &LocalTrack) -> String {
    let mut line = format!(
        "[{}] {} - {}",
        track.source, track.query.artist, track.query.title
    );
    if !track.album.is_empty() {
        line.push_str(&format!(" ({})", track.album));
    }
    if let Some(seconds) = track.duration_seconds {
        line.push_str(&format!(" {}:{:02}", seconds / 60, seconds % 60));
    }
    line.push_str(&format!("  {}", track.path.display()));
    line
}

fn describe_outcome(outcome: &MatchOutcome) -> String {
    format!(
        "[{}] {} - {} ({}, confidence {:.2})",
        outcome.kind,
        outcome.candidate_artist,
        outcome.candidate_name,
        outcome.candidate_id,
        outcome.confidence
    )
}

fn render_summary(stats: &TransferStats) -> String {
    let mut lines = vec![
        "==== SUMMARY ====".to_string(),
        format!("Total files: {}", stats.total_files),
        format!("Exact matches: {}", stats.exact),
        format!("Fuzzy matches: {}", stats.fuzzy),
        format!("Title only matches: {}", stats.title_only),
        format!("Artist fallback matches: {}", stats.artist_fallback),
        format!("Not found: {}", stats.not_found),
    ];
    if stats.failed > 0 {
        lines.push(format!("Failed: {}", stats.failed));
    }
    if stats.total_files > 0 {
        lines.push(format!("Success rate: {:.1}%", stats.success_rate()));
    }
    lines.join("\n")
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt =
            signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
        let mut terminate =
            signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

        tokio::select! {
            _ = interrupt.recv() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("failed to install ctrl_c handler")?;

    info!(target: "cli", "shutdown signal received");
    Ok(())
}
