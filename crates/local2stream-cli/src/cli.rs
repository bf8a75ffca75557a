// SPDX-License-Identifier: GPL-3.0-or-later

//! Command-line arguments.
//!
//! ```bash
//! local2stream scan ~/Music
//! local2stream match --title "One More Time" --artist "Daft Punk"
//! local2stream --config local2stream.toml transfer --dir ~/Music --dry-run
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "local2stream")]
#[command(about = "Match a local music library against Spotify and build a playlist")]
#[command(version)]
pub struct Args {
    /// TOML configuration file; LOCAL2STREAM_* environment variables override it
    #[arg(long, global = true, env = "LOCAL2STREAM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the metadata extracted from every audio file under a directory
    ///
    /// Works offline; no catalog requests are made.
    Scan {
        /// Music directory to scan recursively
        path: PathBuf,
    },

    /// Match a single title/artist pair against the catalog
    Match {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        artist: String,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Match a whole library and add the hits to a new playlist
    Transfer {
        /// Music directory; defaults to library.music_directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Playlist name; defaults to playlist.name
        #[arg(long)]
        playlist: Option<String>,

        /// Match and report without creating a playlist
        #[arg(long)]
        dry_run: bool,
    },
}
