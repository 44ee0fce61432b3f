//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `tiertune` binary. Every command loads
//! the state file, runs one engine operation and saves the state back when
//! something changed.
//!
//! ## Commands
//!
//! - `import` / `export`: seed or dump the state as JSON
//! - `play`: authorize and walk a playlist
//! - `listen-track` / `listen-album`: play outside any playlist
//! - `tier`: change a user's subscription tier
//! - `favorites`: generate a Favorites playlist from listening history
//! - `personalized`: create a user-authored playlist
//! - `generate`: build Random or TimeGenre catalog playlists
//! - `library`: manage a premium user's library
//! - `remove`: delete a user, track, album or playlist
//! - `stats`: catalog and user statistics
//!
//! ## Examples
//!
//! ```bash
//! tiertune import seed.json
//! tiertune tier U1 top
//! tiertune play U1 "Road trip" --mode interactive --actions play,next,play
//! tiertune favorites U1 "Evening" --max-duration 45
//! ```

use crate::plan::Tier;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "tiertune")]
#[command(about = "tiertune: tiered music subscriptions, playlists and recommendations")]
#[command(version)]
pub struct Args {
    /// State file to load and save
    ///
    /// Defaults to `state.db` in the platform data directory.
    #[arg(long, global = true, env = "TIERTUNE_STATE", value_hint = clap::ValueHint::FilePath)]
    pub state: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace the whole state with a JSON snapshot
    Import {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: PathBuf,
    },

    /// Write the whole state to a JSON file
    Export {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: PathBuf,
    },

    /// Play a playlist
    ///
    /// Random playlists are shuffled once; TimeGenre and Favorites play in
    /// stored order. Personalized playlists ask for a mode (shuffle or
    /// interactive) and, when interactive, an action per track. Answers are
    /// read from stdin unless `--actions` is given.
    Play {
        user: String,
        playlist: String,

        /// Mode for personalized playlists: "shuffle" or "interactive"
        #[arg(long)]
        mode: Option<String>,

        /// Scripted interactive actions, comma separated (play, next, back)
        #[arg(long, value_delimiter = ',')]
        actions: Option<Vec<String>>,
    },

    /// Play a single track
    ListenTrack { user: String, track: String },

    /// Play an album in order
    ListenAlbum { user: String, album: String },

    /// Change a user's tier (free, base, top)
    Tier { user: String, tier: Tier },

    /// Generate a Favorites playlist from listening history
    ///
    /// Premium users only. The playlist is private and saved to the user's
    /// library.
    Favorites {
        user: String,
        name: String,

        /// Cap the total duration, in minutes
        #[arg(long, conflicts_with = "explicit")]
        max_duration: Option<u32>,

        /// Only explicit tracks
        #[arg(long)]
        explicit: bool,
    },

    /// Create a personalized playlist and save it to the library
    Personalized {
        user: String,
        name: String,

        /// Track ids, in play order
        #[arg(required = true)]
        tracks: Vec<String>,

        /// Keep the playlist private
        #[arg(long)]
        private: bool,
    },

    /// Build catalog playlists
    Generate {
        #[command(subcommand)]
        kind: GenerateKind,
    },

    /// Manage a premium user's library
    Library {
        user: String,

        #[command(subcommand)]
        action: LibraryAction,
    },

    /// Delete a user, track, album or playlist
    ///
    /// Playlists and albums keep listing a removed track; playing them stops
    /// with an error when that track is reached.
    Remove {
        #[command(subcommand)]
        target: RemoveTarget,
    },

    /// Show catalog and user statistics
    Stats {
        /// Start of the listening interval (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// End of the listening interval, inclusive
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },

    /// Generate shell completions
    ///
    /// Usage: tiertune completion bash > ~/.local/share/bash-completion/completions/tiertune
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// List playlist names for completion (hidden command)
    #[command(hide = true)]
    CompletePlaylists,
}

#[derive(Subcommand, Debug)]
pub enum GenerateKind {
    /// Public playlist of random catalog tracks
    Random {
        name: String,

        /// Number of tracks
        #[arg(long, default_value = "10")]
        count: usize,
    },

    /// Public playlist of one genre, bounded by total duration
    TimeGenre {
        name: String,

        /// Genre, matched case-insensitively
        #[arg(long)]
        genre: String,

        /// Total duration cap, in minutes
        #[arg(long)]
        max_duration: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum LibraryAction {
    /// Save a public playlist
    AddPlaylist { name: String },
    /// Save an album
    AddAlbum { title: String },
    /// Show saved playlists and albums
    List,
}

#[derive(Subcommand, Debug)]
pub enum RemoveTarget {
    User { id: String },
    Track { id: String },
    Album { title: String },
    Playlist { name: String },
}
