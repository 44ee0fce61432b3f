//! Tiered music subscriptions: who may play what, how plays are rewarded,
//! and which tracks to recommend next.
//!
//! Core modules:
//! - [`plan`] - Tiers, reward points and the authorization table
//! - [`traversal`] - Per-variant playlist walks, including the interactive one
//! - [`recommend`] - Favorites from listening history, catalog generators
//! - [`engine`] - Thread-safe entry point owning all state
//!
//! ### Supporting Modules
//!
//! - [`catalog`], [`playlist`], [`library`], [`user`] - The data model
//! - [`error`] - Error taxonomy shared by every operation
//! - [`snapshot`] - Whole-state snapshots and the SQLite state file
//! - [`stats`] - Catalog and user statistics
//! - [`config`] - Data directory and runtime configuration
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use tiertune::catalog::Track;
//! use tiertune::engine::Engine;
//! use tiertune::plan::Tier;
//! use tiertune::playlist::NewPlaylist;
//! use tiertune::recommend::FavoritesMode;
//! use tiertune::traversal::ScriptedControl;
//! use tiertune::user::User;
//!
//! let engine = Engine::default();
//! engine.add_track(Track::new("M1", "So What", "Miles Davis", "Jazz", 545))?;
//! engine.add_track(Track::new("M2", "Blue in Green", "Miles Davis", "Jazz", 337))?;
//! engine.add_user(User::new("U1", "Ana"))?;
//!
//! // Free users may play Random playlists, at 5 points per track
//! engine.create_playlist(NewPlaylist::random("Mix", vec!["M1".into(), "M2".into()]))?;
//! let report = engine.play("U1", "Mix", &mut ScriptedControl::default())?;
//! assert_eq!(report.points_credited, 10.0);
//!
//! // Premium users get a library and favorites
//! engine.apply_tier_change("U1", Tier::Top)?;
//! let favorites = engine.generate_favorites("U1", "For Ana", FavoritesMode::Plain)?;
//! println!("{} recommended tracks", favorites.len());
//! # Ok::<(), tiertune::error::TierError>(())
//! ```
//!
//! ## Tiers
//!
//! | Tier | Points per track | Plays | Library |
//! |------|------------------|-------|---------|
//! | Free | 5 | Random only | no |
//! | Base | 10 | public Random / TimeGenre / Personalized, own Personalized | yes |
//! | Top | 2.5% of current balance | any public playlist, own Personalized and Favorites | yes |
//!
//! Entering Top for the first time credits a 100-point bonus, once per
//! user lifetime.
//!
//! ## Playlist Variants
//!
//! - **Random**: shuffled once per playback
//! - **TimeGenre**: generated for a genre under a duration cap, stored order
//! - **Personalized**: user-authored; shuffle-all or interactive walk
//! - **Favorites**: recommendation output, private to its owner
//!
//! ## Recommendation
//!
//! The top 3 genres (from history) and top 3 artists (from per-artist play
//! counts) select candidate tracks. Candidates are shuffled and then cut
//! to 10, packed under a duration cap, or restricted to explicit tracks.
//!
//! ## Error Handling
//!
//! Library operations return [`error::Result`] with a [`error::TierError`]:
//!
//! - Unknown user, track, album or playlist
//! - Duplicate ids and names
//! - Tier and visibility denials
//! - Invalid interactive input (handled by reprompting)
//!
//! The snapshot store and the binary wrap these with `anyhow` context.
//!
//! ## Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//! ```

pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod engine;
pub mod error;
pub mod library;
pub mod plan;
pub mod playlist;
pub mod recommend;
pub mod snapshot;
pub mod stats;
pub mod traversal;
pub mod user;

pub use error::{Result, TierError};
