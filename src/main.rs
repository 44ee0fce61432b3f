//! # tiertune
//!
//! Command-line front end over the engine. Each invocation loads the
//! state file, runs one command and saves the state back when the command
//! changed anything.
//!
//! ## Usage
//!
//! ```bash
//! tiertune import seed.json
//! tiertune listen-track U1 M1
//! tiertune tier U1 base
//! tiertune play U1 "Road trip"
//! tiertune remove track M7
//! tiertune stats --from 2024-01-01 --to 2024-12-31
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info, warn};
use std::io;
use tiertune::cli::{self, Command, GenerateKind, LibraryAction, RemoveTarget};
use tiertune::config::RuntimeConfig;
use tiertune::engine::Engine;
use tiertune::playlist::Visibility;
use tiertune::recommend::FavoritesMode;
use tiertune::traversal::{PlaybackControl, PlaybackReport, PromptControl, ScriptedControl};
use tiertune::{completion, snapshot, stats, TierError};

/// Main entry point for the tiertune application.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug tiertune play U1 Mix` - Per-track plays and selections
/// - `RUST_LOG=tiertune::engine=info tiertune ...` - Committed state changes only
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    let mut config = RuntimeConfig::load()?;
    if let Some(state) = args.state {
        config = config.with_state_path(state);
    }
    debug!("Using state file {}", config.state_path.display());

    match args.command {
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            let shell = completion::shell_to_completion_shell(&shell);
            completion::generate_completions(shell, &mut cmd);
            return Ok(());
        }
        Command::CompletePlaylists => {
            return completion::print_playlist_completions(&config.state_path, &mut io::stdout());
        }
        command => {
            let engine = Engine::new(config.rewards, config.recommend);
            if let Some(state) = snapshot::load(&config.state_path)? {
                engine
                    .restore(state)
                    .with_context(|| format!("Invalid state in {}", config.state_path.display()))?;
            }
            // A failed playback may still have credited earlier tracks.
            let outcome = run(&engine, command);
            if !matches!(outcome, Ok(false)) {
                snapshot::save(&config.state_path, &engine.snapshot())?;
            }
            if let Err(err) = &outcome {
                if err.downcast_ref::<TierError>().is_some_and(TierError::is_denial) {
                    warn!("Request denied: {err}");
                }
            }
            outcome?;
        }
    }

    Ok(())
}

/// Execute one command. Returns whether the state changed.
fn run(engine: &Engine, command: Command) -> Result<bool> {
    match command {
        Command::Import { path } => {
            let state = snapshot::import_json(&path)?;
            engine.restore(state).context("Snapshot failed validation")?;
            info!("Imported state from {}", path.display());
            println!("Imported {} users", engine.user_ids().len());
        }
        Command::Export { path } => {
            snapshot::export_json(&path, &engine.snapshot())?;
            println!("Exported state to {}", path.display());
            return Ok(false);
        }
        Command::Play {
            user,
            playlist,
            mode,
            actions,
        } => {
            let mut control: Box<dyn PlaybackControl> = match (actions, mode) {
                (Some(actions), mode) => {
                    let mode = mode.unwrap_or_else(|| "interactive".into());
                    Box::new(ScriptedControl::new(actions).with_mode(mode))
                }
                (None, Some(mode)) => Box::new(ScriptedControl::default().with_mode(mode)),
                (None, None) => Box::new(PromptControl::new(io::stdin().lock(), io::stdout())),
            };
            let report = engine.play(&user, &playlist, control.as_mut())?;
            print_report(&report);
        }
        Command::ListenTrack { user, track } => {
            let credit = engine.listen_track(&user, &track)?;
            println!("Played {track} (+{credit:.2} points)");
        }
        Command::ListenAlbum { user, album } => {
            let report = engine.listen_album(&user, &album)?;
            print_report(&report);
        }
        Command::Tier { user, tier } => {
            let change = engine.apply_tier_change(&user, tier)?;
            println!("{user}: {} -> {}", change.previous, change.current);
            if change.bonus > 0.0 {
                println!("Bonus credited: {:.2} points", change.bonus);
            }
        }
        Command::Favorites {
            user,
            name,
            max_duration,
            explicit,
        } => {
            let mode = match (max_duration, explicit) {
                (Some(minutes), _) => FavoritesMode::DurationCapped {
                    max_secs: minutes.saturating_mul(60),
                },
                (None, true) => FavoritesMode::ExplicitOnly,
                (None, false) => FavoritesMode::Plain,
            };
            let playlist = engine.generate_favorites(&user, &name, mode)?;
            println!("Created '{}' with {} tracks", playlist.name(), playlist.len());
        }
        Command::Personalized {
            user,
            name,
            tracks,
            private,
        } => {
            let visibility = if private { Visibility::Private } else { Visibility::Public };
            let playlist = engine.create_personalized_playlist(&user, &name, tracks, visibility)?;
            println!("Created '{}' with {} tracks", playlist.name(), playlist.len());
        }
        Command::Generate { kind } => {
            let playlist = match kind {
                GenerateKind::Random { name, count } => {
                    engine.create_random_playlist(&name, count)?
                }
                GenerateKind::TimeGenre {
                    name,
                    genre,
                    max_duration,
                } => {
                    let max_secs = max_duration.saturating_mul(60);
                    engine.create_time_genre_playlist(&name, max_secs, &genre)?
                }
            };
            println!("Created '{}' with {} tracks", playlist.name(), playlist.len());
        }
        Command::Library { user, action } => match action {
            LibraryAction::AddPlaylist { name } => engine.add_playlist_to_library(&user, &name)?,
            LibraryAction::AddAlbum { title } => engine.add_album_to_library(&user, &title)?,
            LibraryAction::List => {
                let library = engine.library(&user)?;
                println!(
                    "Playlists ({}): {}",
                    library.playlist_count(),
                    library.playlists().join(", ")
                );
                println!("Albums ({}): {}", library.album_count(), library.albums().join(", "));
                return Ok(false);
            }
        },
        Command::Remove { target } => {
            let removed = match target {
                RemoveTarget::User { id } => {
                    engine.remove_user(&id).map(|u| format!("user {}", u.id))
                }
                RemoveTarget::Track { id } => {
                    engine.remove_track(&id).map(|t| format!("track {}", t.id))
                }
                RemoveTarget::Album { title } => {
                    engine.remove_album(&title).map(|a| format!("album {}", a.title))
                }
                RemoveTarget::Playlist { name } => engine
                    .remove_playlist(&name)
                    .map(|p| format!("playlist {}", p.name())),
            }?;
            println!("Removed {removed}");
        }
        Command::Stats { from, to } => {
            let summary = stats::summarize(&engine.snapshot(), from.zip(to));
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(false);
        }
        Command::Completion { .. } | Command::CompletePlaylists => return Ok(false),
    }
    Ok(true)
}

fn print_report(report: &PlaybackReport) {
    for id in &report.played {
        println!("  {id}");
    }
    println!(
        "{} tracks, +{:.2} points ({:?})",
        report.plays(),
        report.points_credited,
        report.finish
    );
}
