//! # Playlist Traversal
//!
//! Each playlist variant has its own walk:
//!
//! - **Random**: shuffled once when playback starts, then played in that
//!   fixed order.
//! - **TimeGenre / Favorites**: stored order, no skipping.
//! - **Personalized**: the [`PlaybackControl`] picks shuffle-all or the
//!   interactive walk.
//!
//! ## Interactive walk
//!
//! ```text
//! position = 0
//! while 0 <= position < len:
//!     Play        -> play(track[position]); position += 1
//!     SkipForward -> position += 1
//!     SkipBack    -> position -= 1
//!     anything else -> reprompt, position unchanged
//! ```
//!
//! Walking off either end is a normal exit. A control that runs out of
//! input ends the walk as [`Finish::Cancelled`]; tracks already played stay
//! credited.
//!
//! Playing a track is delegated to a [`TrackPlayer`], so the same walk runs
//! over a plain `&mut User` / `&mut Catalog` pair ([`DirectPlayer`]) or over
//! the engine's locked state.

use crate::catalog::Catalog;
use crate::error::{Result, TierError};
use crate::plan::RewardSchedule;
use crate::playlist::{Playlist, PlaylistVariant};
use crate::user::{self, User};
use chrono::NaiveDate;
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::str::FromStr;

/// One step of the interactive walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Play,
    SkipForward,
    SkipBack,
}

impl FromStr for Action {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "p" | "play" => Ok(Self::Play),
            "2" | "n" | "next" | "skip" | "forward" => Ok(Self::SkipForward),
            "3" | "b" | "back" | "prev" | "previous" => Ok(Self::SkipBack),
            other => Err(TierError::InvalidOption(format!("unknown action '{other}'"))),
        }
    }
}

/// How a personalized playlist is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonalizedMode {
    Shuffle,
    Interactive,
}

impl FromStr for PersonalizedMode {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "s" | "shuffle" | "random" => Ok(Self::Shuffle),
            "2" | "i" | "interactive" => Ok(Self::Interactive),
            other => Err(TierError::InvalidOption(format!("unknown mode '{other}'"))),
        }
    }
}

/// Source of user decisions during playback.
///
/// `None` means no further input is coming (script exhausted, stdin
/// closed); the traversal stops as [`Finish::Cancelled`].
pub trait PlaybackControl {
    fn choose_mode(&mut self, playlist: &Playlist) -> Option<String>;

    fn next_action(&mut self, position: usize, track_id: &str) -> Option<String>;

    /// Called when an answer could not be parsed, before reprompting.
    fn rejected(&mut self, _input: &str, _error: &TierError) {}
}

/// Pre-recorded answers, consumed front to back.
#[derive(Debug, Clone, Default)]
pub struct ScriptedControl {
    modes: VecDeque<String>,
    actions: VecDeque<String>,
    rejections: usize,
}

impl ScriptedControl {
    #[must_use]
    pub fn new<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actions: actions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Queue an answer for the next mode prompt.
    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.modes.push_back(mode.into());
        self
    }

    /// Number of answers that were rejected and reprompted.
    #[must_use]
    pub fn rejections(&self) -> usize {
        self.rejections
    }
}

impl PlaybackControl for ScriptedControl {
    fn choose_mode(&mut self, _playlist: &Playlist) -> Option<String> {
        self.modes.pop_front()
    }

    fn next_action(&mut self, _position: usize, _track_id: &str) -> Option<String> {
        self.actions.pop_front()
    }

    fn rejected(&mut self, _input: &str, _error: &TierError) {
        self.rejections += 1;
    }
}

/// Line-oriented prompts over any reader/writer pair (stdin/stdout in the
/// binary).
pub struct PromptControl<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptControl<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self) -> Option<String> {
        let _ = self.output.flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl<R: BufRead, W: Write> PlaybackControl for PromptControl<R, W> {
    fn choose_mode(&mut self, playlist: &Playlist) -> Option<String> {
        let _ = write!(
            self.output,
            "'{}': [1] shuffle all  [2] interactive > ",
            playlist.name()
        );
        self.read_answer()
    }

    fn next_action(&mut self, position: usize, track_id: &str) -> Option<String> {
        let _ = write!(
            self.output,
            "#{} {track_id}: [1] play  [2] next  [3] back > ",
            position + 1
        );
        self.read_answer()
    }

    fn rejected(&mut self, _input: &str, error: &TierError) {
        let _ = writeln!(self.output, "{error}, try again");
    }
}

/// Plays single tracks and reports the credited points.
pub trait TrackPlayer {
    /// # Errors
    ///
    /// `NotFound` when the track no longer exists; nothing is credited then.
    fn play_track(&mut self, track_id: &str) -> Result<f64>;
}

/// Plays straight against borrowed state, without any locking.
pub struct DirectPlayer<'a> {
    pub user: &'a mut User,
    pub catalog: &'a mut Catalog,
    pub schedule: &'a RewardSchedule,
    pub on: NaiveDate,
}

impl TrackPlayer for DirectPlayer<'_> {
    fn play_track(&mut self, track_id: &str) -> Result<f64> {
        user::listen(self.user, self.catalog, track_id, self.schedule, self.on)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Finish {
    /// Walked past the last track (or played everything).
    #[default]
    Completed,
    /// Skipped back from the first track.
    Rewound,
    /// The control stopped answering.
    Cancelled,
}

/// What one playback did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackReport {
    pub played: Vec<String>,
    pub points_credited: f64,
    pub finish: Finish,
}

impl PlaybackReport {
    fn record(&mut self, track_id: &str, credit: f64) {
        self.played.push(track_id.to_string());
        self.points_credited += credit;
    }

    #[must_use]
    pub fn plays(&self) -> usize {
        self.played.len()
    }
}

/// Walk `playlist` with the strategy its variant calls for.
///
/// # Errors
///
/// Propagates the first failing track play. Plays before it stay committed.
pub fn traverse<C, P, R>(
    playlist: &Playlist,
    control: &mut C,
    player: &mut P,
    rng: &mut R,
) -> Result<PlaybackReport>
where
    C: PlaybackControl + ?Sized,
    P: TrackPlayer + ?Sized,
    R: Rng + ?Sized,
{
    let ids = playlist.track_ids();
    match playlist.variant() {
        PlaylistVariant::Random => play_sequence(&shuffled(ids, rng), player),
        PlaylistVariant::TimeGenre { .. } | PlaylistVariant::Favorites { .. } => {
            play_sequence(ids, player)
        }
        PlaylistVariant::Personalized => loop {
            let Some(input) = control.choose_mode(playlist) else {
                debug!("No mode chosen for '{}', playback cancelled", playlist.name());
                return Ok(PlaybackReport {
                    finish: Finish::Cancelled,
                    ..PlaybackReport::default()
                });
            };
            match input.parse::<PersonalizedMode>() {
                Ok(PersonalizedMode::Shuffle) => {
                    return play_sequence(&shuffled(ids, rng), player)
                }
                Ok(PersonalizedMode::Interactive) => return interactive(ids, control, player),
                Err(err) => {
                    warn!("Rejected mode '{input}': {err}");
                    control.rejected(&input, &err);
                }
            }
        },
    }
}

/// Play `ids` front to back.
pub fn play_sequence<P: TrackPlayer + ?Sized>(
    ids: &[String],
    player: &mut P,
) -> Result<PlaybackReport> {
    let mut report = PlaybackReport::default();
    for id in ids {
        let credit = player.play_track(id)?;
        report.record(id, credit);
    }
    Ok(report)
}

fn shuffled<R: Rng + ?Sized>(ids: &[String], rng: &mut R) -> Vec<String> {
    let mut order = ids.to_vec();
    order.shuffle(rng);
    order
}

fn interactive<C, P>(ids: &[String], control: &mut C, player: &mut P) -> Result<PlaybackReport>
where
    C: PlaybackControl + ?Sized,
    P: TrackPlayer + ?Sized,
{
    let mut report = PlaybackReport::default();
    let mut position = 0usize;

    report.finish = loop {
        let Some(track_id) = ids.get(position) else {
            break Finish::Completed;
        };
        let Some(input) = control.next_action(position, track_id) else {
            break Finish::Cancelled;
        };
        match input.parse::<Action>() {
            Ok(Action::Play) => {
                let credit = player.play_track(track_id)?;
                report.record(track_id, credit);
                position += 1;
            }
            Ok(Action::SkipForward) => position += 1,
            Ok(Action::SkipBack) => match position.checked_sub(1) {
                Some(previous) => position = previous,
                None => break Finish::Rewound,
            },
            Err(err) => {
                warn!("Rejected action '{input}' at position {position}: {err}");
                control.rejected(&input, &err);
            }
        }
    };

    debug!("Interactive walk ended {:?} after {} plays", report.finish, report.plays());
    Ok(report)
}
