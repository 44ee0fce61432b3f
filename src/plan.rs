//! # Subscription Plans
//!
//! Three closed tiers decide two things: which playlists a user may play
//! and how many reward points each played track earns.
//!
//! ## Point formula
//!
//! ```text
//! Free => 5.0
//! Base => 10.0
//! Top  => points_before_this_track * 0.025   (compounding)
//! ```
//!
//! Moving into Top credits a one-time bonus of 100 points. The bonus flag
//! is set once per user lifetime, so leaving Top and coming back never
//! grants it again.
//!
//! ## Authorization
//!
//! [`authorize`] implements the tier × variant × visibility × ownership
//! table. Rules are evaluated top to bottom, first match wins, and the
//! ownership/authorship rules of a tier always run before its visibility
//! rule.

use crate::error::{Result, TierError};
use crate::library::Library;
use crate::playlist::{Playlist, PlaylistVariant};
use crate::user::User;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tier tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Free,
    Base,
    Top,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Free, Tier::Base, Tier::Top];

    #[must_use]
    pub fn is_premium(self) -> bool {
        !matches!(self, Self::Free)
    }
}

impl FromStr for Tier {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "base" | "premium-base" => Ok(Self::Base),
            "top" | "premium-top" => Ok(Self::Top),
            other => Err(TierError::InvalidOption(format!("unknown tier '{other}'"))),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Free => "free",
            Self::Base => "base",
            Self::Top => "top",
        })
    }
}

/// A user's plan: the tier plus the state only that tier carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plan {
    #[default]
    Free,
    Base { library: Library },
    Top { library: Library },
}

impl Plan {
    #[must_use]
    pub fn tier(&self) -> Tier {
        match self {
            Self::Free => Tier::Free,
            Self::Base { .. } => Tier::Base,
            Self::Top { .. } => Tier::Top,
        }
    }

    #[must_use]
    pub fn library(&self) -> Option<&Library> {
        match self {
            Self::Free => None,
            Self::Base { library } | Self::Top { library } => Some(library),
        }
    }

    pub fn library_mut(&mut self) -> Option<&mut Library> {
        match self {
            Self::Free => None,
            Self::Base { library } | Self::Top { library } => Some(library),
        }
    }

    /// Plan for `tier`, reusing `library` when the tier holds one.
    fn with_library(tier: Tier, library: Library) -> Self {
        match tier {
            Tier::Free => Self::Free,
            Tier::Base => Self::Base { library },
            Tier::Top => Self::Top { library },
        }
    }
}

/// Reward constants. Overridable from the runtime configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardSchedule {
    pub free_per_track: f64,
    pub base_per_track: f64,
    /// Fraction of the current balance earned per track on Top.
    pub top_rate: f64,
    /// One-time credit on first entry into Top.
    pub top_bonus: f64,
}

impl Default for RewardSchedule {
    fn default() -> Self {
        Self {
            free_per_track: 5.0,
            base_per_track: 10.0,
            top_rate: 0.025,
            top_bonus: 100.0,
        }
    }
}

/// Points earned for the next track, computed from the balance before the
/// credit is applied.
#[must_use]
pub fn points_per_track(user: &User, schedule: &RewardSchedule) -> f64 {
    match user.tier() {
        Tier::Free => schedule.free_per_track,
        Tier::Base => schedule.base_per_track,
        Tier::Top => user.points() * schedule.top_rate,
    }
}

/// Outcome of [`apply_tier_change`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierChange {
    pub previous: Tier,
    pub current: Tier,
    /// Points credited by this change (the Top bonus, or 0.0).
    pub bonus: f64,
}

/// Move `user` to `tier`.
///
/// The library survives moves between Base and Top (and re-assignment of
/// the same tier); moving to Free drops it. Entering Top while the bonus
/// flag is still unset credits the bonus and sets the flag.
pub fn apply_tier_change(user: &mut User, tier: Tier, schedule: &RewardSchedule) -> TierChange {
    let previous = user.tier();
    let library = user.plan_mut().library_mut().map(std::mem::take).unwrap_or_default();
    user.set_plan(Plan::with_library(tier, library));

    let mut bonus = 0.0;
    if tier == Tier::Top && !user.bonus_granted() {
        bonus = schedule.top_bonus;
        user.grant_bonus(bonus);
    }

    info!("User '{}' moved from {previous} to {tier} (bonus {bonus})", user.id);
    TierChange {
        previous,
        current: tier,
        bonus,
    }
}

/// Decide whether `user` may play `playlist`.
pub fn authorize(user: &User, playlist: &Playlist) -> Result<()> {
    decide(user.tier(), &user.id, playlist)
}

/// The authorization table, keyed on the tier and user id alone.
pub fn decide(tier: Tier, user_id: &str, playlist: &Playlist) -> Result<()> {
    let variant = playlist.variant();
    let authored = playlist.author() == user_id;

    match tier {
        Tier::Free => match variant {
            PlaylistVariant::Random => Ok(()),
            _ => Err(forbidden(tier, playlist)),
        },
        Tier::Base => {
            if *variant == PlaylistVariant::Personalized && authored {
                return Ok(());
            }
            if !playlist.is_public() {
                return Err(not_public(playlist));
            }
            match variant {
                PlaylistVariant::Random
                | PlaylistVariant::TimeGenre { .. }
                | PlaylistVariant::Personalized => Ok(()),
                PlaylistVariant::Favorites { .. } => Err(forbidden(tier, playlist)),
            }
        }
        Tier::Top => {
            match variant {
                PlaylistVariant::Favorites { owner } if owner == user_id => return Ok(()),
                PlaylistVariant::Personalized if authored => return Ok(()),
                _ => {}
            }
            if playlist.is_public() {
                Ok(())
            } else {
                Err(not_public(playlist))
            }
        }
    }
}

fn forbidden(tier: Tier, playlist: &Playlist) -> TierError {
    TierError::TierForbidden(format!(
        "{tier} tier cannot play {} playlist '{}'",
        playlist.variant(),
        playlist.name()
    ))
}

fn not_public(playlist: &Playlist) -> TierError {
    TierError::VisibilityDenied(format!("playlist '{}' is private", playlist.name()))
}
