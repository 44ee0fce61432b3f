//! Users, their listening history and the per-track play bookkeeping.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::plan::{self, Plan, RewardSchedule, Tier};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One listened track. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    track_id: String,
    played_on: NaiveDate,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(track_id: impl Into<String>, played_on: NaiveDate) -> Self {
        Self {
            track_id: track_id.into(),
            played_on,
        }
    }

    #[must_use]
    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    #[must_use]
    pub fn played_on(&self) -> NaiveDate {
        self.played_on
    }
}

/// A subscriber.
///
/// Points only grow, the bonus flag flips at most once and history is
/// append-only; the fields behind those rules are private and only the
/// crate's play and tier-change paths touch them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    points: f64,
    #[serde(default)]
    plan: Plan,
    #[serde(default)]
    bonus_granted: bool,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default)]
    artist_counts: HashMap<String, u32>,
}

impl User {
    /// A Free user with no points and no history.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            address: String::new(),
            points: 0.0,
            plan: Plan::Free,
            bonus_granted: false,
            history: Vec::new(),
            artist_counts: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_contact(mut self, email: impl Into<String>, address: impl Into<String>) -> Self {
        self.email = email.into();
        self.address = address.into();
        self
    }

    #[must_use]
    pub fn points(&self) -> f64 {
        self.points
    }

    #[must_use]
    pub fn tier(&self) -> Tier {
        self.plan.tier()
    }

    #[must_use]
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub(crate) fn plan_mut(&mut self) -> &mut Plan {
        &mut self.plan
    }

    pub(crate) fn set_plan(&mut self, plan: Plan) {
        self.plan = plan;
    }

    #[must_use]
    pub fn bonus_granted(&self) -> bool {
        self.bonus_granted
    }

    /// Credit the Top bonus. Callers check the flag first.
    pub(crate) fn grant_bonus(&mut self, amount: f64) {
        self.credit(amount);
        self.bonus_granted = true;
    }

    /// Listening history, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Snapshot of the per-artist play counts.
    #[must_use]
    pub fn artist_counts(&self) -> HashMap<String, u32> {
        self.artist_counts.clone()
    }

    #[must_use]
    pub fn artist_count(&self, artist: &str) -> u32 {
        self.artist_counts.get(artist).copied().unwrap_or(0)
    }

    /// Number of history entries dated within `[start, end]`.
    #[must_use]
    pub fn plays_between(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.history
            .iter()
            .filter(|h| h.played_on >= start && h.played_on <= end)
            .count()
    }

    fn credit(&mut self, amount: f64) {
        // Points never decrease; a negative or NaN credit is dropped.
        if amount > 0.0 {
            self.points += amount;
        }
    }
}

/// Play one track for `user`.
///
/// Order of effects: the track's play count, the credit computed from the
/// pre-credit balance, the balance itself, the history entry and finally
/// the artist count. A missing track fails before anything changes.
/// Returns the credited points.
pub fn listen(
    user: &mut User,
    catalog: &mut Catalog,
    track_id: &str,
    schedule: &RewardSchedule,
    on: NaiveDate,
) -> Result<f64> {
    let track = catalog.record_play(track_id)?;
    let credit = plan::points_per_track(user, schedule);
    user.credit(credit);
    user.history.push(HistoryEntry::new(track.id.as_str(), on));
    *user.artist_counts.entry(track.artist.clone()).or_insert(0) += 1;

    debug!(
        "User '{}' played '{}' by {} (+{credit:.3} points, total {:.3})",
        user.id, track.id, track.artist, user.points
    );
    Ok(credit)
}
