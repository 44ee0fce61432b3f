//! Statistics over a [`Snapshot`].
//!
//! Every "top" query returns `None` when the winning value would be zero,
//! and breaks ties on the smallest key.

use crate::catalog::Track;
use crate::playlist::Playlist;
use crate::snapshot::Snapshot;
use crate::user::User;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

fn best<V>(entries: impl IntoIterator<Item = (String, V)>) -> Option<(String, V)>
where
    V: PartialOrd + Default + Copy,
{
    let zero = V::default();
    entries
        .into_iter()
        .filter(|(_, value)| *value > zero)
        .fold(None, |best: Option<(String, V)>, (key, value)| match best {
            Some((best_key, best_value))
                if best_value > value || (best_value == value && best_key <= key) =>
            {
                Some((best_key, best_value))
            }
            _ => Some((key, value)),
        })
}

fn sum_by<'a, F>(tracks: &'a [Track], key: F) -> HashMap<String, u64>
where
    F: Fn(&'a Track) -> &'a str,
{
    let mut totals = HashMap::new();
    for track in tracks {
        *totals.entry(key(track).to_string()).or_insert(0) += track.play_count();
    }
    totals
}

/// Track with the highest play count.
#[must_use]
pub fn most_played_track(tracks: &[Track]) -> Option<(String, u64)> {
    best(tracks.iter().map(|t| (t.id.clone(), t.play_count())))
}

/// Artist whose tracks add up to the most plays.
#[must_use]
pub fn top_artist(tracks: &[Track]) -> Option<(String, u64)> {
    best(sum_by(tracks, |t| t.artist.as_str()))
}

#[must_use]
pub fn top_genre(tracks: &[Track]) -> Option<(String, u64)> {
    best(sum_by(tracks, |t| t.genre.as_str()))
}

/// User with the longest history.
#[must_use]
pub fn top_listener(users: &[User]) -> Option<(String, usize)> {
    best(users.iter().map(|u| (u.id.clone(), u.history_len())))
}

/// User with the longest history within `[start, end]`.
#[must_use]
pub fn top_listener_between(
    users: &[User],
    start: NaiveDate,
    end: NaiveDate,
) -> Option<(String, usize)> {
    best(users.iter().map(|u| (u.id.clone(), u.plays_between(start, end))))
}

#[must_use]
pub fn top_points(users: &[User]) -> Option<(String, f64)> {
    best(users.iter().map(|u| (u.id.clone(), u.points())))
}

/// Premium user with the most playlists saved in their library.
#[must_use]
pub fn top_collector(users: &[User]) -> Option<(String, usize)> {
    best(users.iter().filter_map(|u| {
        u.plan()
            .library()
            .map(|library| (u.id.clone(), library.playlist_count()))
    }))
}

#[must_use]
pub fn public_playlists(playlists: &[Playlist]) -> usize {
    playlists.iter().filter(|p| p.is_public()).count()
}

/// All queries at once, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub most_played_track: Option<(String, u64)>,
    pub top_artist: Option<(String, u64)>,
    pub top_genre: Option<(String, u64)>,
    pub top_listener: Option<(String, usize)>,
    pub top_points: Option<(String, f64)>,
    pub top_collector: Option<(String, usize)>,
    pub public_playlists: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_listener_in_range: Option<(String, usize)>,
}

#[must_use]
pub fn summarize(snapshot: &Snapshot, range: Option<(NaiveDate, NaiveDate)>) -> Summary {
    Summary {
        most_played_track: most_played_track(&snapshot.tracks),
        top_artist: top_artist(&snapshot.tracks),
        top_genre: top_genre(&snapshot.tracks),
        top_listener: top_listener(&snapshot.users),
        top_points: top_points(&snapshot.users),
        top_collector: top_collector(&snapshot.users),
        public_playlists: public_playlists(&snapshot.playlists),
        top_listener_in_range: range
            .and_then(|(start, end)| top_listener_between(&snapshot.users, start, end)),
    }
}
