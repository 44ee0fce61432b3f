//! # Recommendation
//!
//! Favorites are derived from two signals in the user's history: the most
//! played genres and the most played artists. Any catalog track matching
//! either signal is a candidate.
//!
//! ## Pipeline
//!
//! ```text
//! history   --count genres--> top_genres(k)  \
//!                                              >-- candidates --shuffle--> select(mode)
//! artist_counts ------------> top_artists(k) /
//! ```
//!
//! Ranking ties break on the name, ascending, so a given history always
//! yields the same top-k. Randomness enters only through the shuffle, and
//! the caller supplies the RNG.
//!
//! The module also carries the catalog generators used to build Random and
//! TimeGenre playlists.

use crate::catalog::{Catalog, Track};
use crate::user::{HistoryEntry, User};
use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tunables for favorites generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// How many genres and artists count as "top".
    pub top_k: usize,
    /// Size limit for the plain and explicit-only modes.
    pub max_favorites: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_favorites: 10,
        }
    }
}

/// Selection rule applied to the shuffled candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoritesMode {
    /// The first `max_favorites` candidates.
    Plain,
    /// Greedy first fit under a total duration cap, in seconds.
    DurationCapped { max_secs: u32 },
    /// Explicit tracks only, then as `Plain`.
    ExplicitOnly,
}

impl FavoritesMode {
    fn filter(self) -> TrackFilter {
        match self {
            Self::ExplicitOnly => TrackFilter::ExplicitOnly,
            Self::Plain | Self::DurationCapped { .. } => TrackFilter::Any,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFilter {
    Any,
    ExplicitOnly,
}

impl TrackFilter {
    fn accepts(self, track: &Track) -> bool {
        match self {
            Self::Any => true,
            Self::ExplicitOnly => track.is_explicit(),
        }
    }
}

/// The `k` most played genres, descending by play count. History entries
/// whose track has left the catalog are ignored.
pub fn top_genres<'a, I>(history: I, catalog: &Catalog, k: usize) -> Vec<(String, u32)>
where
    I: IntoIterator<Item = &'a HistoryEntry>,
{
    let mut counts: HashMap<String, u32> = HashMap::new();
    for entry in history {
        if let Ok(track) = catalog.find_track(entry.track_id()) {
            *counts.entry(track.genre.clone()).or_insert(0) += 1;
        }
    }
    top_k(counts, k)
}

/// The `k` most played artists, descending by play count.
#[must_use]
pub fn top_artists(artist_counts: &HashMap<String, u32>, k: usize) -> Vec<(String, u32)> {
    top_k(artist_counts.clone(), k)
}

fn top_k(counts: HashMap<String, u32>, k: usize) -> Vec<(String, u32)> {
    let mut ranked: Vec<(String, u32)> = counts.into_iter().filter(|(_, n)| *n > 0).collect();
    ranked.sort_by(|(a_key, a_n), (b_key, b_n)| b_n.cmp(a_n).then_with(|| a_key.cmp(b_key)));
    ranked.truncate(k);
    ranked
}

/// Tracks whose genre is in `genres` or whose artist is in `artists`,
/// deduplicated, in id order.
pub fn candidates<'c>(
    catalog: &'c Catalog,
    genres: &[String],
    artists: &[String],
    filter: TrackFilter,
) -> Vec<&'c Track> {
    let mut found: Vec<&Track> = catalog
        .tracks()
        .filter(|t| filter.accepts(t))
        .filter(|t| genres.contains(&t.genre) || artists.contains(&t.artist))
        .collect();
    found.sort_by(|a, b| a.id.cmp(&b.id));
    found.dedup_by(|a, b| a.id == b.id);
    found
}

/// Shuffle `candidates` and apply `mode`.
pub fn select_favorites<R: Rng + ?Sized>(
    mut candidates: Vec<&Track>,
    mode: FavoritesMode,
    limit: usize,
    rng: &mut R,
) -> Vec<String> {
    candidates.shuffle(rng);
    match mode {
        FavoritesMode::Plain | FavoritesMode::ExplicitOnly => candidates
            .into_iter()
            .filter(|t| mode.filter().accepts(t))
            .take(limit)
            .map(|t| t.id.clone())
            .collect(),
        FavoritesMode::DurationCapped { max_secs } => fill_up_to(candidates, max_secs).0,
    }
}

/// Build the favorites selection for `user` end to end.
pub fn recommend<R: Rng + ?Sized>(
    user: &User,
    catalog: &Catalog,
    mode: FavoritesMode,
    config: &RecommendConfig,
    rng: &mut R,
) -> Vec<String> {
    let genres: Vec<String> = top_genres(user.history(), catalog, config.top_k)
        .into_iter()
        .map(|(genre, _)| genre)
        .collect();
    let artists: Vec<String> = top_artists(&user.artist_counts(), config.top_k)
        .into_iter()
        .map(|(artist, _)| artist)
        .collect();
    debug!("Top genres for '{}': {genres:?}, top artists: {artists:?}", user.id);

    let pool = candidates(catalog, &genres, &artists, mode.filter());
    trace!("{} candidates for '{}'", pool.len(), user.id);

    select_favorites(pool, mode, config.max_favorites, rng)
}

/// Up to `n` distinct track ids drawn uniformly from the catalog.
pub fn random_selection<R: Rng + ?Sized>(catalog: &Catalog, n: usize, rng: &mut R) -> Vec<String> {
    let mut ids: Vec<String> = catalog.tracks().map(|t| t.id.clone()).collect();
    ids.sort();
    ids.shuffle(rng);
    ids.truncate(n);
    ids
}

/// Shuffled tracks of `genre` (case-insensitive), greedily packed under
/// `max_secs`. Returns the ids and their total duration.
pub fn time_genre_selection<R: Rng + ?Sized>(
    catalog: &Catalog,
    max_secs: u32,
    genre: &str,
    rng: &mut R,
) -> (Vec<String>, u32) {
    let mut pool: Vec<&Track> = catalog
        .tracks()
        .filter(|t| t.genre.eq_ignore_ascii_case(genre))
        .collect();
    pool.sort_by(|a, b| a.id.cmp(&b.id));
    pool.shuffle(rng);
    fill_up_to(pool, max_secs)
}

fn fill_up_to(pool: Vec<&Track>, max_secs: u32) -> (Vec<String>, u32) {
    let mut total: u32 = 0;
    let mut picked = Vec::new();
    for track in pool {
        if let Some(next) = total.checked_add(track.duration_secs) {
            if next <= max_secs {
                total = next;
                picked.push(track.id.clone());
            }
        }
    }
    (picked, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TrackKind;
    use crate::plan::RewardSchedule;
    use crate::user::listen;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        let rows = [
            ("M01", "Ed", "Jazz", 200, TrackKind::Standard),
            ("M02", "Ed", "Jazz", 180, TrackKind::Explicit),
            ("M03", "Nina", "Soul", 240, TrackKind::Standard),
            ("M04", "Nina", "Blues", 300, TrackKind::Explicit),
            ("M05", "Ray", "Rock", 150, TrackKind::Standard),
            ("M06", "Ray", "Rock", 210, TrackKind::Standard),
            ("M07", "Zed", "Metal", 400, TrackKind::Explicit),
            ("M08", "Amy", "Pop", 190, TrackKind::Standard),
        ];
        for (id, artist, genre, secs, kind) in rows {
            catalog
                .add_track(Track::new(id, id, artist, genre, secs).with_kind(kind))
                .unwrap();
        }
        for i in 0..14 {
            catalog
                .add_track(Track::new(format!("J{i:02}"), "filler", "Miles", "Jazz", 120))
                .unwrap();
        }
        catalog
    }

    fn listener(catalog: &mut Catalog, plays: &[&str]) -> User {
        let mut user = User::new("u1", "Ana");
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        for id in plays {
            listen(&mut user, catalog, id, &RewardSchedule::default(), day).unwrap();
        }
        user
    }

    #[test]
    fn test_top_k_breaks_ties_by_name() {
        let counts = HashMap::from([
            ("b".to_string(), 2),
            ("a".to_string(), 2),
            ("c".to_string(), 5),
            ("d".to_string(), 1),
        ]);
        let ranked = top_artists(&counts, 3);
        assert_eq!(
            ranked,
            vec![("c".to_string(), 5), ("a".to_string(), 2), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn test_top_genres_skip_removed_tracks() {
        let mut catalog = catalog();
        let user = listener(&mut catalog, &["M05", "M05", "M01"]);
        catalog.remove_track("M05").unwrap();
        let genres = top_genres(user.history(), &catalog, 3);
        assert_eq!(genres, vec![("Jazz".to_string(), 1)]);
    }

    #[test]
    fn test_candidates_match_genre_or_artist() {
        let catalog = catalog();
        let genres = ["Rock".to_string()];
        let artists = ["Nina".to_string()];
        let found = candidates(&catalog, &genres, &artists, TrackFilter::Any);
        let ids: Vec<&str> = found.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["M03", "M04", "M05", "M06"]);
    }

    #[test]
    fn test_plain_is_capped_and_unique() {
        let mut catalog = catalog();
        let user = listener(&mut catalog, &["M01", "M02"]);
        let config = RecommendConfig::default();

        let mut rng = StdRng::seed_from_u64(4);
        let picked = recommend(&user, &catalog, FavoritesMode::Plain, &config, &mut rng);
        assert_eq!(picked.len(), 10);
        assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 10);
    }

    #[test]
    fn test_plain_takes_all_when_few_candidates() {
        let mut catalog = catalog();
        let user = listener(&mut catalog, &["M05"]);
        let picked = recommend(
            &user,
            &catalog,
            FavoritesMode::Plain,
            &RecommendConfig::default(),
            &mut StdRng::seed_from_u64(4),
        );
        let got: HashSet<_> = picked.iter().map(String::as_str).collect();
        assert_eq!(got, HashSet::from(["M05", "M06"]));
    }

    #[test]
    fn test_duration_cap_never_exceeded() {
        let mut catalog = catalog();
        let user = listener(&mut catalog, &["M01", "M03", "M05"]);
        for seed in 0..20 {
            let picked = recommend(
                &user,
                &catalog,
                FavoritesMode::DurationCapped { max_secs: 600 },
                &RecommendConfig::default(),
                &mut StdRng::seed_from_u64(seed),
            );
            let total: u32 = picked
                .iter()
                .map(|id| catalog.find_track(id).unwrap().duration_secs)
                .sum();
            assert!(total <= 600, "seed {seed} overshot: {total}");
            assert!(!picked.is_empty());
        }
    }

    #[test]
    fn test_explicit_only_filters_kind() {
        let mut catalog = catalog();
        let user = listener(&mut catalog, &["M01", "M03", "M07"]);
        let picked = recommend(
            &user,
            &catalog,
            FavoritesMode::ExplicitOnly,
            &RecommendConfig::default(),
            &mut StdRng::seed_from_u64(2),
        );
        assert!(!picked.is_empty());
        assert!(picked.iter().all(|id| catalog.find_track(id).unwrap().is_explicit()));
    }

    #[test]
    fn test_empty_history_yields_nothing() {
        let catalog = catalog();
        let user = User::new("u1", "Ana");
        let picked = recommend(
            &user,
            &catalog,
            FavoritesMode::Plain,
            &RecommendConfig::default(),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(picked.is_empty());
    }

    #[test]
    fn test_random_selection_is_distinct_and_bounded() {
        let catalog = catalog();
        let picked = random_selection(&catalog, 5, &mut StdRng::seed_from_u64(1));
        assert_eq!(picked.len(), 5);
        assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 5);

        let all = random_selection(&catalog, 1000, &mut StdRng::seed_from_u64(1));
        assert_eq!(all.len(), catalog.tracks().count());
    }

    #[test]
    fn test_time_genre_selection_is_case_insensitive() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(5);
        let (ids, total) = time_genre_selection(&catalog, 400, "rock", &mut rng);
        assert_eq!(total, 360);
        assert_eq!(ids.len(), 2);
    }
}
