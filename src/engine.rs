//! # Engine
//!
//! The `Engine` owns all state and exposes every operation the crate
//! offers. It is `Send + Sync`; share it behind an `Arc`.
//!
//! ## Locking
//!
//! ```text
//! users:   RwLock<HashMap<id, Arc<Mutex<User>>>>   map lock held only to clone a handle
//! catalog: RwLock<Catalog>                         write lock for play counts and inserts
//! ```
//!
//! Locks are always taken user first, then catalog, and the catalog lock
//! is never held while waiting on a user. Every user mutation (points,
//! bonus, history, library) happens under that user's mutex, so two
//! concurrent plays for the same user serialize per track and no credit is
//! lost. Playlist insertion checks and inserts under one catalog write
//! lock, so two creations with the same name cannot both succeed.
//!
//! Traversal takes the locks per track. A playback that is abandoned
//! between tracks leaves the earlier credits in place.
//!
//! Poisoned locks are recovered: each step leaves the state consistent
//! before any code that could panic runs.

use crate::catalog::{Album, Catalog, Track};
use crate::error::{EntityKind, Result, TierError};
use crate::library::Library;
use crate::plan::{self, RewardSchedule, Tier, TierChange};
use crate::playlist::{NewPlaylist, Playlist, Visibility};
use crate::recommend::{self, FavoritesMode, RecommendConfig};
use crate::snapshot::Snapshot;
use crate::traversal::{self, PlaybackControl, PlaybackReport, TrackPlayer};
use crate::user::{self, User};
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use rand::{thread_rng, Rng};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Source of "today" for history entries.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

type UserHandle = Arc<Mutex<User>>;

pub struct Engine {
    users: RwLock<HashMap<String, UserHandle>>,
    catalog: RwLock<Catalog>,
    rewards: RewardSchedule,
    recommend: RecommendConfig,
    clock: Clock,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(RewardSchedule::default(), RecommendConfig::default())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("users", &self.users_read().len())
            .field("rewards", &self.rewards)
            .field("recommend", &self.recommend)
            .finish_non_exhaustive()
    }
}

impl Engine {
    #[must_use]
    pub fn new(rewards: RewardSchedule, recommend: RecommendConfig) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            catalog: RwLock::new(Catalog::new()),
            rewards,
            recommend,
            clock: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Replace the date source used for history entries.
    #[must_use]
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    #[must_use]
    pub fn rewards(&self) -> &RewardSchedule {
        &self.rewards
    }

    // --- lock helpers ---------------------------------------------------

    fn users_read(&self) -> RwLockReadGuard<'_, HashMap<String, UserHandle>> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn users_write(&self) -> RwLockWriteGuard<'_, HashMap<String, UserHandle>> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn catalog_read(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn catalog_write(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, user_id: &str) -> Result<UserHandle> {
        self.users_read()
            .get(user_id)
            .cloned()
            .ok_or_else(|| TierError::not_found(EntityKind::User, user_id))
    }

    fn lock(handle: &UserHandle) -> MutexGuard<'_, User> {
        handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- users ----------------------------------------------------------

    pub fn add_user(&self, user: User) -> Result<()> {
        let mut users = self.users_write();
        if users.contains_key(&user.id) {
            return Err(TierError::already_exists(EntityKind::User, user.id));
        }
        info!("Added user '{}'", user.id);
        users.insert(user.id.clone(), Arc::new(Mutex::new(user)));
        Ok(())
    }

    /// Snapshot of the user record.
    pub fn find_user(&self, user_id: &str) -> Result<User> {
        let handle = self.handle(user_id)?;
        let user = Self::lock(&handle).clone();
        Ok(user)
    }

    pub fn remove_user(&self, user_id: &str) -> Result<User> {
        let handle = self
            .users_write()
            .remove(user_id)
            .ok_or_else(|| TierError::not_found(EntityKind::User, user_id))?;
        let user = Self::lock(&handle).clone();
        Ok(user)
    }

    /// All user ids, sorted.
    #[must_use]
    pub fn user_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.users_read().keys().cloned().collect();
        ids.sort();
        ids
    }

    // --- catalog --------------------------------------------------------

    pub fn add_track(&self, track: Track) -> Result<()> {
        self.catalog_write().add_track(track)
    }

    pub fn find_track(&self, id: &str) -> Result<Track> {
        self.catalog_read().find_track(id).cloned()
    }

    pub fn remove_track(&self, id: &str) -> Result<Track> {
        self.catalog_write().remove_track(id)
    }

    pub fn add_album(&self, album: Album) -> Result<()> {
        self.catalog_write().add_album(album)
    }

    pub fn find_album(&self, title: &str) -> Result<Album> {
        self.catalog_read().find_album(title).cloned()
    }

    pub fn remove_album(&self, title: &str) -> Result<Album> {
        self.catalog_write().remove_album(title)
    }

    /// Validate and insert a playlist in one catalog critical section.
    pub fn create_playlist(&self, request: NewPlaylist) -> Result<Playlist> {
        let mut catalog = self.catalog_write();
        let playlist = catalog.create_playlist(request)?;
        catalog.add_playlist(playlist.clone())?;
        info!("Created {} playlist '{}'", playlist.variant(), playlist.name());
        Ok(playlist)
    }

    pub fn find_playlist(&self, name: &str) -> Result<Playlist> {
        self.catalog_read().find_playlist(name).cloned()
    }

    pub fn remove_playlist(&self, name: &str) -> Result<Playlist> {
        self.catalog_write().remove_playlist(name)
    }

    // --- authorization and playback -------------------------------------

    /// Decide whether `user_id` may play the playlist named `playlist`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown user or playlist, otherwise the denial from
    /// the authorization table.
    pub fn authorize(&self, user_id: &str, playlist: &str) -> Result<()> {
        self.authorized_playlist(user_id, playlist).map(|_| ())
    }

    fn authorized_playlist(&self, user_id: &str, name: &str) -> Result<Playlist> {
        let handle = self.handle(user_id)?;
        let user = Self::lock(&handle);
        let catalog = self.catalog_read();
        let playlist = catalog.find_playlist(name)?;
        if let Err(err) = plan::authorize(&user, playlist) {
            warn!("Denied '{}' on '{name}': {err}", user.id);
            return Err(err);
        }
        Ok(playlist.clone())
    }

    /// Authorize, then walk the playlist with its variant's strategy.
    pub fn play<C>(&self, user_id: &str, playlist: &str, control: &mut C) -> Result<PlaybackReport>
    where
        C: PlaybackControl + ?Sized,
    {
        self.play_with_rng(user_id, playlist, control, &mut thread_rng())
    }

    /// [`Engine::play`] with a caller-supplied RNG for the shuffles.
    pub fn play_with_rng<C, R>(
        &self,
        user_id: &str,
        playlist: &str,
        control: &mut C,
        rng: &mut R,
    ) -> Result<PlaybackReport>
    where
        C: PlaybackControl + ?Sized,
        R: Rng + ?Sized,
    {
        let playlist = self.authorized_playlist(user_id, playlist)?;
        let mut player = self.player(user_id)?;
        let report = traversal::traverse(&playlist, control, &mut player, rng)?;
        info!(
            "'{user_id}' played {} tracks of '{}' ({:?}, +{:.3} points)",
            report.plays(),
            playlist.name(),
            report.finish,
            report.points_credited
        );
        Ok(report)
    }

    /// Play one track outside any playlist. Not tier-gated.
    pub fn listen_track(&self, user_id: &str, track_id: &str) -> Result<f64> {
        self.player(user_id)?.play_track(track_id)
    }

    /// Play an album in stored order. Not tier-gated.
    pub fn listen_album(&self, user_id: &str, title: &str) -> Result<PlaybackReport> {
        let mut player = self.player(user_id)?;
        let ids = self.catalog_read().find_album(title)?.track_ids().to_vec();
        traversal::play_sequence(&ids, &mut player)
    }

    fn player(&self, user_id: &str) -> Result<LockedPlayer<'_>> {
        Ok(LockedPlayer {
            engine: self,
            user: self.handle(user_id)?,
            on: self.today(),
        })
    }

    // --- plans ----------------------------------------------------------

    pub fn apply_tier_change(&self, user_id: &str, tier: Tier) -> Result<TierChange> {
        let handle = self.handle(user_id)?;
        let mut user = Self::lock(&handle);
        Ok(plan::apply_tier_change(&mut user, tier, &self.rewards))
    }

    // --- playlist generation --------------------------------------------

    /// Build a Favorites playlist for `user_id` from their history, insert
    /// it into the catalog and the user's library.
    ///
    /// # Errors
    ///
    /// - `TierForbidden` for Free users, before anything is created
    /// - `AlreadyExists` when the name is taken in the catalog or library
    pub fn generate_favorites(
        &self,
        user_id: &str,
        name: &str,
        mode: FavoritesMode,
    ) -> Result<Playlist> {
        self.generate_favorites_with_rng(user_id, name, mode, &mut thread_rng())
    }

    pub fn generate_favorites_with_rng<R: Rng + ?Sized>(
        &self,
        user_id: &str,
        name: &str,
        mode: FavoritesMode,
        rng: &mut R,
    ) -> Result<Playlist> {
        let handle = self.handle(user_id)?;
        let mut user = Self::lock(&handle);
        ensure_library_slot(&user, name, "generate favorites")?;

        let playlist = {
            let mut catalog = self.catalog_write();
            if catalog.has_playlist(name) {
                return Err(TierError::already_exists(EntityKind::Playlist, name));
            }
            let ids = recommend::recommend(&user, &catalog, mode, &self.recommend, rng);
            debug!("Favorites '{name}' for '{user_id}' ({mode:?}): {ids:?}");
            let playlist = catalog.create_playlist(NewPlaylist::favorites(name, ids, user_id))?;
            catalog.add_playlist(playlist.clone())?;
            playlist
        };

        save_to_library(&mut user, name)?;
        info!("Generated favorites '{name}' for '{user_id}' with {} tracks", playlist.len());
        Ok(playlist)
    }

    /// Create a user-authored playlist and save it to the author's library.
    pub fn create_personalized_playlist(
        &self,
        user_id: &str,
        name: &str,
        track_ids: Vec<String>,
        visibility: Visibility,
    ) -> Result<Playlist> {
        let handle = self.handle(user_id)?;
        let mut user = Self::lock(&handle);
        ensure_library_slot(&user, name, "create personalized playlists")?;

        let playlist = {
            let mut catalog = self.catalog_write();
            let request = NewPlaylist::personalized(name, track_ids, visibility, user_id);
            let playlist = catalog.create_playlist(request)?;
            catalog.add_playlist(playlist.clone())?;
            playlist
        };

        save_to_library(&mut user, name)?;
        info!("'{user_id}' created personalized playlist '{name}'");
        Ok(playlist)
    }

    /// Public Random playlist of up to `n` distinct catalog tracks.
    pub fn create_random_playlist(&self, name: &str, n: usize) -> Result<Playlist> {
        self.create_random_playlist_with_rng(name, n, &mut thread_rng())
    }

    pub fn create_random_playlist_with_rng<R: Rng + ?Sized>(
        &self,
        name: &str,
        n: usize,
        rng: &mut R,
    ) -> Result<Playlist> {
        let mut catalog = self.catalog_write();
        let ids = recommend::random_selection(&catalog, n, rng);
        let playlist = catalog.create_playlist(NewPlaylist::random(name, ids))?;
        catalog.add_playlist(playlist.clone())?;
        info!("Created random playlist '{name}' with {} tracks", playlist.len());
        Ok(playlist)
    }

    /// Public TimeGenre playlist packed under `max_secs`.
    pub fn create_time_genre_playlist(
        &self,
        name: &str,
        max_secs: u32,
        genre: &str,
    ) -> Result<Playlist> {
        self.create_time_genre_playlist_with_rng(name, max_secs, genre, &mut thread_rng())
    }

    pub fn create_time_genre_playlist_with_rng<R: Rng + ?Sized>(
        &self,
        name: &str,
        max_secs: u32,
        genre: &str,
        rng: &mut R,
    ) -> Result<Playlist> {
        let mut catalog = self.catalog_write();
        let (ids, total) = recommend::time_genre_selection(&catalog, max_secs, genre, rng);
        let playlist =
            catalog.create_playlist(NewPlaylist::time_genre(name, ids, max_secs, genre))?;
        catalog.add_playlist(playlist.clone())?;
        info!(
            "Created time-genre playlist '{name}' ({genre}, {total}s of {max_secs}s, {} tracks)",
            playlist.len()
        );
        Ok(playlist)
    }

    // --- library --------------------------------------------------------

    /// Save a public catalog playlist to the user's library.
    pub fn add_playlist_to_library(&self, user_id: &str, name: &str) -> Result<()> {
        let handle = self.handle(user_id)?;
        let mut user = Self::lock(&handle);
        if !user.tier().is_premium() {
            return Err(TierError::TierForbidden(format!(
                "{} tier has no library",
                user.tier()
            )));
        }
        {
            let catalog = self.catalog_read();
            let playlist = catalog.find_playlist(name)?;
            if !playlist.is_public() {
                return Err(TierError::VisibilityDenied(format!(
                    "playlist '{name}' is private"
                )));
            }
        }
        save_to_library(&mut user, name)
    }

    pub fn add_album_to_library(&self, user_id: &str, title: &str) -> Result<()> {
        let handle = self.handle(user_id)?;
        let mut user = Self::lock(&handle);
        let tier = user.tier();
        let Some(library) = user.plan_mut().library_mut() else {
            return Err(TierError::TierForbidden(format!("{tier} tier has no library")));
        };
        self.catalog_read().find_album(title)?;
        library.add_album(title)
    }

    /// Snapshot of the user's library.
    pub fn library(&self, user_id: &str) -> Result<Library> {
        let handle = self.handle(user_id)?;
        let user = Self::lock(&handle);
        user.plan()
            .library()
            .cloned()
            .ok_or_else(|| TierError::TierForbidden(format!("{} tier has no library", user.tier())))
    }

    // --- whole-state snapshot -------------------------------------------

    /// Copy of every collection. Users are read one at a time, before the
    /// catalog lock is taken.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let handles: Vec<UserHandle> = self.users_read().values().cloned().collect();
        let users = handles.iter().map(|h| Self::lock(h).clone()).collect();
        let catalog = self.catalog_read();
        Snapshot::new(
            users,
            catalog.tracks().cloned().collect(),
            catalog.albums().cloned().collect(),
            catalog.playlists().cloned().collect(),
        )
    }

    /// Replace all state with `snapshot`. The snapshot is validated in full
    /// before either lock is taken; on error nothing changes.
    pub fn restore(&self, snapshot: Snapshot) -> Result<()> {
        let Snapshot {
            users,
            tracks,
            albums,
            playlists,
        } = snapshot;
        let catalog = Catalog::from_parts(tracks, albums, playlists)?;

        let mut by_id = HashMap::with_capacity(users.len());
        for user in users {
            if by_id.contains_key(&user.id) {
                return Err(TierError::already_exists(EntityKind::User, user.id));
            }
            by_id.insert(user.id.clone(), Arc::new(Mutex::new(user)));
        }

        let mut users_guard = self.users_write();
        let mut catalog_guard = self.catalog_write();
        info!(
            "Restored {} users, {} tracks, {} playlists",
            by_id.len(),
            catalog.tracks().count(),
            catalog.playlists().count()
        );
        *users_guard = by_id;
        *catalog_guard = catalog;
        Ok(())
    }
}

/// Fails unless the user has a library that can take `name`.
fn ensure_library_slot(user: &User, name: &str, action: &str) -> Result<()> {
    match user.plan().library() {
        None => Err(TierError::TierForbidden(format!(
            "{} tier cannot {action}",
            user.tier()
        ))),
        Some(library) if library.contains_playlist(name) => {
            Err(TierError::already_exists(EntityKind::Playlist, name))
        }
        Some(_) => Ok(()),
    }
}

fn save_to_library(user: &mut User, name: &str) -> Result<()> {
    let tier = user.tier();
    match user.plan_mut().library_mut() {
        Some(library) => library.add_playlist(name),
        None => Err(TierError::TierForbidden(format!("{tier} tier has no library"))),
    }
}

/// Plays against the engine, taking the user lock then the catalog write
/// lock for each track.
struct LockedPlayer<'e> {
    engine: &'e Engine,
    user: UserHandle,
    on: NaiveDate,
}

impl TrackPlayer for LockedPlayer<'_> {
    fn play_track(&mut self, track_id: &str) -> Result<f64> {
        let mut user = Engine::lock(&self.user);
        let mut catalog = self.engine.catalog_write();
        user::listen(&mut user, &mut catalog, track_id, &self.engine.rewards, self.on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::{Finish, ScriptedControl};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::thread;

    fn engine() -> Engine {
        let engine = Engine::default().with_clock(|| NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        let tracks = [("M1", "Ed", "Jazz"), ("M2", "Ed", "Jazz"), ("M3", "Nina", "Soul")];
        for (id, artist, genre) in tracks {
            engine.add_track(Track::new(id, id, artist, genre, 180)).unwrap();
        }
        engine.add_user(User::new("U1", "Ana")).unwrap();
        engine
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_free_user_plays_random_playlist() {
        let engine = engine();
        engine.create_playlist(NewPlaylist::random("Mix", ids(&["M1", "M2", "M3"]))).unwrap();

        let report = engine.play("U1", "Mix", &mut ScriptedControl::default()).unwrap();
        assert_eq!(report.plays(), 3);

        let user = engine.find_user("U1").unwrap();
        assert_eq!(user.points(), 15.0);
        assert_eq!(user.history_len(), 3);
        assert!(user.history().all(|h| h.played_on() == engine.today()));
        assert_eq!(engine.find_track("M2").unwrap().play_count(), 1);
    }

    #[test]
    fn test_denied_play_changes_nothing() {
        let engine = engine();
        engine
            .create_playlist(NewPlaylist::time_genre("Jazz", ids(&["M1"]), 600, "Jazz"))
            .unwrap();

        let err = engine.play("U1", "Jazz", &mut ScriptedControl::default()).unwrap_err();
        assert!(matches!(err, TierError::TierForbidden(_)));
        assert_eq!(engine.find_user("U1").unwrap().points(), 0.0);
        assert_eq!(engine.find_track("M1").unwrap().play_count(), 0);
    }

    #[test]
    fn test_unknown_user_and_playlist() {
        let engine = engine();
        assert!(matches!(
            engine.authorize("nobody", "Mix"),
            Err(TierError::NotFound { kind: EntityKind::User, .. })
        ));
        assert!(matches!(
            engine.authorize("U1", "Mix"),
            Err(TierError::NotFound { kind: EntityKind::Playlist, .. })
        ));
    }

    #[test]
    fn test_free_favorites_forbidden_before_creation() {
        let engine = engine();
        let err = engine.generate_favorites("U1", "Fav", FavoritesMode::Plain).unwrap_err();
        assert!(matches!(err, TierError::TierForbidden(_)));
        assert!(engine.find_playlist("Fav").is_err());
    }

    #[test]
    fn test_favorites_land_in_catalog_and_library() {
        let engine = engine();
        engine.listen_track("U1", "M1").unwrap();
        engine.apply_tier_change("U1", Tier::Top).unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        let playlist = engine
            .generate_favorites_with_rng("U1", "Fav", FavoritesMode::Plain, &mut rng)
            .unwrap();
        assert_eq!(playlist.owner(), Some("U1"));
        assert!(!playlist.is_public());
        assert_eq!(playlist.len(), 2);
        assert!(engine.library("U1").unwrap().contains_playlist("Fav"));

        let again = engine.generate_favorites("U1", "Fav", FavoritesMode::Plain).unwrap_err();
        assert!(matches!(again, TierError::AlreadyExists { .. }));
        assert!(engine.authorize("U1", "Fav").is_ok());
    }

    #[test]
    fn test_personalized_interactive_credits_per_step() {
        let engine = engine();
        engine.apply_tier_change("U1", Tier::Base).unwrap();
        engine
            .create_personalized_playlist(
                "U1",
                "Mine",
                ids(&["M1", "M2", "M3"]),
                Visibility::Private,
            )
            .unwrap();

        let mut control =
            ScriptedControl::new(["play", "next", "back", "play"]).with_mode("interactive");
        let report = engine.play("U1", "Mine", &mut control).unwrap();

        assert_eq!(report.played, ids(&["M1", "M2"]));
        assert_eq!(report.finish, Finish::Cancelled);
        assert_eq!(engine.find_user("U1").unwrap().points(), 20.0);
    }

    #[test]
    fn test_library_rules() {
        let engine = engine();
        engine.create_playlist(NewPlaylist::random("Mix", ids(&["M1"]))).unwrap();
        engine.add_album(Album::new("Blue", ids(&["M1", "M2"]))).unwrap();

        assert!(matches!(
            engine.add_playlist_to_library("U1", "Mix"),
            Err(TierError::TierForbidden(_))
        ));

        engine.apply_tier_change("U1", Tier::Base).unwrap();
        engine.add_playlist_to_library("U1", "Mix").unwrap();
        engine.add_album_to_library("U1", "Blue").unwrap();
        assert!(matches!(
            engine.add_playlist_to_library("U1", "Mix"),
            Err(TierError::AlreadyExists { .. })
        ));

        engine.add_user(User::new("U2", "Rui")).unwrap();
        engine.apply_tier_change("U2", Tier::Base).unwrap();
        engine
            .create_personalized_playlist("U2", "Secret", ids(&["M3"]), Visibility::Private)
            .unwrap();
        assert!(matches!(
            engine.add_playlist_to_library("U1", "Secret"),
            Err(TierError::VisibilityDenied(_))
        ));

        let library = engine.library("U1").unwrap();
        assert_eq!(library.playlists(), ids(&["Mix"]));
        assert_eq!(library.albums(), ids(&["Blue"]));
    }

    #[test]
    fn test_listen_album_plays_in_order() {
        let engine = engine();
        engine.add_album(Album::new("Live", ids(&["M3", "M1"]))).unwrap();
        let report = engine.listen_album("U1", "Live").unwrap();
        assert_eq!(report.played, ids(&["M3", "M1"]));
    }

    #[test]
    fn test_concurrent_plays_lose_nothing() {
        let engine = Arc::new(engine());
        engine.create_playlist(NewPlaylist::random("Mix", ids(&["M1", "M2", "M3"]))).unwrap();
        engine.add_user(User::new("U2", "Rui")).unwrap();

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let engine = Arc::clone(&engine);
                let user = if i % 2 == 0 { "U1" } else { "U2" };
                thread::spawn(move || {
                    for _ in 0..10 {
                        engine.play(user, "Mix", &mut ScriptedControl::default()).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(engine.find_track("M1").unwrap().play_count(), 80);
        // 4 workers x 10 plays x 3 tracks at 5 points each
        assert_eq!(engine.find_user("U1").unwrap().points(), 600.0);
        assert_eq!(engine.find_user("U1").unwrap().history_len(), 120);
    }

    #[test]
    fn test_same_name_creations_race_to_one_winner() {
        let engine = Arc::new(engine());
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    engine
                        .create_playlist(NewPlaylist::random("Dup", ids(&["M1"])))
                        .is_ok()
                })
            })
            .collect();
        let wins = workers.into_iter().filter_map(|w| w.join().ok()).filter(|ok| *ok).count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn test_restore_replaces_everything() {
        let engine = engine();
        engine.listen_track("U1", "M1").unwrap();
        let saved = engine.snapshot();

        engine.add_user(User::new("U9", "Temp")).unwrap();
        engine.listen_track("U1", "M2").unwrap();
        engine.restore(saved).unwrap();

        assert_eq!(engine.user_ids(), ids(&["U1"]));
        assert_eq!(engine.find_user("U1").unwrap().points(), 5.0);
        assert_eq!(engine.find_track("M2").unwrap().play_count(), 0);
    }

    #[test]
    fn test_own_snapshot_restores_after_track_removal() {
        let engine = engine();
        engine.create_playlist(NewPlaylist::random("Mix", ids(&["M1", "M2"]))).unwrap();
        engine.add_album(Album::new("Live", ids(&["M2", "M3"]))).unwrap();
        engine.remove_track("M2").unwrap();

        let fresh = Engine::default();
        fresh.restore(engine.snapshot()).unwrap();
        assert_eq!(fresh.snapshot(), engine.snapshot());
        assert!(matches!(
            fresh.listen_album("U1", "Live"),
            Err(TierError::NotFound { kind: EntityKind::Track, .. })
        ));
    }

    #[test]
    fn test_invalid_restore_leaves_state_alone() {
        let engine = engine();
        let mut broken = engine.snapshot();
        broken.users.push(User::new("U1", "Twin"));

        assert!(engine.restore(broken).is_err());
        assert_eq!(engine.user_ids(), ids(&["U1"]));
    }
}
