//! # Catalog
//!
//! Plain keyed storage for tracks, albums and playlists. Users are kept by
//! the [`Engine`](crate::engine::Engine) instead, each behind its own lock.
//!
//! The catalog validates on insert (unique keys, referenced tracks must
//! exist) and hands out shared references or owned clones; the only
//! mutation the core performs on a stored record is [`Catalog::record_play`].

use crate::error::{EntityKind, Result, TierError};
use crate::playlist::{NewPlaylist, Playlist};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Track kind. Explicit tracks are the only ones eligible for
/// explicit-only favorites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    #[default]
    Standard,
    Explicit,
    Multimedia,
}

impl FromStr for TrackKind {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "normal" => Ok(Self::Standard),
            "explicit" => Ok(Self::Explicit),
            "multimedia" | "video" => Ok(Self::Multimedia),
            other => Err(TierError::InvalidOption(format!("unknown track kind '{other}'"))),
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standard => "standard",
            Self::Explicit => "explicit",
            Self::Multimedia => "multimedia",
        })
    }
}

/// A catalog track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub lyrics: String,
    pub genre: String,
    pub duration_secs: u32,
    #[serde(default)]
    pub kind: TrackKind,
    /// Only ever incremented, once per successful play.
    #[serde(default)]
    play_count: u64,
}

impl Track {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        artist: impl Into<String>,
        genre: impl Into<String>,
        duration_secs: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artist: artist.into(),
            label: String::new(),
            lyrics: String::new(),
            genre: genre.into(),
            duration_secs,
            kind: TrackKind::Standard,
            play_count: 0,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: TrackKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_lyrics(mut self, lyrics: impl Into<String>) -> Self {
        self.lyrics = lyrics.into();
        self
    }

    #[must_use]
    pub fn play_count(&self) -> u64 {
        self.play_count
    }

    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.kind == TrackKind::Explicit
    }
}

/// An album: a titled, ordered list of track ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub title: String,
    track_ids: Vec<String>,
}

impl Album {
    #[must_use]
    pub fn new(title: impl Into<String>, track_ids: Vec<String>) -> Self {
        Self {
            title: title.into(),
            track_ids,
        }
    }

    #[must_use]
    pub fn track_ids(&self) -> &[String] {
        &self.track_ids
    }
}

/// Tracks, albums and playlists keyed by id / title / name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracks: HashMap<String, Track>,
    albums: HashMap<String, Album>,
    playlists: HashMap<String, Playlist>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from snapshot collections, enforcing key uniqueness.
    ///
    /// Albums and playlists may still list tracks removed after they were
    /// created; playback reports those as `NotFound` when it reaches them.
    pub fn from_parts(
        tracks: Vec<Track>,
        albums: Vec<Album>,
        playlists: Vec<Playlist>,
    ) -> Result<Self> {
        let mut catalog = Self::new();
        for track in tracks {
            catalog.add_track(track)?;
        }
        for album in albums {
            if catalog.albums.contains_key(&album.title) {
                return Err(TierError::already_exists(EntityKind::Album, album.title));
            }
            catalog.albums.insert(album.title.clone(), album);
        }
        for playlist in playlists {
            catalog.add_playlist(playlist)?;
        }
        Ok(catalog)
    }

    // --- tracks ---------------------------------------------------------

    pub fn add_track(&mut self, track: Track) -> Result<()> {
        if self.tracks.contains_key(&track.id) {
            return Err(TierError::already_exists(EntityKind::Track, track.id));
        }
        self.tracks.insert(track.id.clone(), track);
        Ok(())
    }

    pub fn find_track(&self, id: &str) -> Result<&Track> {
        self.tracks
            .get(id)
            .ok_or_else(|| TierError::not_found(EntityKind::Track, id))
    }

    pub fn remove_track(&mut self, id: &str) -> Result<Track> {
        self.tracks
            .remove(id)
            .ok_or_else(|| TierError::not_found(EntityKind::Track, id))
    }

    #[must_use]
    pub fn has_track(&self, id: &str) -> bool {
        self.tracks.contains_key(id)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Increment the play count of `id` and return a snapshot of the track
    /// as it is after the increment.
    pub fn record_play(&mut self, id: &str) -> Result<Track> {
        let track = self
            .tracks
            .get_mut(id)
            .ok_or_else(|| TierError::not_found(EntityKind::Track, id))?;
        track.play_count += 1;
        Ok(track.clone())
    }

    // --- albums ---------------------------------------------------------

    pub fn add_album(&mut self, album: Album) -> Result<()> {
        if self.albums.contains_key(&album.title) {
            return Err(TierError::already_exists(EntityKind::Album, album.title));
        }
        self.validate_tracks(album.track_ids())?;
        self.albums.insert(album.title.clone(), album);
        Ok(())
    }

    pub fn find_album(&self, title: &str) -> Result<&Album> {
        self.albums
            .get(title)
            .ok_or_else(|| TierError::not_found(EntityKind::Album, title))
    }

    pub fn remove_album(&mut self, title: &str) -> Result<Album> {
        self.albums
            .remove(title)
            .ok_or_else(|| TierError::not_found(EntityKind::Album, title))
    }

    pub fn albums(&self) -> impl Iterator<Item = &Album> {
        self.albums.values()
    }

    // --- playlists ------------------------------------------------------

    /// Validate a creation request and construct the record. The playlist
    /// is not inserted; see [`Catalog::add_playlist`].
    pub fn create_playlist(&self, request: NewPlaylist) -> Result<Playlist> {
        self.validate_tracks(&request.track_ids)?;
        Ok(request.build())
    }

    /// Insert a playlist, failing if the name is taken. Check and insert
    /// happen under the same `&mut` borrow, so callers holding the catalog
    /// write lock get compare-and-insert semantics.
    pub fn add_playlist(&mut self, playlist: Playlist) -> Result<()> {
        if self.playlists.contains_key(playlist.name()) {
            return Err(TierError::already_exists(EntityKind::Playlist, playlist.name()));
        }
        self.playlists.insert(playlist.name().to_string(), playlist);
        Ok(())
    }

    pub fn find_playlist(&self, name: &str) -> Result<&Playlist> {
        self.playlists
            .get(name)
            .ok_or_else(|| TierError::not_found(EntityKind::Playlist, name))
    }

    pub fn remove_playlist(&mut self, name: &str) -> Result<Playlist> {
        self.playlists
            .remove(name)
            .ok_or_else(|| TierError::not_found(EntityKind::Playlist, name))
    }

    #[must_use]
    pub fn has_playlist(&self, name: &str) -> bool {
        self.playlists.contains_key(name)
    }

    pub fn playlists(&self) -> impl Iterator<Item = &Playlist> {
        self.playlists.values()
    }

    fn validate_tracks(&self, ids: &[String]) -> Result<()> {
        match ids.iter().find(|id| !self.has_track(id)) {
            Some(missing) => Err(TierError::not_found(EntityKind::Track, missing.as_str())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::{PlaylistVariant, Visibility};

    fn sample() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.add_track(Track::new("M1", "Golden Night", "Ed", "Jazz", 130)).unwrap();
        catalog.add_track(Track::new("M2", "Cold Sun", "Ed", "Jazz", 137)).unwrap();
        catalog
    }

    #[test]
    fn test_duplicate_track_rejected() {
        let mut catalog = sample();
        let err = catalog.add_track(Track::new("M1", "Other", "X", "Pop", 10)).unwrap_err();
        assert_eq!(err, TierError::already_exists(EntityKind::Track, "M1"));
    }

    #[test]
    fn test_record_play_increments_once() {
        let mut catalog = sample();
        let after = catalog.record_play("M1").unwrap();
        assert_eq!(after.play_count(), 1);
        assert_eq!(catalog.find_track("M1").unwrap().play_count(), 1);
        assert_eq!(catalog.find_track("M2").unwrap().play_count(), 0);
    }

    #[test]
    fn test_missing_lookups_report_kind() {
        let catalog = sample();
        assert_eq!(
            catalog.find_track("nope").unwrap_err(),
            TierError::not_found(EntityKind::Track, "nope")
        );
        assert!(matches!(
            catalog.find_album("nope"),
            Err(TierError::NotFound { kind: EntityKind::Album, .. })
        ));
        assert!(matches!(
            catalog.find_playlist("nope"),
            Err(TierError::NotFound { kind: EntityKind::Playlist, .. })
        ));
    }

    #[test]
    fn test_album_requires_known_tracks() {
        let mut catalog = sample();
        let err = catalog
            .add_album(Album::new("Broken", vec!["M1".into(), "M404".into()]))
            .unwrap_err();
        assert_eq!(err, TierError::not_found(EntityKind::Track, "M404"));
        assert_eq!(catalog.albums().count(), 0);
    }

    #[test]
    fn test_playlist_name_is_unique() {
        let mut catalog = sample();
        let request = NewPlaylist::random("Mix", vec!["M1".into()]);
        let playlist = catalog.create_playlist(request.clone()).unwrap();
        catalog.add_playlist(playlist).unwrap();

        let again = catalog.create_playlist(request).unwrap();
        let err = catalog.add_playlist(again).unwrap_err();
        assert_eq!(err, TierError::already_exists(EntityKind::Playlist, "Mix"));
        assert_eq!(catalog.playlists().count(), 1);
    }

    #[test]
    fn test_create_playlist_validates_tracks() {
        let catalog = sample();
        let request =
            NewPlaylist::personalized("Mine", vec!["M9".into()], Visibility::Public, "u1");
        assert!(catalog.create_playlist(request).is_err());

        let request =
            NewPlaylist::personalized("Mine", vec!["M2".into()], Visibility::Private, "u1");
        let playlist = catalog.create_playlist(request).unwrap();
        assert_eq!(playlist.variant(), &PlaylistVariant::Personalized);
        assert_eq!(playlist.author(), "u1");
    }

    #[test]
    fn test_from_parts_keeps_references_to_removed_tracks() {
        let mut catalog = sample();
        catalog
            .add_album(Album::new("Pair", vec!["M1".into(), "M2".into()]))
            .unwrap();
        let playlist = catalog
            .create_playlist(NewPlaylist::random("Mix", vec!["M1".into(), "M2".into()]))
            .unwrap();
        catalog.add_playlist(playlist).unwrap();
        catalog.remove_track("M2").unwrap();

        let rebuilt = Catalog::from_parts(
            catalog.tracks().cloned().collect(),
            catalog.albums().cloned().collect(),
            catalog.playlists().cloned().collect(),
        )
        .unwrap();
        assert!(!rebuilt.has_track("M2"));
        assert_eq!(rebuilt.find_album("Pair").unwrap().track_ids().len(), 2);
        assert_eq!(rebuilt.find_playlist("Mix").unwrap().len(), 2);
    }

    #[test]
    fn test_from_parts_rejects_duplicate_keys() {
        let album = Album::new("Pair", vec!["M1".into()]);
        let err = Catalog::from_parts(
            vec![Track::new("M1", "One", "Ed", "Jazz", 10)],
            vec![album.clone(), album],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, TierError::already_exists(EntityKind::Album, "Pair"));
    }

    #[test]
    fn test_track_kind_parsing() {
        assert_eq!("Explicit".parse::<TrackKind>().unwrap(), TrackKind::Explicit);
        assert_eq!("normal".parse::<TrackKind>().unwrap(), TrackKind::Standard);
        assert!("loud".parse::<TrackKind>().is_err());
    }
}
