//! Per-subscriber library of saved playlists and albums.
//!
//! Entries are catalog references (playlist names, album titles) kept in
//! insertion order. Membership is unique; a second insert of the same
//! reference fails and leaves the library unchanged.

use crate::error::{EntityKind, Result, TierError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    playlists: Vec<String>,
    albums: Vec<String>,
}

impl Library {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_playlist(&mut self, name: &str) -> Result<()> {
        insert_unique(&mut self.playlists, name, EntityKind::Playlist)
    }

    pub fn add_album(&mut self, title: &str) -> Result<()> {
        insert_unique(&mut self.albums, title, EntityKind::Album)
    }

    #[must_use]
    pub fn contains_playlist(&self, name: &str) -> bool {
        self.playlists.iter().any(|p| p == name)
    }

    #[must_use]
    pub fn contains_album(&self, title: &str) -> bool {
        self.albums.iter().any(|a| a == title)
    }

    /// Snapshot of the saved playlist names.
    #[must_use]
    pub fn playlists(&self) -> Vec<String> {
        self.playlists.clone()
    }

    /// Snapshot of the saved album titles.
    #[must_use]
    pub fn albums(&self) -> Vec<String> {
        self.albums.clone()
    }

    #[must_use]
    pub fn playlist_count(&self) -> usize {
        self.playlists.len()
    }

    #[must_use]
    pub fn album_count(&self) -> usize {
        self.albums.len()
    }
}

fn insert_unique(entries: &mut Vec<String>, key: &str, kind: EntityKind) -> Result<()> {
    if entries.iter().any(|e| e == key) {
        return Err(TierError::already_exists(kind, key));
    }
    entries.push(key.to_string());
    Ok(())
}
