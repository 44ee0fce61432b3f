//! # Snapshots
//!
//! A [`Snapshot`] is the whole state in one value: users, tracks, albums
//! and playlists. It is the unit of persistence.
//!
//! ## Storage
//!
//! The state file is a SQLite database with a single-row table:
//!
//! ```sql
//! CREATE TABLE snapshot (
//!     id         INTEGER PRIMARY KEY CHECK (id = 1),
//!     saved_at   TEXT NOT NULL,
//!     body       TEXT NOT NULL
//! )
//! ```
//!
//! `body` holds the snapshot as JSON. Saving replaces the row inside a
//! transaction, so a reader sees either the old state or the new one.
//!
//! Plain JSON files are supported as well for seeding and inspection.

use crate::catalog::{Album, Track};
use crate::playlist::Playlist;
use crate::user::User;
use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub albums: Vec<Album>,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
}

impl Snapshot {
    /// Collections are sorted by key so equal states serialize identically.
    #[must_use]
    pub fn new(
        mut users: Vec<User>,
        mut tracks: Vec<Track>,
        mut albums: Vec<Album>,
        mut playlists: Vec<Playlist>,
    ) -> Self {
        users.sort_by(|a, b| a.id.cmp(&b.id));
        tracks.sort_by(|a, b| a.id.cmp(&b.id));
        albums.sort_by(|a, b| a.title.cmp(&b.title));
        playlists.sort_by(|a, b| a.name().cmp(b.name()));
        Self {
            users,
            tracks,
            albums,
            playlists,
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open state file {}", path.display()))?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshot (
            id       INTEGER PRIMARY KEY CHECK (id = 1),
            saved_at TEXT NOT NULL,
            body     TEXT NOT NULL
        )",
        (),
    )
    .context("Failed to create snapshot table")?;
    Ok(conn)
}

/// Write `snapshot` to the state file at `path`, replacing what was there.
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let body = snapshot.to_json().context("Failed to encode snapshot")?;
    let mut conn = open(path)?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT OR REPLACE INTO snapshot (id, saved_at, body) VALUES (1, ?1, ?2)",
        (Local::now().to_rfc3339(), &body),
    )
    .context("Failed to write snapshot row")?;
    tx.commit().context("Failed to commit snapshot")?;

    info!(
        "Saved {} users and {} tracks to {}",
        snapshot.users.len(),
        snapshot.tracks.len(),
        path.display()
    );
    Ok(())
}

/// Read the snapshot stored at `path`. `None` when the file holds no
/// snapshot yet.
pub fn load(path: &Path) -> Result<Option<Snapshot>> {
    let conn = open(path)?;
    let row: Option<(String, String)> = conn
        .query_row("SELECT saved_at, body FROM snapshot WHERE id = 1", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .optional()
        .context("Failed to read snapshot row")?;

    let Some((saved_at, body)) = row else {
        debug!("No snapshot in {} yet", path.display());
        return Ok(None);
    };
    let snapshot = Snapshot::from_json(&body)
        .with_context(|| format!("Corrupt snapshot in {} (saved {saved_at})", path.display()))?;
    debug!("Loaded snapshot saved at {saved_at}");
    Ok(Some(snapshot))
}

pub fn export_json(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let json = snapshot.to_json().context("Failed to encode snapshot")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn import_json(path: &Path) -> Result<Snapshot> {
    let json =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Snapshot::from_json(&json)
        .with_context(|| format!("Invalid snapshot JSON in {}", path.display()))
}
