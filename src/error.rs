//! Error taxonomy shared by every core operation.
//!
//! All variants are returned as values from the operation that detects them.
//! A denial or a missing entity aborts only the current request; state that
//! earlier steps already committed (credited points, history entries, play
//! counts) is never rolled back.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, TierError>;

/// Kind of catalog entity named by `NotFound` / `AlreadyExists`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Track,
    Album,
    Playlist,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Track => "track",
            Self::Album => "album",
            Self::Playlist => "playlist",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TierError {
    /// Entity lookup failed
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// Uniqueness violation on insert
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: EntityKind, id: String },

    /// The subscription tier does not allow the request
    #[error("tier forbids: {0}")]
    TierForbidden(String),

    /// The playlist is private and the caller is neither owner nor author
    #[error("not public: {0}")]
    VisibilityDenied(String),

    /// Unrecognized option or malformed input
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Snapshot encoding/decoding failures
    #[error("storage error: {0}")]
    Storage(String),
}

impl TierError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    pub fn already_exists(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::AlreadyExists { kind, id: id.into() }
    }

    /// True for the two authorization denials.
    #[must_use]
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::TierForbidden(_) | Self::VisibilityDenied(_))
    }
}

impl From<serde_json::Error> for TierError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
