//! Playlist records and their four variants.
//!
//! The variant decides both who may play a playlist (see
//! [`plan::authorize`](crate::plan::authorize)) and how it is traversed
//! (see [`traversal`](crate::traversal)).

use crate::error::{Result, TierError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Author recorded on playlists generated by the service itself.
pub const SYSTEM_AUTHOR: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    #[must_use]
    pub fn is_public(self) -> bool {
        self == Self::Public
    }
}

impl FromStr for Visibility {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" | "yes" => Ok(Self::Public),
            "private" | "no" => Ok(Self::Private),
            other => Err(TierError::InvalidOption(format!("unknown visibility '{other}'"))),
        }
    }
}

/// The closed set of playlist kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaylistVariant {
    /// Shuffled once per playback.
    Random,
    /// Generated for a genre, bounded by a total duration.
    TimeGenre { max_duration_secs: u32, genre: String },
    /// User-authored; interactive or shuffled playback.
    Personalized,
    /// Recommendation output, owned by one user.
    Favorites { owner: String },
}

impl PlaylistVariant {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::TimeGenre { .. } => "time-genre",
            Self::Personalized => "personalized",
            Self::Favorites { .. } => "favorites",
        }
    }
}

impl fmt::Display for PlaylistVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named, ordered list of track ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    name: String,
    track_ids: Vec<String>,
    visibility: Visibility,
    author: String,
    variant: PlaylistVariant,
}

impl Playlist {
    /// Construct a playlist directly, bypassing the creation defaults of
    /// [`NewPlaylist`]. Track ids are not validated here.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        track_ids: Vec<String>,
        visibility: Visibility,
        author: impl Into<String>,
        variant: PlaylistVariant,
    ) -> Self {
        Self {
            name: name.into(),
            track_ids,
            visibility,
            author: author.into(),
            variant,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn track_ids(&self) -> &[String] {
        &self.track_ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.track_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.track_ids.is_empty()
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility.is_public()
    }

    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    #[must_use]
    pub fn variant(&self) -> &PlaylistVariant {
        &self.variant
    }

    /// Owning user of a Favorites playlist, `None` for every other variant.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        match &self.variant {
            PlaylistVariant::Favorites { owner } => Some(owner),
            _ => None,
        }
    }
}

/// A playlist creation request carrying the per-variant defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlaylist {
    pub name: String,
    pub track_ids: Vec<String>,
    pub visibility: Visibility,
    pub author: String,
    pub variant: PlaylistVariant,
}

impl NewPlaylist {
    /// Public, system-authored.
    #[must_use]
    pub fn random(name: impl Into<String>, track_ids: Vec<String>) -> Self {
        Self {
            name: name.into(),
            track_ids,
            visibility: Visibility::Public,
            author: SYSTEM_AUTHOR.to_string(),
            variant: PlaylistVariant::Random,
        }
    }

    /// Public, system-authored.
    #[must_use]
    pub fn time_genre(
        name: impl Into<String>,
        track_ids: Vec<String>,
        max_duration_secs: u32,
        genre: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            track_ids,
            visibility: Visibility::Public,
            author: SYSTEM_AUTHOR.to_string(),
            variant: PlaylistVariant::TimeGenre {
                max_duration_secs,
                genre: genre.into(),
            },
        }
    }

    #[must_use]
    pub fn personalized(
        name: impl Into<String>,
        track_ids: Vec<String>,
        visibility: Visibility,
        author: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            track_ids,
            visibility,
            author: author.into(),
            variant: PlaylistVariant::Personalized,
        }
    }

    /// Private, system-authored, owned by `owner`.
    #[must_use]
    pub fn favorites(
        name: impl Into<String>,
        track_ids: Vec<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            track_ids,
            visibility: Visibility::Private,
            author: SYSTEM_AUTHOR.to_string(),
            variant: PlaylistVariant::Favorites { owner: owner.into() },
        }
    }

    pub(crate) fn build(self) -> Playlist {
        Playlist::new(self.name, self.track_ids, self.visibility, self.author, self.variant)
    }
}
