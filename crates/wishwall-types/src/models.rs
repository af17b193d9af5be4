use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::origin::OriginMetadata;

/// Display name used when a wisher leaves the name field blank.
pub const ANONYMOUS: &str = "Anonymous";

fn default_wisher_name() -> String {
    ANONYMOUS.to_string()
}

/// Generate a fresh entry id. Ids are minted by the submitting client and
/// never reused.
pub fn generate_entry_id() -> String {
    Uuid::new_v4().to_string()
}

/// A single greeting on the wall.
///
/// Entries are immutable once created. `id` is the deduplication key for the
/// board; an empty id means "not yet assigned" and is filled in by the local
/// store on append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub id: String,
    pub message: String,
    #[serde(default = "default_wisher_name")]
    pub wisher_name: String,
    pub created_at: DateTime<Utc>,
    /// `None` for private entries, otherwise the shared room this entry belongs to.
    #[serde(default)]
    pub room_id: Option<String>,
    /// Write-only analytics payload. Never consulted by the board.
    #[serde(flatten)]
    pub origin: OriginMetadata,
}

impl Entry {
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Where the board reads from and writes to, derived from the page address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomMode {
    Private,
    Shared(String),
}

impl RoomMode {
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Self::Private => None,
            Self::Shared(room_id) => Some(room_id),
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }
}

impl std::fmt::Display for RoomMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Shared(room_id) => write!(f, "room {}", room_id),
        }
    }
}
