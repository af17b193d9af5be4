use std::sync::Arc;

use tracing::{error, warn};
use wishwall_types::{Entry, generate_entry_id};

use crate::{Database, Result};

/// Storage key holding the JSON array of this visitor's wishes.
pub const STORAGE_KEY: &str = "newyear_wishes";

/// Most-recent-first retention cap for the local log.
pub const MAX_ENTRIES: usize = 100;

/// Bounded, newest-first log of the entries this visitor created.
///
/// Only ever fed by local submissions; remote data never lands here.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Database>,
    key: String,
    capacity: usize,
}

impl LocalStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self::with_capacity(db, STORAGE_KEY, MAX_ENTRIES)
    }

    pub fn with_capacity(db: Arc<Database>, key: impl Into<String>, capacity: usize) -> Self {
        Self {
            db,
            key: key.into(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert `entry` at the head of the log, assigning an id if it has none,
    /// and drop whatever falls past the capacity.
    ///
    /// Persistence failures are logged here; callers treat the error as
    /// non-fatal.
    pub fn append(&self, mut entry: Entry) -> Result<Entry> {
        if !entry.has_id() {
            entry.id = generate_entry_id();
        }

        let mut entries = self.list_all();
        entries.insert(0, entry.clone());
        entries.truncate(self.capacity);

        let encoded = serde_json::to_string(&entries).inspect_err(|e| {
            error!("Error encoding local wishes: {}", e);
        })?;
        self.db.set_item(&self.key, &encoded).inspect_err(|e| {
            error!("Error saving to local storage: {}", e);
        })?;

        Ok(entry)
    }

    /// All retained entries, most recent insertion first.
    ///
    /// Unreadable or corrupted state reads as an empty log.
    pub fn list_all(&self) -> Vec<Entry> {
        let raw = match self.db.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("Error reading from local storage: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Discarding corrupted local wishes: {}", e);
                Vec::new()
            }
        }
    }
}
