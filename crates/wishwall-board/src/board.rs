use std::collections::{HashSet, VecDeque};

use wishwall_types::{Entry, RoomMode, generate_entry_id};

pub const LOADING_NOTICE: &str = "Loading wishes...";
pub const EMPTY_NOTICE: &str = "No wishes yet. Be the first to leave a wish!";
pub const LOAD_FAILED_NOTICE: &str = "Error loading wishes. Please refresh the page.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardStatus {
    Loading,
    Ready,
    /// Initial load failed; carries the notice shown in place of the board.
    Failed(String),
}

/// The display-facing sequence: newest first, at most one entry per id.
#[derive(Debug)]
pub struct Board {
    entries: VecDeque<Entry>,
    ids: HashSet<String>,
    status: BoardStatus,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            ids: HashSet::new(),
            status: BoardStatus::Loading,
        }
    }

    /// Put `entry` at the head unless its id is already displayed.
    /// Returns whether the board changed.
    pub fn ingest(&mut self, mut entry: Entry) -> bool {
        if !entry.has_id() {
            entry.id = generate_entry_id();
        }
        if !self.ids.insert(entry.id.clone()) {
            return false;
        }
        self.entries.push_front(entry);
        true
    }

    pub(crate) fn reset(&mut self) {
        self.entries.clear();
        self.ids.clear();
        self.status = BoardStatus::Loading;
    }

    pub(crate) fn set_status(&mut self, status: BoardStatus) {
        self.status = status;
    }

    pub fn status(&self) -> &BoardStatus {
        &self.status
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Text shown instead of (or on top of) the cards, if any.
    pub fn notice(&self) -> Option<&str> {
        match &self.status {
            BoardStatus::Failed(notice) => Some(notice),
            BoardStatus::Loading if self.entries.is_empty() => Some(LOADING_NOTICE),
            BoardStatus::Ready if self.entries.is_empty() => Some(EMPTY_NOTICE),
            _ => None,
        }
    }
}

/// Owned copy of the board handed out to renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub mode: RoomMode,
    pub entries: Vec<Entry>,
    pub notice: Option<String>,
}

impl BoardSnapshot {
    pub fn capture(mode: &RoomMode, board: &Board) -> Self {
        Self {
            mode: mode.clone(),
            entries: board.entries().cloned().collect(),
            notice: board.notice().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(id: &str, message: &str) -> Entry {
        Entry {
            id: id.into(),
            message: message.into(),
            wisher_name: "Tester".into(),
            created_at: Utc::now(),
            room_id: None,
            origin: Default::default(),
        }
    }

    #[test]
    fn test_ingest_is_idempotent_first_text_wins() {
        let mut board = Board::new();
        assert!(board.ingest(entry("a", "first")));
        assert!(!board.ingest(entry("a", "second")));

        let shown: Vec<&str> = board.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(shown, vec!["first"]);
    }

    #[test]
    fn test_ingest_prepends() {
        let mut board = Board::new();
        for id in ["a", "b", "c"] {
            board.ingest(entry(id, "x"));
        }
        let ids: Vec<&str> = board.entries().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_same_text_different_ids_both_shown() {
        let mut board = Board::new();
        board.ingest(entry("a", "Happy new year"));
        board.ingest(entry("b", "Happy new year"));
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_no_duplicate_ids_under_repeated_ingest() {
        let mut board = Board::new();
        let ids = ["a", "b", "a", "c", "b", "b", "d", "a"];
        for id in ids {
            board.ingest(entry(id, id));
        }

        let mut seen = HashSet::new();
        assert!(board.entries().all(|e| seen.insert(e.id.clone())));
        assert_eq!(board.len(), 4);
    }

    #[test]
    fn test_missing_id_is_assigned() {
        let mut board = Board::new();
        assert!(board.ingest(entry("", "x")));
        assert!(board.ingest(entry("", "x")));
        assert!(board.entries().all(|e| e.has_id()));
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_notices() {
        let mut board = Board::new();
        assert_eq!(board.notice(), Some(LOADING_NOTICE));

        board.set_status(BoardStatus::Ready);
        assert_eq!(board.notice(), Some(EMPTY_NOTICE));

        board.ingest(entry("a", "x"));
        assert_eq!(board.notice(), None);

        board.set_status(BoardStatus::Failed(LOAD_FAILED_NOTICE.into()));
        assert_eq!(board.notice(), Some(LOAD_FAILED_NOTICE));

        board.reset();
        assert!(board.is_empty());
        assert!(!board.contains("a"));
        assert_eq!(board.status(), &BoardStatus::Loading);
    }
}
