use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use wishwall_db::LocalStore;
use wishwall_gateway::{RemoteStore, Subscription};
use wishwall_types::{
    ANONYMOUS, Entry, OriginMetadata, RemoteError, RemoteErrorKind, RoomMode, generate_entry_id,
};

use crate::board::{Board, BoardSnapshot, BoardStatus, LOAD_FAILED_NOTICE};
use crate::error::BoardError;
use crate::room::RoomLink;
use crate::session::{LiveChannel, Session};

/// Everything the reconciler reacts to arrives through one inbox and is
/// applied one message at a time.
pub enum BoardMessage {
    /// An entry pushed by the live channel of `room_id`.
    Pushed { room_id: String, entry: Entry },

    /// Outcome of a background write to the shared room.
    RemoteWriteDone {
        entry_id: String,
        result: Result<(), RemoteError>,
    },

    Submit {
        message: String,
        wisher_name: String,
        origin: OriginMetadata,
        reply: oneshot::Sender<Result<Submitted, BoardError>>,
    },

    /// Move to another page address and reload the board.
    Navigate {
        address: String,
        reply: oneshot::Sender<Result<BoardSnapshot, BoardError>>,
    },

    /// Mint a shared room, move into it and reload the board.
    CreateRoom {
        reply: oneshot::Sender<Result<RoomLink, BoardError>>,
    },

    Snapshot {
        reply: oneshot::Sender<BoardSnapshot>,
    },

    Shutdown,
}

/// An accepted submission. The entry is on the board either way;
/// `local_failure` is set when the local log could not record it.
#[derive(Debug)]
pub struct Submitted {
    pub entry: Entry,
    pub local_failure: Option<BoardError>,
}

impl Submitted {
    pub fn saved_locally(&self) -> bool {
        self.local_failure.is_none()
    }
}

/// Merges the local log and/or a shared room into one deduplicated,
/// newest-first board.
pub struct Reconciler<R: RemoteStore> {
    session: Session,
    local: LocalStore,
    remote: Option<Arc<R>>,
    board: Board,
    inbox_tx: mpsc::UnboundedSender<BoardMessage>,
    inbox_rx: mpsc::UnboundedReceiver<BoardMessage>,
    /// Bumped whenever the visible board changes.
    revision: watch::Sender<u64>,
}

impl<R: RemoteStore> Reconciler<R> {
    pub fn new(session: Session, local: LocalStore, remote: Option<Arc<R>>) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (revision, _) = watch::channel(0);
        Self {
            session,
            local,
            remote,
            board: Board::new(),
            inbox_tx,
            inbox_rx,
            revision,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mode(&self) -> &RoomMode {
        self.session.mode()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::capture(self.session.mode(), &self.board)
    }

    /// Sender side of the inbox, for anything that wants to feed the board.
    pub fn inbox(&self) -> mpsc::UnboundedSender<BoardMessage> {
        self.inbox_tx.clone()
    }

    pub fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// (Re)build the board for the session's current mode.
    ///
    /// Private mode reads the local log. Shared mode lists the room and then
    /// opens the room's live channel, replacing any previous one.
    pub async fn initialize(&mut self) -> Result<(), BoardError> {
        self.session.close_live();
        self.board.reset();

        let result = match self.session.mode().clone() {
            RoomMode::Private => {
                self.load_private();
                Ok(())
            }
            RoomMode::Shared(room_id) => self.load_room(&room_id).await,
        };

        self.bump();
        result
    }

    fn load_private(&mut self) {
        let mut entries = self.local.list_all();
        // Stable: on equal timestamps the later insertion stays in front.
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.populate(entries);
        info!("Loaded {} wishes from local storage", self.board.len());
    }

    async fn load_room(&mut self, room_id: &str) -> Result<(), BoardError> {
        let Some(remote) = self.remote.clone() else {
            error!("Room {} requested but no remote backend is configured", room_id);
            self.board
                .set_status(BoardStatus::Failed(LOAD_FAILED_NOTICE.to_string()));
            return Err(BoardError::RemoteUnavailable);
        };

        let entries = match remote.query_by_room(room_id).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(kind = %e.kind, "Error loading wishes for room {}: {}", room_id, e.message);
                self.board
                    .set_status(BoardStatus::Failed(LOAD_FAILED_NOTICE.to_string()));
                return Err(BoardError::RemoteQuery {
                    room_id: room_id.to_string(),
                    source: e,
                });
            }
        };

        self.populate(entries);
        info!("Loaded {} wishes for room {}", self.board.len(), room_id);

        match remote.subscribe(room_id).await {
            Ok(subscription) => self.attach(subscription),
            Err(e) => {
                warn!(kind = %e.kind, "Live updates unavailable for room {}: {}", room_id, e.message);
            }
        }
        Ok(())
    }

    /// `entries` is newest first; ingest prepends, so feed it oldest first.
    fn populate(&mut self, entries: Vec<Entry>) {
        for entry in entries.into_iter().rev() {
            self.board.ingest(entry);
        }
        self.board.set_status(BoardStatus::Ready);
    }

    fn attach(&mut self, mut subscription: Subscription) {
        let room_id = subscription.room_id().to_string();
        let inbox = self.inbox_tx.clone();
        let room = room_id.clone();

        let forwarder = tokio::spawn(async move {
            while let Some(entry) = subscription.recv().await {
                let pushed = BoardMessage::Pushed {
                    room_id: room.clone(),
                    entry,
                };
                if inbox.send(pushed).is_err() {
                    break;
                }
            }
            debug!("Live channel for room {} ended", room);
        });

        self.session.attach_live(LiveChannel::new(room_id, forwarder));
    }

    /// The single gate onto the board. Returns whether the entry was new.
    pub fn ingest(&mut self, entry: Entry) -> bool {
        let changed = self.board.ingest(entry);
        if changed {
            self.bump();
        }
        changed
    }

    /// Record a new wish: local log always, shared room when in one, and the
    /// board right away without waiting on the remote write.
    pub fn submit(
        &mut self,
        message: &str,
        wisher_name: &str,
        origin: OriginMetadata,
    ) -> Result<Submitted, BoardError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(BoardError::Validation);
        }

        let wisher_name = match wisher_name.trim() {
            "" => ANONYMOUS,
            name => name,
        };

        let entry = Entry {
            id: generate_entry_id(),
            message: message.to_string(),
            wisher_name: wisher_name.to_string(),
            created_at: Utc::now(),
            room_id: self.session.mode().room_id().map(str::to_string),
            origin,
        };

        let (entry, local_failure) = match self.local.append(entry.clone()) {
            Ok(stored) => (stored, None),
            Err(e) => {
                warn!("Wish {} shown but not saved locally: {}", entry.id, e);
                (entry, Some(BoardError::LocalPersistence(e)))
            }
        };

        if entry.room_id.is_some() {
            self.spawn_remote_write(entry.clone());
        }

        self.ingest(entry.clone());
        Ok(Submitted {
            entry,
            local_failure,
        })
    }

    fn spawn_remote_write(&self, entry: Entry) {
        let Some(remote) = self.remote.clone() else {
            warn!("Remote backend not configured; wish {} saved locally only", entry.id);
            return;
        };
        let inbox = self.inbox_tx.clone();

        tokio::spawn(async move {
            let result = remote.insert(&entry).await;
            let _ = inbox.send(BoardMessage::RemoteWriteDone {
                entry_id: entry.id,
                result,
            });
        });
    }

    /// Apply one inbox message. Returns false once the board should stop.
    pub async fn handle(&mut self, message: BoardMessage) -> bool {
        match message {
            BoardMessage::Pushed { room_id, entry } => {
                if self.session.live_room() != Some(room_id.as_str()) {
                    debug!("Dropping push {} from closed channel of room {}", entry.id, room_id);
                } else if self.ingest(entry) {
                    debug!("Live wish added to room {}", room_id);
                }
            }
            BoardMessage::RemoteWriteDone { entry_id, result } => {
                log_remote_write(&entry_id, result);
            }
            BoardMessage::Submit {
                message,
                wisher_name,
                origin,
                reply,
            } => {
                let _ = reply.send(self.submit(&message, &wisher_name, origin));
            }
            BoardMessage::Navigate { address, reply } => {
                self.session.navigate(&address);
                let result = self.initialize().await.map(|()| self.snapshot());
                let _ = reply.send(result);
            }
            BoardMessage::CreateRoom { reply } => {
                let link = self.session.create_room();
                info!("Created room {}", link.room_id);
                let result = self.initialize().await.map(|()| link);
                let _ = reply.send(result);
            }
            BoardMessage::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            BoardMessage::Shutdown => {
                self.session.close_live();
                return false;
            }
        }
        true
    }

    /// Wait for the next inbox message and apply it.
    pub async fn process_next(&mut self) -> bool {
        match self.inbox_rx.recv().await {
            Some(message) => self.handle(message).await,
            None => false,
        }
    }

    /// Apply every message already queued, without waiting for more.
    pub async fn process_pending(&mut self) -> bool {
        while let Ok(message) = self.inbox_rx.try_recv() {
            if !self.handle(message).await {
                return false;
            }
        }
        true
    }

    pub async fn run(mut self) {
        while self.process_next().await {}
        info!("Board for {} stopped", self.session.mode());
    }
}

fn log_remote_write(entry_id: &str, result: Result<(), RemoteError>) {
    match result {
        Ok(()) => info!("Wish {} saved to shared room", entry_id),
        Err(e) => {
            error!(kind = %e.kind, "Error saving wish {} to shared room: {}", entry_id, e.message);
            if e.kind == RemoteErrorKind::SchemaMissing {
                warn!("Entries table does not exist. Create it in the backend.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wishwall_db::{Database, StoreError};
    use wishwall_gateway::MemoryBackend;

    fn local() -> (Arc<Database>, LocalStore) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let store = LocalStore::new(db.clone());
        (db, store)
    }

    fn private(local: LocalStore) -> Reconciler<MemoryBackend> {
        Reconciler::new(Session::from_address("https://wishes.example.com/"), local, None)
    }

    fn entry(id: &str, second: u32) -> Entry {
        Entry {
            id: id.into(),
            message: format!("wish {}", id),
            wisher_name: "Tester".into(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, second).unwrap(),
            room_id: None,
            origin: Default::default(),
        }
    }

    fn ids(reconciler: &Reconciler<MemoryBackend>) -> Vec<String> {
        reconciler.board().entries().map(|e| e.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_private_initialize_orders_by_created_at() {
        let (_db, store) = local();
        store.append(entry("late", 30)).unwrap();
        store.append(entry("early", 10)).unwrap();
        store.append(entry("tie-first", 20)).unwrap();
        store.append(entry("tie-second", 20)).unwrap();

        let mut reconciler = private(store);
        reconciler.initialize().await.unwrap();

        assert_eq!(ids(&reconciler), vec!["late", "tie-second", "tie-first", "early"]);
        assert_eq!(reconciler.board().notice(), None);
    }

    #[tokio::test]
    async fn test_private_empty_board_shows_placeholder() {
        let (_db, store) = local();
        let mut reconciler = private(store);
        reconciler.initialize().await.unwrap();
        assert_eq!(reconciler.board().notice(), Some(crate::board::EMPTY_NOTICE));
    }

    #[test]
    fn test_private_submit() {
        let (_db, store) = local();
        let mut reconciler = private(store.clone());

        let submitted = reconciler
            .submit("  Happy new year!  ", "   ", OriginMetadata::default())
            .unwrap();
        assert!(submitted.saved_locally());
        let submitted = submitted.entry;
        assert_eq!(submitted.message, "Happy new year!");
        assert_eq!(submitted.wisher_name, ANONYMOUS);
        assert_eq!(submitted.room_id, None);

        assert_eq!(store.list_all()[0].id, submitted.id);
        assert_eq!(ids(&reconciler), vec![submitted.id]);
    }

    #[test]
    fn test_whitespace_submit_rejected_without_side_effects() {
        let (_db, store) = local();
        let mut reconciler = private(store.clone());
        let changes = reconciler.changes();

        let err = reconciler.submit(" \n\t ", "Ana", OriginMetadata::default()).unwrap_err();
        assert!(matches!(err, BoardError::Validation));
        assert!(store.list_all().is_empty());
        assert!(reconciler.board().is_empty());
        assert!(!changes.has_changed().unwrap());
    }

    #[test]
    fn test_submit_survives_local_storage_failure() {
        let (db, store) = local();
        db.with_conn(|conn| {
            conn.execute_batch("DROP TABLE local_storage")?;
            Ok(())
        })
        .unwrap();

        let mut reconciler = private(store);
        let submitted = reconciler.submit("still shown", "Ana", OriginMetadata::default()).unwrap();
        assert!(reconciler.board().contains(&submitted.entry.id));
        assert!(!submitted.saved_locally());
        assert!(matches!(
            submitted.local_failure,
            Some(BoardError::LocalPersistence(StoreError::Sqlite(_)))
        ));
    }

    #[tokio::test]
    async fn test_shared_room_without_backend() {
        let (_db, store) = local();
        let mut reconciler: Reconciler<MemoryBackend> =
            Reconciler::new(Session::from_address("?room=abc"), store, None);

        let err = reconciler.initialize().await.unwrap_err();
        assert!(matches!(err, BoardError::RemoteUnavailable));
        assert_eq!(reconciler.board().notice(), Some(LOAD_FAILED_NOTICE));
    }

    #[tokio::test]
    async fn test_stale_push_dropped() {
        let (_db, store) = local();
        let mut reconciler = private(store);
        reconciler.initialize().await.unwrap();

        let mut pushed = entry("p", 1);
        pushed.room_id = Some("abc".into());
        reconciler
            .handle(BoardMessage::Pushed {
                room_id: "abc".into(),
                entry: pushed,
            })
            .await;
        assert!(reconciler.board().is_empty());
    }
}
