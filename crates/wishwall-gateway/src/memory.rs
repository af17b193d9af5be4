use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::{debug, warn};

use wishwall_types::api::RemoteRecord;
use wishwall_types::{Entry, RemoteError, RemoteErrorKind};

use crate::{RemoteStore, Subscription};

/// In-process backend: a shared table plus broadcast fan-out.
///
/// Clones share the same table, so several sessions built on clones of one
/// backend behave like visitors of the same hosted room.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    /// Every insert is fanned out here; subscribers filter by room.
    broadcast_tx: broadcast::Sender<RemoteRecord>,

    rows: RwLock<Vec<RemoteRecord>>,

    next_id: AtomicI64,

    /// Open live channels across all clones.
    active_channels: AtomicUsize,

    insert_failure: Mutex<Option<RemoteErrorKind>>,
    query_failure: Mutex<Option<RemoteErrorKind>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(MemoryInner {
                broadcast_tx,
                rows: RwLock::new(Vec::new()),
                next_id: AtomicI64::new(1),
                active_channels: AtomicUsize::new(0),
                insert_failure: Mutex::new(None),
                query_failure: Mutex::new(None),
            }),
        }
    }

    /// Make subsequent inserts fail with `kind` (or succeed again with `None`).
    pub fn fail_inserts(&self, kind: Option<RemoteErrorKind>) {
        if let Ok(mut slot) = self.inner.insert_failure.lock() {
            *slot = kind;
        }
    }

    /// Make subsequent room queries fail with `kind` (or succeed again with `None`).
    pub fn fail_queries(&self, kind: Option<RemoteErrorKind>) {
        if let Ok(mut slot) = self.inner.query_failure.lock() {
            *slot = kind;
        }
    }

    /// Snapshot of every stored row, in insertion order.
    pub async fn records(&self) -> Vec<RemoteRecord> {
        self.inner.rows.read().await.clone()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner.active_channels.load(Ordering::SeqCst)
    }

    fn injected(slot: &Mutex<Option<RemoteErrorKind>>) -> Option<RemoteErrorKind> {
        slot.lock().ok().and_then(|kind| *kind)
    }
}

impl RemoteStore for MemoryBackend {
    async fn insert(&self, entry: &Entry) -> Result<(), RemoteError> {
        if let Some(kind) = Self::injected(&self.inner.insert_failure) {
            return Err(RemoteError::new(kind, "injected insert failure"));
        }

        let mut record = RemoteRecord::from(entry);
        record.id = Some(self.inner.next_id.fetch_add(1, Ordering::SeqCst));

        self.inner.rows.write().await.push(record.clone());

        // No receivers is fine; nobody is watching any room yet.
        let _ = self.inner.broadcast_tx.send(record);
        Ok(())
    }

    async fn query_by_room(&self, room_id: &str) -> Result<Vec<Entry>, RemoteError> {
        if let Some(kind) = Self::injected(&self.inner.query_failure) {
            return Err(RemoteError::new(kind, "injected query failure"));
        }

        let mut matching: Vec<RemoteRecord> = self
            .inner
            .rows
            .read()
            .await
            .iter()
            .filter(|row| row.room_id.as_deref() == Some(room_id))
            .cloned()
            .collect();

        // Later inserts win exact-timestamp ties, as a descending index scan would.
        matching.reverse();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matching.into_iter().map(Entry::from).collect())
    }

    async fn subscribe(&self, room_id: &str) -> Result<Subscription, RemoteError> {
        let mut broadcast_rx = self.inner.broadcast_tx.subscribe();
        let (tx, rx) = mpsc::unbounded_channel();
        let room = room_id.to_string();
        let guard = ChannelGuard::open(self.inner.clone());

        let task = tokio::spawn(async move {
            let _guard = guard;
            loop {
                match broadcast_rx.recv().await {
                    Ok(record) => {
                        if record.room_id.as_deref() != Some(room.as_str()) {
                            continue;
                        }
                        if tx.send(Entry::from(record)).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Live channel for room {} lagged by {} inserts", room, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Live channel for room {} finished", room);
        });

        Ok(Subscription::new(room_id.to_string(), rx, task))
    }
}

/// Counts a live channel as open for as long as its task holds this.
struct ChannelGuard {
    inner: Arc<MemoryInner>,
}

impl ChannelGuard {
    fn open(inner: Arc<MemoryInner>) -> Self {
        inner.active_channels.fetch_add(1, Ordering::SeqCst);
        Self { inner }
    }
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        self.inner.active_channels.fetch_sub(1, Ordering::SeqCst);
    }
}
