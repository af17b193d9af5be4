use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use wishwall_gateway::RemoteStore;
use wishwall_types::OriginMetadata;

use crate::board::BoardSnapshot;
use crate::error::BoardError;
use crate::reconciler::{BoardMessage, Reconciler, Submitted};
use crate::room::RoomLink;

/// Cloneable front for a reconciler running on its own task.
///
/// Every call becomes a message in the reconciler's inbox, so submissions,
/// live pushes and remote completions are applied strictly one at a time.
/// The board shuts down when the last clone is dropped.
#[derive(Clone)]
pub struct BoardHandle {
    inbox: mpsc::UnboundedSender<BoardMessage>,
    changes: watch::Receiver<u64>,
    _last_out: Arc<ShutdownOnDrop>,
}

struct ShutdownOnDrop(mpsc::UnboundedSender<BoardMessage>);

impl Drop for ShutdownOnDrop {
    fn drop(&mut self) {
        let _ = self.0.send(BoardMessage::Shutdown);
    }
}

impl BoardHandle {
    pub fn spawn<R: RemoteStore>(reconciler: Reconciler<R>) -> (Self, JoinHandle<()>) {
        let inbox = reconciler.inbox();
        let handle = Self {
            _last_out: Arc::new(ShutdownOnDrop(inbox.clone())),
            inbox,
            changes: reconciler.changes(),
        };
        let task = tokio::spawn(reconciler.run());
        (handle, task)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> BoardMessage,
    ) -> Result<T, BoardError> {
        let (reply, response) = oneshot::channel();
        self.inbox.send(build(reply)).map_err(|_| BoardError::Closed)?;
        response.await.map_err(|_| BoardError::Closed)
    }

    pub async fn submit(
        &self,
        message: &str,
        wisher_name: &str,
        origin: OriginMetadata,
    ) -> Result<Submitted, BoardError> {
        self.request(|reply| BoardMessage::Submit {
            message: message.to_string(),
            wisher_name: wisher_name.to_string(),
            origin,
            reply,
        })
        .await?
    }

    pub async fn snapshot(&self) -> Result<BoardSnapshot, BoardError> {
        self.request(|reply| BoardMessage::Snapshot { reply }).await
    }

    pub async fn navigate(&self, address: &str) -> Result<BoardSnapshot, BoardError> {
        self.request(|reply| BoardMessage::Navigate {
            address: address.to_string(),
            reply,
        })
        .await?
    }

    pub async fn create_room(&self) -> Result<RoomLink, BoardError> {
        self.request(|reply| BoardMessage::CreateRoom { reply }).await?
    }

    /// Revision counter that ticks whenever the board changes.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.changes.clone()
    }

    pub fn shutdown(&self) {
        let _ = self.inbox.send(BoardMessage::Shutdown);
    }
}
