use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use wishwall_types::Entry;

/// A live push channel scoped to one room.
///
/// Owns the task pumping the backend's feed; dropping the subscription
/// aborts that task and releases the channel.
pub struct Subscription {
    room_id: String,
    events: mpsc::UnboundedReceiver<Entry>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn new(room_id: String, events: mpsc::UnboundedReceiver<Entry>, task: JoinHandle<()>) -> Self {
        Self {
            room_id,
            events,
            task,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Next pushed entry, or `None` once the channel has dropped.
    pub async fn recv(&mut self) -> Option<Entry> {
        self.events.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
        debug!("Live channel for room {} released", self.room_id);
    }
}
