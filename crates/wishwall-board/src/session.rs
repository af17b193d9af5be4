use tokio::task::JoinHandle;
use tracing::debug;
use wishwall_types::RoomMode;

use crate::room::{self, RoomLink};

/// Per-page-load context: the address, the room mode derived from it, and
/// the one live channel the page may hold.
pub struct Session {
    address: String,
    mode: RoomMode,
    live: Option<LiveChannel>,
}

/// Forwarding task for a room's live channel. Aborting it drops the
/// underlying subscription.
pub(crate) struct LiveChannel {
    room_id: String,
    forwarder: JoinHandle<()>,
}

impl LiveChannel {
    pub(crate) fn new(room_id: String, forwarder: JoinHandle<()>) -> Self {
        Self { room_id, forwarder }
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

impl Session {
    pub fn from_address(address: &str) -> Self {
        Self {
            address: address.to_string(),
            mode: room::resolve(address),
            live: None,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn mode(&self) -> &RoomMode {
        &self.mode
    }

    /// Room of the currently open live channel, if any.
    pub fn live_room(&self) -> Option<&str> {
        self.live.as_ref().map(|live| live.room_id.as_str())
    }

    /// Point the session at another address. The old live channel is closed.
    pub fn navigate(&mut self, address: &str) -> &RoomMode {
        self.close_live();
        self.address = address.to_string();
        self.mode = room::resolve(address);
        &self.mode
    }

    /// Mint a new room and move the session into it.
    pub fn create_room(&mut self) -> RoomLink {
        let link = room::create_room(&self.address);
        self.close_live();
        self.address = link.address.clone();
        self.mode = RoomMode::Shared(link.room_id.clone());
        link
    }

    /// Install a live channel, tearing down any previous one first.
    pub(crate) fn attach_live(&mut self, live: LiveChannel) {
        self.close_live();
        self.live = Some(live);
    }

    pub fn close_live(&mut self) {
        if let Some(live) = self.live.take() {
            debug!("Closing live channel for room {}", live.room_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_follows_address() {
        let mut session = Session::from_address("https://wishes.example.com/");
        assert_eq!(session.mode(), &RoomMode::Private);

        assert_eq!(session.navigate("https://wishes.example.com/?room=abc"), &RoomMode::Shared("abc".into()));
        assert_eq!(session.address(), "https://wishes.example.com/?room=abc");
    }

    #[test]
    fn test_create_room_switches_mode() {
        let mut session = Session::from_address("https://wishes.example.com/");
        let link = session.create_room();
        assert_eq!(session.mode(), &RoomMode::Shared(link.room_id.clone()));
        assert_eq!(session.address(), link.address);
        assert_eq!(session.live_room(), None);
    }
}
