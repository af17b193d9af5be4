//! Remote store capability and its backends.
//!
//! The board only ever talks to a [`RemoteStore`]: insert an entry, list a
//! room, subscribe to a room's inserts. Anything that offers those three
//! operations can stand in for the managed backend.

pub mod classify;
pub mod ip;
pub mod memory;
pub mod realtime;
pub mod rest;
mod subscription;

use std::future::Future;

use wishwall_types::{Entry, RemoteError};

pub use memory::MemoryBackend;
pub use rest::{RestBackend, RestConfig};
pub use subscription::Subscription;

pub trait RemoteStore: Send + Sync + 'static {
    /// Persist one entry. Callers fire this off and only log the outcome.
    fn insert(&self, entry: &Entry) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// All entries of a room, newest `created_at` first.
    fn query_by_room(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<Vec<Entry>, RemoteError>> + Send;

    /// Open a live channel delivering entries inserted into `room_id` from now on.
    /// Delivery is not deduplicated.
    fn subscribe(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<Subscription, RemoteError>> + Send;
}
