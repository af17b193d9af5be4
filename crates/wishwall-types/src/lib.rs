pub mod api;
pub mod error;
pub mod events;
pub mod models;
pub mod origin;

pub use error::{RemoteError, RemoteErrorKind};
pub use models::{ANONYMOUS, Entry, RoomMode, generate_entry_id};
pub use origin::{CookieSummary, DeviceInfo, OriginMetadata};
