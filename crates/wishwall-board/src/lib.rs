//! Greeting wall core: which room we are in, and the deduplicated,
//! newest-first board built from the local log and/or a shared room.

pub mod actor;
pub mod board;
pub mod error;
pub mod reconciler;
pub mod render;
pub mod room;
pub mod session;

pub use actor::BoardHandle;
pub use board::{Board, BoardSnapshot, BoardStatus};
pub use error::BoardError;
pub use reconciler::{BoardMessage, Reconciler, Submitted};
pub use room::{RoomLink, create_room, resolve};
pub use session::Session;
