use thiserror::Error;
use wishwall_db::StoreError;
use wishwall_types::RemoteError;

/// Failures the board reports to its caller. Remote write failures are not
/// among them: those are logged and the board carries on.
#[derive(Debug, Error)]
pub enum BoardError {
    /// Submission had nothing but whitespace.
    #[error("Please write a wish!")]
    Validation,

    /// The local log could not be written. Non-fatal: the entry is shown
    /// anyway and comes back inside [`Submitted`](crate::Submitted).
    #[error("Wish could not be saved locally: {0}")]
    LocalPersistence(#[from] StoreError),

    /// Initial room listing failed; the visitor is asked to reload.
    #[error("Could not load room {room_id}: {source}")]
    RemoteQuery {
        room_id: String,
        #[source]
        source: RemoteError,
    },

    #[error("Shared room requested but no remote backend is configured")]
    RemoteUnavailable,

    #[error("Board task has stopped")]
    Closed,
}
