use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operator-facing classification of a remote backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteErrorKind {
    /// The entries table (or the relation behind it) does not exist.
    SchemaMissing,
    /// Rejected by the backend's access rules or bad credentials.
    PermissionDenied,
    /// The backend could not be reached.
    Network,
    /// The live channel failed or closed.
    Channel,
    Other,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SchemaMissing => "schema_missing",
            Self::PermissionDenied => "permission_denied",
            Self::Network => "network",
            Self::Channel => "channel",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Failure reported by a remote store. Never shown to the visitor as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    pub fn channel(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Channel, message)
    }
}
