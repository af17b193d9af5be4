//! Map backend failures onto [`RemoteErrorKind`] for operator logs.

use wishwall_types::RemoteErrorKind;
use wishwall_types::api::ApiErrorBody;

/// Postgres / PostgREST codes meaning the entries table is not there.
const SCHEMA_MISSING_CODES: &[&str] = &["42P01", "PGRST205", "PGRST116"];

/// Postgres insufficient_privilege.
const PERMISSION_DENIED_CODE: &str = "42501";

/// Classify an HTTP error response from the REST API.
pub fn classify_response(status: u16, body: &ApiErrorBody) -> RemoteErrorKind {
    let code = body.code.as_deref().unwrap_or_default();
    let message = body.message.as_deref().unwrap_or_default();

    if SCHEMA_MISSING_CODES.contains(&code)
        || (message.contains("relation") && message.contains("does not exist"))
    {
        return RemoteErrorKind::SchemaMissing;
    }

    if code == PERMISSION_DENIED_CODE || status == 401 || status == 403 {
        return RemoteErrorKind::PermissionDenied;
    }

    RemoteErrorKind::Other
}

/// Classify a transport-level failure.
pub fn classify_transport(err: &reqwest::Error) -> RemoteErrorKind {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        RemoteErrorKind::Network
    } else {
        RemoteErrorKind::Other
    }
}

/// Human-readable summary of an error body for logs.
pub fn describe(status: u16, body: &ApiErrorBody) -> String {
    let mut parts = vec![format!("HTTP {}", status)];
    if let Some(code) = &body.code {
        parts.push(format!("code {}", code));
    }
    if let Some(message) = &body.message {
        parts.push(message.clone());
    }
    if let Some(hint) = &body.hint {
        parts.push(format!("hint: {}", hint));
    }
    parts.join(", ")
}
