use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ANONYMOUS, Entry};
use crate::origin::{CookieSummary, DeviceInfo, OriginMetadata};

// -- Remote rows --

/// A row of the remote entries table.
///
/// `id` is assigned by the backend and omitted on insert; the client-minted
/// entry id travels in `wish_id`. The origin columns are written on insert
/// and never selected back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub wish_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub wisher_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<CookieSummary>,
}

impl From<&Entry> for RemoteRecord {
    fn from(entry: &Entry) -> Self {
        Self {
            id: None,
            wish_id: Some(entry.id.clone()),
            message: entry.message.clone(),
            wisher_name: Some(entry.wisher_name.clone()),
            created_at: entry.created_at,
            room_id: entry.room_id.clone(),
            ip_address: entry.origin.ip_address.clone(),
            device_info: entry.origin.device_info.clone(),
            cookies: entry.origin.cookies,
        }
    }
}

impl From<RemoteRecord> for Entry {
    fn from(record: RemoteRecord) -> Self {
        // Rows written by older clients carry no wish_id; fall back to the
        // server id so they still dedupe against themselves.
        let id = match (record.wish_id, record.id) {
            (Some(wish_id), _) if !wish_id.is_empty() => wish_id,
            (_, Some(server_id)) => format!("remote-{}", server_id),
            _ => String::new(),
        };

        Entry {
            id,
            message: record.message,
            wisher_name: record
                .wisher_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS.to_string()),
            created_at: record.created_at,
            room_id: record.room_id,
            // Other visitors' origin data stays on the server.
            origin: OriginMetadata::default(),
        }
    }
}

/// Columns a room listing asks for.
pub const DISPLAY_COLUMNS: &str = "id,wish_id,message,wisher_name,created_at,room_id";

// -- Errors --

/// Error body returned by a PostgREST-style API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(wish_id: Option<&str>, id: Option<i64>) -> RemoteRecord {
        RemoteRecord {
            id,
            wish_id: wish_id.map(str::to_string),
            message: "hello".into(),
            wisher_name: None,
            created_at: "2026-01-01T10:00:00Z".parse().unwrap(),
            room_id: Some("abc".into()),
            ip_address: None,
            device_info: None,
            cookies: None,
        }
    }

    #[test]
    fn test_insert_body_omits_server_id() {
        let entry: Entry = record(Some("w1"), Some(7)).into();
        let json = serde_json::to_value(RemoteRecord::from(&entry)).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["wish_id"], "w1");
        assert_eq!(json["room_id"], "abc");
    }

    #[test]
    fn test_legacy_rows_use_server_id() {
        let entry: Entry = record(None, Some(42)).into();
        assert_eq!(entry.id, "remote-42");
        assert_eq!(entry.wisher_name, ANONYMOUS);

        let entry: Entry = record(Some(""), Some(43)).into();
        assert_eq!(entry.id, "remote-43");
    }

    #[test]
    fn test_origin_written_but_not_read_back() {
        let mut row = record(Some("w1"), Some(1));
        row.ip_address = Some("203.0.113.7".into());
        row.cookies = Some(CookieSummary { enabled: true, count: 2 });

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["ip_address"], "203.0.113.7");

        let entry: Entry = row.into();
        assert_eq!(entry.origin, OriginMetadata::default());
    }
}
