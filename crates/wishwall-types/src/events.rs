use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::RemoteRecord;

pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const HEARTBEAT_TOPIC: &str = "phoenix";

/// Envelope of every frame on the realtime websocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelFrame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl ChannelFrame {
    /// Join a table-change topic.
    pub fn join(topic: &str, reference: u64) -> Self {
        Self {
            topic: topic.to_string(),
            event: EVENT_JOIN.to_string(),
            payload: serde_json::json!({}),
            reference: Some(reference.to_string()),
        }
    }

    pub fn heartbeat(reference: u64) -> Self {
        Self {
            topic: HEARTBEAT_TOPIC.to_string(),
            event: EVENT_HEARTBEAT.to_string(),
            payload: serde_json::json!({}),
            reference: Some(reference.to_string()),
        }
    }

    /// The inserted row carried by this frame, if it announces an insert.
    ///
    /// Understands both the legacy `INSERT` event and the newer
    /// `postgres_changes` envelope.
    pub fn inserted_record(&self) -> Option<RemoteRecord> {
        let record = match self.event.as_str() {
            "INSERT" => self.payload.get("record")?,
            "postgres_changes" => {
                let data = self.payload.get("data")?;
                if data.get("type")?.as_str()? != "INSERT" {
                    return None;
                }
                data.get("record")?
            }
            _ => return None,
        };
        serde_json::from_value(record.clone()).ok()
    }

    /// True for a `phx_reply` whose status is not "ok".
    pub fn is_rejected_reply(&self) -> bool {
        self.event == EVENT_REPLY
            && self.payload.get("status").and_then(Value::as_str) != Some("ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_insert_frame() {
        let frame: ChannelFrame = serde_json::from_str(
            r#"{"topic":"realtime:public:wishes:room_id=eq.abc","event":"INSERT","ref":null,
                "payload":{"type":"INSERT","record":{"id":3,"wish_id":"w3","message":"yo",
                "wisher_name":"Ana","created_at":"2026-01-01T00:00:00Z","room_id":"abc"}}}"#,
        )
        .unwrap();

        let record = frame.inserted_record().unwrap();
        assert_eq!(record.wish_id.as_deref(), Some("w3"));
        assert_eq!(record.id, Some(3));
    }

    #[test]
    fn test_postgres_changes_frame() {
        let frame: ChannelFrame = serde_json::from_str(
            r#"{"topic":"realtime:room","event":"postgres_changes","ref":null,
                "payload":{"data":{"type":"INSERT","record":{"message":"yo",
                "created_at":"2026-01-01T00:00:00Z","room_id":"abc"}}}}"#,
        )
        .unwrap();
        assert_eq!(frame.inserted_record().unwrap().message, "yo");

        let update: ChannelFrame = serde_json::from_str(
            r#"{"topic":"t","event":"postgres_changes","payload":{"data":{"type":"UPDATE","record":{}}}}"#,
        )
        .unwrap();
        assert!(update.inserted_record().is_none());
    }

    #[test]
    fn test_join_frame_wire_shape() {
        let json = serde_json::to_value(ChannelFrame::join("realtime:x", 1)).unwrap();
        assert_eq!(json["event"], "phx_join");
        assert_eq!(json["ref"], "1");
    }

    #[test]
    fn test_reply_status() {
        let ok: ChannelFrame =
            serde_json::from_str(r#"{"topic":"t","event":"phx_reply","payload":{"status":"ok"}}"#).unwrap();
        let err: ChannelFrame =
            serde_json::from_str(r#"{"topic":"t","event":"phx_reply","payload":{"status":"error"}}"#).unwrap();
        assert!(!ok.is_rejected_reply());
        assert!(err.is_rejected_reply());
    }
}
