//! Live room channel over the backend's realtime websocket.
//!
//! One websocket per subscription, joined to the room's table-change topic.
//! A dropped socket is reported and left closed; the page reloads to
//! reconnect.

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use wishwall_types::events::{ChannelFrame, EVENT_CLOSE, EVENT_ERROR};
use wishwall_types::{Entry, RemoteError, RemoteErrorKind};

use crate::{RestConfig, Subscription};

/// The realtime server drops sockets that stay silent for ~60s.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

pub fn websocket_url(config: &RestConfig) -> Result<Url, RemoteError> {
    let mut url = config
        .base_url
        .join("realtime/v1/websocket")
        .map_err(|e| RemoteError::channel(format!("invalid realtime URL: {}", e)))?;

    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|_| RemoteError::channel(format!("cannot use scheme {} for realtime", scheme)))?;

    url.query_pairs_mut()
        .append_pair("apikey", &config.api_key)
        .append_pair("vsn", "1.0.0");
    Ok(url)
}

/// Change-feed topic for inserts into `table` filtered to one room.
pub fn topic(table: &str, room_id: &str) -> String {
    format!("realtime:public:{}:room_id=eq.{}", table, room_id)
}

pub async fn subscribe(config: &RestConfig, room_id: &str) -> Result<Subscription, RemoteError> {
    let url = websocket_url(config)?;
    let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| RemoteError::network(format!("realtime connect failed: {}", e)))?;

    let (mut ws_tx, ws_rx) = ws_stream.split();
    let topic = topic(&config.table, room_id);
    send_frame(&mut ws_tx, &ChannelFrame::join(&topic, 1)).await?;

    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_channel(ws_tx, ws_rx, topic, room_id.to_string(), tx));

    info!("Joined live channel for room {}", room_id);
    Ok(Subscription::new(room_id.to_string(), rx, task))
}

async fn send_frame(sink: &mut WsSink, frame: &ChannelFrame) -> Result<(), RemoteError> {
    let text = serde_json::to_string(frame)
        .map_err(|e| RemoteError::channel(format!("unencodable frame: {}", e)))?;
    sink.send(Message::Text(text))
        .await
        .map_err(|e| RemoteError::channel(format!("send failed: {}", e)))
}

async fn run_channel(
    mut ws_tx: WsSink,
    mut ws_rx: WsSource,
    topic: String,
    room_id: String,
    events: mpsc::UnboundedSender<Entry>,
) {
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;
    let mut next_ref: u64 = 2;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if let Err(e) = send_frame(&mut ws_tx, &ChannelFrame::heartbeat(next_ref)).await {
                    warn!(kind = %e.kind, "Live channel for room {} lost: {}", room_id, e.message);
                    break;
                }
                next_ref += 1;
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match interpret(&text, &topic, &room_id) {
                        FrameAction::Deliver(entry) => {
                            if events.send(entry).is_err() {
                                break;
                            }
                        }
                        FrameAction::Ignore => {}
                        FrameAction::Fail(e) => {
                            warn!(kind = %e.kind, "Live channel for room {} failed: {}", room_id, e.message);
                            break;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        warn!(kind = %RemoteErrorKind::Channel, "Live channel for room {} closed; reload to reconnect", room_id);
                        break;
                    }
                    // Pings are answered by tungstenite itself.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(kind = %RemoteErrorKind::Channel, "Live channel for room {} errored: {}", room_id, e);
                        break;
                    }
                }
            }
        }
    }
}

#[derive(Debug)]
enum FrameAction {
    Deliver(Entry),
    Ignore,
    Fail(RemoteError),
}

fn interpret(text: &str, topic: &str, room_id: &str) -> FrameAction {
    let frame: ChannelFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!("Ignoring undecodable realtime frame: {}", e);
            return FrameAction::Ignore;
        }
    };

    if frame.topic != topic {
        return FrameAction::Ignore;
    }

    if frame.is_rejected_reply() {
        return FrameAction::Fail(RemoteError::channel(format!("join rejected: {}", frame.payload)));
    }

    if frame.event == EVENT_ERROR || frame.event == EVENT_CLOSE {
        return FrameAction::Fail(RemoteError::channel(format!("server sent {}", frame.event)));
    }

    match frame.inserted_record().map(Entry::from) {
        Some(entry) if entry.room_id.as_deref() == Some(room_id) => FrameAction::Deliver(entry),
        Some(entry) => {
            debug!("Dropping push for room {:?} on channel {}", entry.room_id, room_id);
            FrameAction::Ignore
        }
        None => FrameAction::Ignore,
    }
}
