use crate::error::RelayError;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use huddle_core::SignalMessage;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::warn;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outbound half of the signaling channel. The session manager only sees
/// this trait, so tests capture outgoing messages instead of opening a
/// socket.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send(&self, msg: SignalMessage) -> Result<(), RelayError>;
}

pub struct RelaySender {
    sink: Mutex<SplitSink<WsStream, Message>>,
}

#[async_trait]
impl SignalSink for RelaySender {
    async fn send(&self, msg: SignalMessage) -> Result<(), RelayError> {
        let json =
            serde_json::to_string(&msg).map_err(|e| RelayError::Unavailable(e.to_string()))?;
        self.sink
            .lock()
            .await
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| RelayError::Unavailable(e.to_string()))
    }
}

/// Inbound half: a stream of relay messages for the client loop.
pub struct RelayLink {
    stream: SplitStream<WsStream>,
}

impl RelayLink {
    /// Opens the signaling WebSocket. Failure to reach the relay is fatal;
    /// the caller surfaces it and the user must rejoin.
    pub async fn connect(url: &str) -> Result<(Self, RelaySender), RelayError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| RelayError::Unavailable(e.to_string()))?;
        let (sink, stream) = ws.split();
        Ok((
            Self { stream },
            RelaySender {
                sink: Mutex::new(sink),
            },
        ))
    }

    /// Next relay message. `RelayError::Closed` once the connection ends.
    pub async fn recv(&mut self) -> Result<SignalMessage, RelayError> {
        while let Some(msg) = self.stream.next().await {
            let msg = msg.map_err(|e| RelayError::Unavailable(e.to_string()))?;
            if let Message::Text(text) = msg {
                match serde_json::from_str::<SignalMessage>(&text) {
                    Ok(signal) => return Ok(signal),
                    Err(e) => warn!("invalid message from relay: {}", e),
                }
            }
        }
        Err(RelayError::Closed)
    }
}
