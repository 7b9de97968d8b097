use crate::relay::SignalRelay;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::{PeerId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(relay): State<SignalRelay>,
) -> impl IntoResponse {
    // The relay assigns the id; it is unique per live connection and never
    // reused.
    let peer_id = PeerId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, peer_id, relay))
}

async fn handle_socket(socket: WebSocket, peer_id: PeerId, relay: SignalRelay) {
    info!("new signaling connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    relay.register(peer_id, tx);
    relay.send_to(peer_id, SignalMessage::YourId { id: peer_id });

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("failed to serialize signal message: {}", e),
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) => match signal {
                            SignalMessage::JoinRoom { room } => {
                                relay.handle_join(&room, peer_id);
                            }
                            SignalMessage::SendingSignal {
                                user_to_signal,
                                caller_id,
                                signal,
                            } => {
                                relay.handle_sending_signal(user_to_signal, caller_id, signal);
                            }
                            SignalMessage::ReturningSignal { signal, caller_id } => {
                                relay.handle_returning_signal(peer_id, caller_id, signal);
                            }
                            SignalMessage::DisconnectFromRoom { room } => {
                                relay.handle_leave(&room, peer_id);
                            }
                            other => {
                                warn!("unexpected message from {}: {:?}", peer_id, other);
                            }
                        },
                        Err(e) => warn!("invalid signal message from {}: {:?}", peer_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    relay.handle_disconnect(peer_id);
    info!("signaling connection closed: {}", peer_id);
}
