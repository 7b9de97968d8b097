use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Handshake payload carried between two clients. The relay forwards it
/// verbatim and never matches on it; only the two endpoints interpret the
/// variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalPayload {
    Offer {
        sdp: String,
    },
    Answer {
        sdp: String,
    },
    Candidate {
        candidate: String,
        sdp_mid: Option<String>,
        sdp_m_line_index: Option<u16>,
    },
}

/// Every message exchanged over the signaling WebSocket, both directions.
///
/// Client to relay: `join-room`, `sending-signal`, `returning-signal`,
/// `disconnect-from-room`. Relay to client: `your-id`, `all-users`,
/// `user-joined`, `receiving-returned-signal`, `user-disconnected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum SignalMessage {
    JoinRoom {
        room: RoomId,
    },
    SendingSignal {
        user_to_signal: PeerId,
        caller_id: PeerId,
        signal: SignalPayload,
    },
    ReturningSignal {
        signal: SignalPayload,
        caller_id: PeerId,
    },
    DisconnectFromRoom {
        room: RoomId,
    },
    YourId {
        id: PeerId,
    },
    AllUsers {
        users: Vec<PeerId>,
    },
    UserJoined {
        signal: SignalPayload,
        caller_id: PeerId,
    },
    ReceivingReturnedSignal {
        signal: SignalPayload,
        id: PeerId,
    },
    UserDisconnected {
        id: PeerId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tags_are_kebab_case() {
        let msg = SignalMessage::JoinRoom {
            room: RoomId::from("r1"),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""op":"join-room""#), "got: {json}");

        let msg = SignalMessage::ReceivingReturnedSignal {
            signal: SignalPayload::Answer { sdp: "v=0".into() },
            id: PeerId::new(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(
            json.contains(r#""op":"receiving-returned-signal""#),
            "got: {json}"
        );
    }

    #[test]
    fn payload_is_tagged_by_type() {
        let offer = SignalPayload::Offer { sdp: "v=0".into() };
        let json = serde_json::to_string(&offer).unwrap();
        assert!(json.contains(r#""type":"offer""#), "got: {json}");

        let parsed: SignalPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, offer);
    }
}
