use crate::registry::{RegistryError, SessionRegistry};
use dashmap::DashMap;
use huddle_core::{PeerId, RoomId, SignalMessage, SignalPayload};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Whether a point-to-point forward reached a live connection. Dropping is
/// the expected outcome when the target disconnected between send and
/// delivery; the sender learns of it through `user-disconnected` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    Delivered,
    Dropped,
}

struct RelayInner {
    peers: DashMap<PeerId, mpsc::UnboundedSender<SignalMessage>>,
    registry: SessionRegistry,
}

/// Message-passing hub between clients. Holds the live connection table and
/// forwards handshake payloads without inspecting them; all room membership
/// state lives in the [`SessionRegistry`].
#[derive(Clone)]
pub struct SignalRelay {
    inner: Arc<RelayInner>,
}

impl SignalRelay {
    pub fn new(registry: SessionRegistry) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                peers: DashMap::new(),
                registry,
            }),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    pub fn register(&self, peer: PeerId, tx: mpsc::UnboundedSender<SignalMessage>) {
        self.inner.peers.insert(peer, tx);
    }

    pub fn unregister(&self, peer: &PeerId) {
        self.inner.peers.remove(peer);
    }

    /// Best-effort 1:1 delivery. A missing target is a drop, not an error.
    pub fn send_to(&self, target: PeerId, msg: SignalMessage) -> ForwardOutcome {
        let Some(peer) = self.inner.peers.get(&target) else {
            debug!("dropping signal for disconnected target {}", target);
            return ForwardOutcome::Dropped;
        };
        if peer.send(msg).is_err() {
            debug!("dropping signal: connection task for {} is gone", target);
            return ForwardOutcome::Dropped;
        }
        ForwardOutcome::Delivered
    }

    /// Sends `msg` to every current member of `room` except `exclude`.
    pub fn broadcast(&self, room: &RoomId, msg: &SignalMessage, exclude: &PeerId) {
        for member in self.inner.registry.members(room) {
            if member != *exclude {
                self.send_to(member, msg.clone());
            }
        }
    }

    /// `join-room`: records the member and answers with the `all-users`
    /// snapshot. Pre-existing members are not notified here; they learn of
    /// the newcomer when its offer reaches them as `user-joined`.
    pub fn handle_join(&self, room: &RoomId, sender: PeerId) {
        match self.inner.registry.join(room, sender) {
            Ok(users) => {
                self.send_to(sender, SignalMessage::AllUsers { users });
            }
            Err(RegistryError::DuplicateMember { member, room }) => {
                // Double join is idempotent: keep the existing membership.
                warn!("ignoring duplicate join of {} (already in {})", member, room);
            }
        }
    }

    /// `sending-signal`: the newcomer's offer (or a later candidate from the
    /// initiator side), relayed 1:1 as `user-joined`.
    pub fn handle_sending_signal(
        &self,
        user_to_signal: PeerId,
        caller_id: PeerId,
        signal: SignalPayload,
    ) -> ForwardOutcome {
        self.send_to(user_to_signal, SignalMessage::UserJoined { signal, caller_id })
    }

    /// `returning-signal`: the responder's answer (or candidate), relayed 1:1
    /// back to the initiator as `receiving-returned-signal`.
    pub fn handle_returning_signal(
        &self,
        sender: PeerId,
        caller_id: PeerId,
        signal: SignalPayload,
    ) -> ForwardOutcome {
        self.send_to(
            caller_id,
            SignalMessage::ReceivingReturnedSignal { signal, id: sender },
        )
    }

    /// `disconnect-from-room` / socket close: notify the remaining members,
    /// then drop the registry entry. A leave for a room the member is not in
    /// is ignored, so no one outside its room ever sees its departure.
    pub fn handle_leave(&self, room: &RoomId, member: PeerId) {
        if self.inner.registry.room_of(&member).as_ref() != Some(room) {
            debug!("ignoring leave of {} for room {} it is not in", member, room);
            return;
        }
        self.broadcast(room, &SignalMessage::UserDisconnected { id: member }, &member);
        self.inner.registry.leave(room, &member);
    }

    /// Socket-level disconnect: leave whatever room the member was in and
    /// forget its connection.
    pub fn handle_disconnect(&self, member: PeerId) {
        if let Some(room) = self.inner.registry.room_of(&member) {
            self.handle_leave(&room, member);
        }
        self.unregister(&member);
    }
}
