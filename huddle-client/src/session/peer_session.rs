use crate::transport::{PeerTransport, RemoteStream};
use huddle_core::PeerId;
use tracing::debug;

/// Which side of the handshake this client plays for one remote member.
/// Derived from join order: the pre-existing member is the initiator's
/// target, the newcomer initiates. Deterministic on both sides, so exactly
/// one handshake is started per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Signaling,
    Connected,
    Closed,
}

/// One bidirectional media link to exactly one remote member. Owned by the
/// local session manager, never shared across clients.
pub struct PeerSession {
    remote: PeerId,
    role: Role,
    state: SessionState,
    transport: Box<dyn PeerTransport>,
    remote_stream: Option<RemoteStream>,
}

impl PeerSession {
    pub fn new(remote: PeerId, role: Role, transport: Box<dyn PeerTransport>) -> Self {
        Self {
            remote,
            role,
            state: SessionState::Created,
            transport,
            remote_stream: None,
        }
    }

    pub fn remote(&self) -> PeerId {
        self.remote
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transport(&self) -> &dyn PeerTransport {
        self.transport.as_ref()
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote_stream.as_ref()
    }

    pub(crate) fn mark_signaling(&mut self) {
        if self.state == SessionState::Created {
            self.state = SessionState::Signaling;
        }
    }

    pub(crate) fn mark_connected(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Connected;
        }
    }

    pub(crate) fn set_remote_stream(&mut self, stream: RemoteStream) {
        self.remote_stream = Some(stream);
    }

    /// Terminal. Releases the remote stream handle and the transport (which
    /// detaches its callbacks). The owning manager removes the map entry.
    pub(crate) async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        self.remote_stream = None;
        self.transport.close().await;
        debug!("session with {} closed", self.remote);
    }
}
