use crate::error::RelayError;
use crate::media::MediaTrack;
use crate::relay_link::SignalSink;
use crate::session::peer_session::{PeerSession, Role, SessionState};
use crate::transport::{TransportEvent, TransportFactory};
use huddle_core::{PeerId, RoomId, SignalMessage, SignalPayload};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Per-client coordinator: owns exactly one [`PeerSession`] per known remote
/// member and drives each through its handshake.
///
/// Role assignment falls out of the registry contract. The `all-users`
/// snapshot a joiner receives lists the pre-existing members, and the joiner
/// initiates toward every one of them; a pre-existing member only ever
/// responds to an incoming offer. Exactly one handshake per pair, no
/// double-initiation.
pub struct SessionManager {
    local_id: PeerId,
    sessions: HashMap<PeerId, PeerSession>,
    factory: Arc<dyn TransportFactory>,
    sink: Arc<dyn SignalSink>,
    tracks: Vec<Arc<MediaTrack>>,
    events_tx: mpsc::Sender<TransportEvent>,
}

impl SessionManager {
    pub fn new(
        local_id: PeerId,
        factory: Arc<dyn TransportFactory>,
        sink: Arc<dyn SignalSink>,
        tracks: Vec<Arc<MediaTrack>>,
        events_tx: mpsc::Sender<TransportEvent>,
    ) -> Self {
        Self {
            local_id,
            sessions: HashMap::new(),
            factory,
            sink,
            tracks,
            events_tx,
        }
    }

    pub fn local_id(&self) -> PeerId {
        self.local_id
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn contains(&self, remote: &PeerId) -> bool {
        self.sessions.contains_key(remote)
    }

    pub fn state_of(&self, remote: &PeerId) -> Option<SessionState> {
        self.sessions.get(remote).map(|s| s.state())
    }

    pub fn role_of(&self, remote: &PeerId) -> Option<Role> {
        self.sessions.get(remote).map(|s| s.role())
    }

    pub fn remote_stream_of(&self, remote: &PeerId) -> Option<String> {
        self.sessions
            .get(remote)
            .and_then(|s| s.remote_stream())
            .map(|s| s.stream_id.clone())
    }

    /// `all-users`: initiate toward every pre-existing member. Idempotent per
    /// member; a session that already exists is never recreated.
    pub async fn handle_snapshot(&mut self, users: Vec<PeerId>) -> Result<(), RelayError> {
        for remote in users {
            if self.sessions.contains_key(&remote) {
                debug!("session with {} already exists, skipping", remote);
                continue;
            }
            self.open_initiator(remote).await?;
        }
        Ok(())
    }

    async fn open_initiator(&mut self, remote: PeerId) -> Result<(), RelayError> {
        let transport = match self
            .factory
            .create(remote, &self.tracks, self.events_tx.clone())
            .await
        {
            Ok(t) => t,
            Err(e) => {
                // One failed peer must not block the rest of the snapshot.
                warn!("failed to create transport for {}: {}", remote, e);
                return Ok(());
            }
        };

        let offer = match transport.create_offer().await {
            Ok(o) => o,
            Err(e) => {
                warn!("failed to create offer for {}: {}", remote, e);
                transport.close().await;
                return Ok(());
            }
        };

        let mut session = PeerSession::new(remote, Role::Initiator, transport);
        session.mark_signaling();
        self.sessions.insert(remote, session);
        info!("initiating session with {}", remote);

        self.sink
            .send(SignalMessage::SendingSignal {
                user_to_signal: remote,
                caller_id: self.local_id,
                signal: offer,
            })
            .await
    }

    /// `user-joined`: an offer (or later initiator-side candidate) from
    /// `caller`. The first offer creates the responder session; anything
    /// arriving for an existing session is applied or dropped, never
    /// recreated.
    pub async fn handle_user_joined(
        &mut self,
        caller: PeerId,
        signal: SignalPayload,
    ) -> Result<(), RelayError> {
        if self.sessions.contains_key(&caller) {
            match signal {
                SignalPayload::Candidate { .. } => self.apply_candidate(caller, signal).await,
                _ => debug!("duplicate offer from {} dropped, session exists", caller),
            }
            return Ok(());
        }

        let SignalPayload::Offer { .. } = signal else {
            // Candidate or answer for a session that no longer exists.
            debug!("stale signal from {} dropped", caller);
            return Ok(());
        };

        let transport = match self
            .factory
            .create(caller, &self.tracks, self.events_tx.clone())
            .await
        {
            Ok(t) => t,
            Err(e) => {
                warn!("failed to create transport for {}: {}", caller, e);
                return Ok(());
            }
        };

        let answer = match transport.accept_offer(signal).await {
            Ok(a) => a,
            Err(e) => {
                warn!("failed to answer offer from {}: {}", caller, e);
                transport.close().await;
                return Ok(());
            }
        };

        let mut session = PeerSession::new(caller, Role::Responder, transport);
        session.mark_signaling();
        self.sessions.insert(caller, session);
        info!("responding to session from {}", caller);

        self.sink
            .send(SignalMessage::ReturningSignal {
                signal: answer,
                caller_id: caller,
            })
            .await
    }

    /// `receiving-returned-signal`: the responder's answer or candidate,
    /// addressed to our initiator session. No session means the message is
    /// stale (fast join/leave) and is dropped silently.
    pub async fn handle_returned_signal(&mut self, id: PeerId, signal: SignalPayload) {
        if !self.sessions.contains_key(&id) {
            debug!("stale returned signal from {} dropped", id);
            return;
        }

        match signal {
            SignalPayload::Answer { .. } => {
                let result = match self.sessions.get(&id) {
                    Some(session) => session.transport().apply_answer(signal).await,
                    None => return,
                };
                if let Err(e) = result {
                    warn!("failed to apply answer from {}: {}", id, e);
                    self.close_session(id).await;
                }
            }
            SignalPayload::Candidate { .. } => self.apply_candidate(id, signal).await,
            SignalPayload::Offer { .. } => {
                debug!("unexpected offer in returned signal from {}, dropped", id);
            }
        }
    }

    async fn apply_candidate(&mut self, remote: PeerId, candidate: SignalPayload) {
        let result = {
            let Some(session) = self.sessions.get(&remote) else {
                return;
            };
            session.transport().add_candidate(candidate).await
        };
        if let Err(e) = result {
            // Candidate rejection is not fatal to the handshake.
            debug!("failed to add candidate from {}: {}", remote, e);
        }
    }

    /// `user-disconnected`: close that member's session. Other sessions are
    /// untouched.
    pub async fn handle_user_disconnected(&mut self, id: PeerId) {
        self.close_session(id).await;
    }

    pub async fn handle_transport_event(
        &mut self,
        event: TransportEvent,
    ) -> Result<(), RelayError> {
        match event {
            TransportEvent::Connected(id) => {
                if let Some(session) = self.sessions.get_mut(&id) {
                    session.mark_connected();
                    info!("session with {} connected", id);
                }
            }
            TransportEvent::Disconnected(id) => {
                // Unrecoverable failure of one connection; the rest stay up.
                self.close_session(id).await;
            }
            TransportEvent::RemoteStream(id, stream) => {
                if let Some(session) = self.sessions.get_mut(&id) {
                    session.set_remote_stream(stream);
                }
            }
            TransportEvent::CandidateGenerated(id, signal) => {
                let Some(session) = self.sessions.get(&id) else {
                    debug!("candidate for closed session {} dropped", id);
                    return Ok(());
                };
                // Candidates travel the same directional paths as the
                // offer/answer they belong to.
                let msg = match session.role() {
                    Role::Initiator => SignalMessage::SendingSignal {
                        user_to_signal: id,
                        caller_id: self.local_id,
                        signal,
                    },
                    Role::Responder => SignalMessage::ReturningSignal {
                        signal,
                        caller_id: id,
                    },
                };
                self.sink.send(msg).await?;
            }
        }
        Ok(())
    }

    /// Local departure: close every session, then signal the relay.
    pub async fn leave(&mut self, room: RoomId) -> Result<(), RelayError> {
        let remotes: Vec<PeerId> = self.sessions.keys().copied().collect();
        for remote in remotes {
            self.close_session(remote).await;
        }
        self.sink
            .send(SignalMessage::DisconnectFromRoom { room })
            .await
    }

    async fn close_session(&mut self, remote: PeerId) {
        if let Some(mut session) = self.sessions.remove(&remote) {
            session.close().await;
        } else {
            debug!("close for unknown session {} ignored", remote);
        }
    }
}
