use huddle_core::{PeerId, SignalPayload};

/// Handle to a remote party's media stream, held by the session that
/// received it and released when the session closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub stream_id: String,
}

/// Events a peer transport reports back to the session manager.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The underlying connection reached its connected condition.
    Connected(PeerId),
    /// Unrecoverable failure or remote hangup on this one connection.
    Disconnected(PeerId),
    /// First remote media arrived for this session.
    RemoteStream(PeerId, RemoteStream),
    /// Locally gathered trickle candidate to relay to the remote side.
    CandidateGenerated(PeerId, SignalPayload),
}
