mod rtc_connector;
mod transport_event;

pub use rtc_connector::{RtcPeerTransport, RtcTransportFactory};
pub use transport_event::{RemoteStream, TransportEvent};

use crate::error::TransportError;
use crate::media::MediaTrack;
use async_trait::async_trait;
use huddle_core::{PeerId, SignalPayload};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One side of one peer connection. The session manager drives the handshake
/// through this trait; tests swap in a fake so transitions run without a
/// network stack.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Initiator side: produce the local offer.
    async fn create_offer(&self) -> Result<SignalPayload, TransportError>;

    /// Responder side: apply the remote offer and produce the answer.
    async fn accept_offer(&self, offer: SignalPayload) -> Result<SignalPayload, TransportError>;

    /// Initiator side: apply the remote answer.
    async fn apply_answer(&self, answer: SignalPayload) -> Result<(), TransportError>;

    /// Either side: apply a trickled remote candidate.
    async fn add_candidate(&self, candidate: SignalPayload) -> Result<(), TransportError>;

    async fn close(&self);
}

/// Creates peer transports with the local tracks attached and their event
/// callbacks bridged into `events`.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        remote: PeerId,
        tracks: &[Arc<MediaTrack>],
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError>;
}
