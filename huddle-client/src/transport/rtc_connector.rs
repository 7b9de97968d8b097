use crate::error::TransportError;
use crate::media::MediaTrack;
use crate::transport::{PeerTransport, RemoteStream, TransportEvent, TransportFactory};
use async_trait::async_trait;
use huddle_core::{IceServerConfig, PeerId, SignalPayload};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// Builds real peer connections via the `webrtc` stack.
pub struct RtcTransportFactory {
    ice_servers: Vec<IceServerConfig>,
}

impl RtcTransportFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }

    fn rtc_config(&self) -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: self
                .ice_servers
                .iter()
                .map(|s| RTCIceServer {
                    urls: s.urls.clone(),
                    username: s.username.clone().unwrap_or_default(),
                    credential: s.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        remote: PeerId,
        tracks: &[Arc<MediaTrack>],
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let pc = Arc::new(api.new_peer_connection(self.rtc_config()).await?);

        // Connection liveness, reported per session so one failing remote
        // never touches the others.
        let state_tx = events.clone();
        pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            Box::pin(async move {
                info!("peer connection state for {}: {:?}", remote, s);
                match s {
                    RTCPeerConnectionState::Connected => {
                        let _ = tx.send(TransportEvent::Connected(remote)).await;
                    }
                    RTCPeerConnectionState::Failed
                    | RTCPeerConnectionState::Disconnected
                    | RTCPeerConnectionState::Closed => {
                        let _ = tx.send(TransportEvent::Disconnected(remote)).await;
                    }
                    _ => {}
                }
            })
        }));

        // Trickle ICE: hand gathered candidates to the session manager,
        // which routes them through the relay.
        let ice_tx = events.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let payload = SignalPayload::Candidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(remote, payload))
                    .await;
            })
        }));

        // The remote stream is reported once, on its first track.
        let track_tx = events.clone();
        let stream_seen = Arc::new(AtomicBool::new(false));
        pc.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let seen = stream_seen.clone();
            Box::pin(async move {
                if seen.swap(true, Ordering::SeqCst) {
                    return;
                }
                debug!("first remote track from {}: {}", remote, track.id());
                let stream = RemoteStream {
                    stream_id: track.stream_id(),
                };
                let _ = tx.send(TransportEvent::RemoteStream(remote, stream)).await;
            })
        }));

        for track in tracks {
            if let Some(rtp) = track.rtp() {
                pc.add_track(rtp.clone()).await?;
            }
        }

        Ok(Box::new(RtcPeerTransport { pc }))
    }
}

pub struct RtcPeerTransport {
    pc: Arc<RTCPeerConnection>,
}

#[async_trait]
impl PeerTransport for RtcPeerTransport {
    async fn create_offer(&self) -> Result<SignalPayload, TransportError> {
        let offer = self.pc.create_offer(None).await?;
        self.pc.set_local_description(offer.clone()).await?;
        Ok(SignalPayload::Offer { sdp: offer.sdp })
    }

    async fn accept_offer(&self, offer: SignalPayload) -> Result<SignalPayload, TransportError> {
        let SignalPayload::Offer { sdp } = offer else {
            return Err(TransportError::UnexpectedPayload);
        };
        self.pc
            .set_remote_description(RTCSessionDescription::offer(sdp)?)
            .await?;

        let answer = self.pc.create_answer(None).await?;
        self.pc.set_local_description(answer.clone()).await?;
        Ok(SignalPayload::Answer { sdp: answer.sdp })
    }

    async fn apply_answer(&self, answer: SignalPayload) -> Result<(), TransportError> {
        let SignalPayload::Answer { sdp } = answer else {
            return Err(TransportError::UnexpectedPayload);
        };
        self.pc
            .set_remote_description(RTCSessionDescription::answer(sdp)?)
            .await?;
        Ok(())
    }

    async fn add_candidate(&self, candidate: SignalPayload) -> Result<(), TransportError> {
        let SignalPayload::Candidate {
            candidate,
            sdp_mid,
            sdp_m_line_index,
        } = candidate
        else {
            return Err(TransportError::UnexpectedPayload);
        };
        self.pc
            .add_ice_candidate(RTCIceCandidateInit {
                candidate,
                sdp_mid,
                sdp_mline_index: sdp_m_line_index,
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    async fn close(&self) {
        if let Err(e) = self.pc.close().await {
            debug!("error closing peer connection: {}", e);
        }
    }
}
