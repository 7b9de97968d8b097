use async_trait::async_trait;
use huddle_core::{PeerId, RoomId, SignalMessage, SignalPayload};
use huddle_client::error::{RelayError, TransportError};
use huddle_client::media::{MediaConstraints, MediaController, MediaTrack};
use huddle_client::media::{CaptureDevice, TrackKind};
use huddle_client::relay_link::SignalSink;
use huddle_client::session::{Role, SessionManager, SessionState};
use huddle_client::transport::{
    PeerTransport, RemoteStream, TransportEvent, TransportFactory,
};
use huddle_client::MediaError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

fn offer() -> SignalPayload {
    SignalPayload::Offer { sdp: "v=0 offer".into() }
}

fn candidate() -> SignalPayload {
    SignalPayload::Candidate {
        candidate: "candidate:1 1 UDP 1 127.0.0.1 4000 typ host".into(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
    }
}

/// Captures everything the manager sends toward the relay.
#[derive(Default)]
struct CapturedSink {
    sent: Mutex<Vec<SignalMessage>>,
}

impl CapturedSink {
    fn sent(&self) -> Vec<SignalMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignalSink for CapturedSink {
    async fn send(&self, msg: SignalMessage) -> Result<(), RelayError> {
        self.sent.lock().unwrap().push(msg);
        Ok(())
    }
}

/// Per-transport state the tests can inspect after the fact.
#[derive(Default)]
struct TransportProbe {
    closed: AtomicBool,
    answers_applied: AtomicUsize,
    candidates_added: AtomicUsize,
}

struct FakeTransport {
    probe: Arc<TransportProbe>,
}

#[async_trait]
impl PeerTransport for FakeTransport {
    async fn create_offer(&self) -> Result<SignalPayload, TransportError> {
        Ok(offer())
    }

    async fn accept_offer(&self, offer: SignalPayload) -> Result<SignalPayload, TransportError> {
        match offer {
            SignalPayload::Offer { .. } => Ok(SignalPayload::Answer { sdp: "v=0 answer".into() }),
            _ => Err(TransportError::UnexpectedPayload),
        }
    }

    async fn apply_answer(&self, answer: SignalPayload) -> Result<(), TransportError> {
        match answer {
            SignalPayload::Answer { .. } => {
                self.probe.answers_applied.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            _ => Err(TransportError::UnexpectedPayload),
        }
    }

    async fn add_candidate(&self, _candidate: SignalPayload) -> Result<(), TransportError> {
        self.probe.candidates_added.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) {
        self.probe.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct FakeFactory {
    created: AtomicUsize,
    probes: Mutex<HashMap<PeerId, Arc<TransportProbe>>>,
}

impl FakeFactory {
    fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    fn probe(&self, remote: &PeerId) -> Arc<TransportProbe> {
        self.probes.lock().unwrap().get(remote).unwrap().clone()
    }
}

#[async_trait]
impl TransportFactory for FakeFactory {
    async fn create(
        &self,
        remote: PeerId,
        _tracks: &[Arc<MediaTrack>],
        _events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let probe = Arc::new(TransportProbe::default());
        self.probes.lock().unwrap().insert(remote, probe.clone());
        Ok(Box::new(FakeTransport { probe }))
    }
}

struct Harness {
    manager: SessionManager,
    sink: Arc<CapturedSink>,
    factory: Arc<FakeFactory>,
    _events_rx: mpsc::Receiver<TransportEvent>,
}

fn harness(local: PeerId) -> Harness {
    let sink = Arc::new(CapturedSink::default());
    let factory = Arc::new(FakeFactory::default());
    let (events_tx, events_rx) = mpsc::channel(16);
    let manager = SessionManager::new(local, factory.clone(), sink.clone(), vec![], events_tx);
    Harness {
        manager,
        sink,
        factory,
        _events_rx: events_rx,
    }
}

#[tokio::test]
async fn join_order_determines_roles() {
    // X joined first, Y joins afterward: Y's snapshot lists X, X's snapshot
    // was empty.
    let (x, y) = (PeerId::new(), PeerId::new());
    let mut hx = harness(x);
    let mut hy = harness(y);

    hx.manager.handle_snapshot(vec![]).await.unwrap();
    assert_eq!(hx.manager.session_count(), 0);
    assert!(hx.sink.sent().is_empty());

    hy.manager.handle_snapshot(vec![x]).await.unwrap();
    assert_eq!(hy.manager.role_of(&x), Some(Role::Initiator));
    assert_eq!(hy.manager.state_of(&x), Some(SessionState::Signaling));

    // Y's offer travels to X as user-joined; X responds.
    let sent = hy.sink.sent();
    let [SignalMessage::SendingSignal { user_to_signal, caller_id, signal }] = sent.as_slice()
    else {
        panic!("expected a single sending-signal, got {sent:?}");
    };
    assert_eq!(*user_to_signal, x);
    assert_eq!(*caller_id, y);

    hx.manager
        .handle_user_joined(*caller_id, signal.clone())
        .await
        .unwrap();
    assert_eq!(hx.manager.role_of(&y), Some(Role::Responder));
    assert_eq!(hx.manager.state_of(&y), Some(SessionState::Signaling));

    // Exactly one session per side, and the answer flows back.
    assert_eq!(hx.manager.session_count(), 1);
    assert_eq!(hy.manager.session_count(), 1);
    let sent = hx.sink.sent();
    let [SignalMessage::ReturningSignal { signal: answer, caller_id }] = sent.as_slice() else {
        panic!("expected a single returning-signal, got {sent:?}");
    };
    assert_eq!(*caller_id, y);

    hy.manager.handle_returned_signal(x, answer.clone()).await;
    assert_eq!(hy.factory.probe(&x).answers_applied.load(Ordering::SeqCst), 1);

    // Both transports report connected independently.
    hy.manager
        .handle_transport_event(TransportEvent::Connected(x))
        .await
        .unwrap();
    hx.manager
        .handle_transport_event(TransportEvent::Connected(y))
        .await
        .unwrap();
    assert_eq!(hy.manager.state_of(&x), Some(SessionState::Connected));
    assert_eq!(hx.manager.state_of(&y), Some(SessionState::Connected));
}

#[tokio::test]
async fn snapshot_is_idempotent() {
    let remote = PeerId::new();
    let mut h = harness(PeerId::new());

    h.manager.handle_snapshot(vec![remote]).await.unwrap();
    h.manager.handle_snapshot(vec![remote]).await.unwrap();

    assert_eq!(h.manager.session_count(), 1);
    assert_eq!(h.factory.created(), 1);
    // Only the first pass produced an offer.
    assert_eq!(h.sink.sent().len(), 1);
}

#[tokio::test]
async fn duplicate_offer_does_not_recreate_session() {
    let caller = PeerId::new();
    let mut h = harness(PeerId::new());

    h.manager.handle_user_joined(caller, offer()).await.unwrap();
    h.manager.handle_user_joined(caller, offer()).await.unwrap();

    assert_eq!(h.manager.session_count(), 1);
    assert_eq!(h.factory.created(), 1);
    assert_eq!(h.sink.sent().len(), 1, "only one answer expected");
}

#[tokio::test]
async fn late_initiator_candidate_is_applied_to_existing_session() {
    let caller = PeerId::new();
    let mut h = harness(PeerId::new());

    h.manager.handle_user_joined(caller, offer()).await.unwrap();
    h.manager
        .handle_user_joined(caller, candidate())
        .await
        .unwrap();

    assert_eq!(
        h.factory.probe(&caller).candidates_added.load(Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn signals_without_a_session_are_dropped_silently() {
    let stranger = PeerId::new();
    let mut h = harness(PeerId::new());

    // Candidate before any offer: stale, no session may appear.
    h.manager
        .handle_user_joined(stranger, candidate())
        .await
        .unwrap();
    assert_eq!(h.manager.session_count(), 0);

    // Returned signal for an already-closed session: same.
    h.manager
        .handle_returned_signal(stranger, SignalPayload::Answer { sdp: "v=0".into() })
        .await;
    assert_eq!(h.manager.session_count(), 0);
    assert_eq!(h.factory.created(), 0);
}

#[tokio::test]
async fn disconnect_closes_only_that_session() {
    // X, Y, Z all joined; Y goes away.
    let (y, z) = (PeerId::new(), PeerId::new());
    let mut h = harness(PeerId::new());

    h.manager.handle_snapshot(vec![y, z]).await.unwrap();
    h.manager.handle_user_disconnected(y).await;

    assert!(!h.manager.contains(&y));
    assert!(h.factory.probe(&y).closed.load(Ordering::SeqCst));

    // The Z session is untouched.
    assert_eq!(h.manager.state_of(&z), Some(SessionState::Signaling));
    assert!(!h.factory.probe(&z).closed.load(Ordering::SeqCst));

    // Closing twice (delta-remove raced with transport failure) is harmless.
    h.manager.handle_user_disconnected(y).await;
    assert_eq!(h.manager.session_count(), 1);
}

#[tokio::test]
async fn transport_failure_does_not_cascade() {
    let (a, b) = (PeerId::new(), PeerId::new());
    let mut h = harness(PeerId::new());

    h.manager.handle_snapshot(vec![a, b]).await.unwrap();
    h.manager
        .handle_transport_event(TransportEvent::Disconnected(a))
        .await
        .unwrap();

    assert!(!h.manager.contains(&a));
    assert_eq!(h.manager.state_of(&b), Some(SessionState::Signaling));
}

#[tokio::test]
async fn generated_candidates_follow_the_session_role() {
    let (x, y) = (PeerId::new(), PeerId::new());
    let local = PeerId::new();
    let mut h = harness(local);

    // Initiator toward X, responder toward Y.
    h.manager.handle_snapshot(vec![x]).await.unwrap();
    h.manager.handle_user_joined(y, offer()).await.unwrap();

    h.manager
        .handle_transport_event(TransportEvent::CandidateGenerated(x, candidate()))
        .await
        .unwrap();
    h.manager
        .handle_transport_event(TransportEvent::CandidateGenerated(y, candidate()))
        .await
        .unwrap();

    let sent = h.sink.sent();
    assert!(
        matches!(
            &sent[sent.len() - 2],
            SignalMessage::SendingSignal { user_to_signal, caller_id, signal: SignalPayload::Candidate { .. } }
                if *user_to_signal == x && *caller_id == local
        ),
        "initiator candidate must go out as sending-signal: {sent:?}"
    );
    assert!(
        matches!(
            &sent[sent.len() - 1],
            SignalMessage::ReturningSignal { caller_id, signal: SignalPayload::Candidate { .. } }
                if *caller_id == y
        ),
        "responder candidate must go out as returning-signal: {sent:?}"
    );
}

#[tokio::test]
async fn remote_stream_is_recorded_and_released_on_close() {
    let remote = PeerId::new();
    let mut h = harness(PeerId::new());

    h.manager.handle_snapshot(vec![remote]).await.unwrap();
    h.manager
        .handle_transport_event(TransportEvent::RemoteStream(
            remote,
            RemoteStream { stream_id: "s1".into() },
        ))
        .await
        .unwrap();
    assert_eq!(h.manager.remote_stream_of(&remote), Some("s1".into()));

    h.manager.handle_user_disconnected(remote).await;
    assert_eq!(h.manager.remote_stream_of(&remote), None);
}

#[tokio::test]
async fn leave_closes_everything_then_signals_departure() {
    let (a, b) = (PeerId::new(), PeerId::new());
    let mut h = harness(PeerId::new());

    h.manager.handle_snapshot(vec![a, b]).await.unwrap();
    h.manager.leave(RoomId::from("r1")).await.unwrap();

    assert_eq!(h.manager.session_count(), 0);
    assert!(h.factory.probe(&a).closed.load(Ordering::SeqCst));
    assert!(h.factory.probe(&b).closed.load(Ordering::SeqCst));

    let sent = h.sink.sent();
    assert!(
        matches!(sent.last(), Some(SignalMessage::DisconnectFromRoom { room }) if *room == RoomId::from("r1"))
    );
}

struct FakeDevice;

impl CaptureDevice for FakeDevice {
    fn acquire(&self, constraints: &MediaConstraints) -> Result<Vec<Arc<MediaTrack>>, MediaError> {
        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(Arc::new(MediaTrack::new(TrackKind::Audio, None)));
        }
        if constraints.video {
            tracks.push(Arc::new(MediaTrack::new(TrackKind::Video, None)));
        }
        Ok(tracks)
    }

    fn acquire_display(&self) -> Result<Arc<MediaTrack>, MediaError> {
        Ok(Arc::new(MediaTrack::new(TrackKind::Screen, None)))
    }
}

#[tokio::test]
async fn toggles_never_touch_sessions() {
    let remote = PeerId::new();
    let mut h = harness(PeerId::new());
    let media = MediaController::acquire(
        Arc::new(FakeDevice),
        &MediaConstraints { audio: true, video: true },
        false,
    )
    .unwrap();

    h.manager.handle_snapshot(vec![remote]).await.unwrap();
    h.manager
        .handle_transport_event(TransportEvent::Connected(remote))
        .await
        .unwrap();

    media.toggle_audio();
    media.toggle_video();
    media.toggle_audio();

    // Session state and identity are untouched by local mutes.
    assert_eq!(h.manager.state_of(&remote), Some(SessionState::Connected));
    assert_eq!(h.manager.session_count(), 1);
    assert_eq!(h.factory.created(), 1);
    assert!(!h.factory.probe(&remote).closed.load(Ordering::SeqCst));
}
