use crate::config::ClientConfig;
use crate::error::{ClientError, MediaError, RelayError};
use crate::media::{CaptureDevice, MediaController, MediaTrack};
use crate::relay_link::{RelayLink, SignalSink};
use crate::session::SessionManager;
use crate::transport::{RtcTransportFactory, TransportEvent};
use huddle_core::{PeerId, RoomId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One participant in one room: the local media, the relay link, and the
/// per-remote session map, with a single event loop interleaving relay
/// messages and transport events.
pub struct RoomClient {
    room: RoomId,
    link: RelayLink,
    media: MediaController,
    manager: SessionManager,
    events_rx: mpsc::Receiver<TransportEvent>,
}

impl RoomClient {
    /// Acquires local media, connects to the relay, and joins `room`.
    ///
    /// Media acquisition comes first: without a local stream no session
    /// could attach a track, so a device/permission failure aborts the join
    /// before any signaling happens.
    pub async fn join(
        relay_url: &str,
        room: RoomId,
        device: Arc<dyn CaptureDevice>,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let media =
            MediaController::acquire(device, &config.constraints, config.enable_screen_share)?;

        let (mut link, sender) = RelayLink::connect(relay_url).await?;
        let local_id = Self::await_id(&mut link).await?;
        info!("assigned id {} for room {}", local_id, room);

        let (events_tx, events_rx) = mpsc::channel(64);
        let sink: Arc<dyn SignalSink> = Arc::new(sender);
        let factory = Arc::new(RtcTransportFactory::new(config.ice_servers.clone()));
        let manager = SessionManager::new(
            local_id,
            factory,
            sink.clone(),
            media.tracks().to_vec(),
            events_tx,
        );

        sink.send(SignalMessage::JoinRoom { room: room.clone() })
            .await?;

        Ok(Self {
            room,
            link,
            media,
            manager,
            events_rx,
        })
    }

    async fn await_id(link: &mut RelayLink) -> Result<PeerId, RelayError> {
        loop {
            match link.recv().await? {
                SignalMessage::YourId { id } => return Ok(id),
                other => warn!("expected your-id, got {:?}", other),
            }
        }
    }

    pub fn local_id(&self) -> PeerId {
        self.manager.local_id()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.manager
    }

    pub fn media(&self) -> &MediaController {
        &self.media
    }

    /// Local mute controls. These touch only the track-enabled flags; no
    /// session is renegotiated or recreated.
    pub fn toggle_audio(&self) -> Option<bool> {
        self.media.toggle_audio()
    }

    pub fn toggle_video(&self) -> Option<bool> {
        self.media.toggle_video()
    }

    pub fn start_screen_share(&mut self) -> Result<Arc<MediaTrack>, MediaError> {
        self.media.start_screen_share()
    }

    pub fn stop_screen_share(&mut self) {
        self.media.stop_screen_share()
    }

    /// Runs the event loop until the relay connection ends or `leave` is
    /// observed externally. Relay loss is fatal: the user must rejoin.
    pub async fn run(&mut self) -> Result<(), ClientError> {
        loop {
            tokio::select! {
                msg = self.link.recv() => {
                    self.handle_signal(msg?).await?;
                }
                Some(event) = self.events_rx.recv() => {
                    self.manager.handle_transport_event(event).await?;
                }
            }
        }
    }

    pub async fn handle_signal(&mut self, msg: SignalMessage) -> Result<(), RelayError> {
        match msg {
            SignalMessage::AllUsers { users } => self.manager.handle_snapshot(users).await,
            SignalMessage::UserJoined { signal, caller_id } => {
                self.manager.handle_user_joined(caller_id, signal).await
            }
            SignalMessage::ReceivingReturnedSignal { signal, id } => {
                self.manager.handle_returned_signal(id, signal).await;
                Ok(())
            }
            SignalMessage::UserDisconnected { id } => {
                self.manager.handle_user_disconnected(id).await;
                Ok(())
            }
            SignalMessage::YourId { .. } => Ok(()),
            other => {
                warn!("unexpected relay message: {:?}", other);
                Ok(())
            }
        }
    }

    /// Leaves the room. The capture device is released before any further
    /// network I/O, then every session is closed and the relay notified.
    pub async fn leave(&mut self) -> Result<(), RelayError> {
        self.media.release();
        self.manager.leave(self.room.clone()).await
    }
}
