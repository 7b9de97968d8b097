use crate::error::MediaError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};
use webrtc::track::track_local::TrackLocal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
    Screen,
}

/// One local capture track. Muting flips `enabled` in place; the track (and
/// the session it is attached to) stays alive.
pub struct MediaTrack {
    kind: TrackKind,
    enabled: AtomicBool,
    stopped: AtomicBool,
    rtp: Option<Arc<dyn TrackLocal + Send + Sync>>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, rtp: Option<Arc<dyn TrackLocal + Send + Sync>>) -> Self {
        Self {
            kind,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            rtp,
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Flips the enabled flag and returns the new value. A local mute, not a
    /// renegotiation.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Stops the track. Returns true only on the first call, so the OS
    /// device handle is released exactly once.
    pub fn stop(&self) -> bool {
        !self.stopped.swap(true, Ordering::SeqCst)
    }

    pub fn rtp(&self) -> Option<&Arc<dyn TrackLocal + Send + Sync>> {
        self.rtp.as_ref()
    }
}

/// Device-acquisition boundary. The OS/browser specifics live behind this
/// trait; tests inject a fake.
pub trait CaptureDevice: Send + Sync {
    fn acquire(&self, constraints: &MediaConstraints) -> Result<Vec<Arc<MediaTrack>>, MediaError>;
    fn acquire_display(&self) -> Result<Arc<MediaTrack>, MediaError>;
}

/// Owns the local capture stream for the lifetime of a call.
pub struct MediaController {
    device: Arc<dyn CaptureDevice>,
    tracks: Vec<Arc<MediaTrack>>,
    screen: Option<Arc<MediaTrack>>,
    screen_share_allowed: bool,
}

impl MediaController {
    /// Requests the capture stream. Failure here is fatal to joining.
    pub fn acquire(
        device: Arc<dyn CaptureDevice>,
        constraints: &MediaConstraints,
        screen_share_allowed: bool,
    ) -> Result<Self, MediaError> {
        let tracks = device.acquire(constraints)?;
        info!("acquired {} local capture tracks", tracks.len());
        Ok(Self {
            device,
            tracks,
            screen: None,
            screen_share_allowed,
        })
    }

    /// Camera/mic tracks to attach to peer sessions. The screen track is a
    /// local preview only and is not included.
    pub fn tracks(&self) -> &[Arc<MediaTrack>] {
        &self.tracks
    }

    fn toggle_kind(&self, kind: TrackKind) -> Option<bool> {
        let track = self.tracks.iter().find(|t| t.kind() == kind)?;
        let enabled = track.toggle();
        debug!("{:?} track enabled: {}", kind, enabled);
        Some(enabled)
    }

    /// Local audio mute. Returns the new enabled state, or None if no audio
    /// track was acquired.
    pub fn toggle_audio(&self) -> Option<bool> {
        self.toggle_kind(TrackKind::Audio)
    }

    pub fn toggle_video(&self) -> Option<bool> {
        self.toggle_kind(TrackKind::Video)
    }

    pub fn start_screen_share(&mut self) -> Result<Arc<MediaTrack>, MediaError> {
        if !self.screen_share_allowed {
            return Err(MediaError::ScreenShareDisabled);
        }
        if let Some(existing) = &self.screen {
            return Ok(existing.clone());
        }
        let track = self.device.acquire_display()?;
        self.screen = Some(track.clone());
        Ok(track)
    }

    pub fn stop_screen_share(&mut self) {
        if let Some(track) = self.screen.take() {
            track.stop();
        }
    }

    pub fn is_sharing_screen(&self) -> bool {
        self.screen.is_some()
    }

    /// Stops every track. Idempotent; each track is stopped at most once.
    pub fn release(&mut self) {
        self.stop_screen_share();
        for track in &self.tracks {
            if track.stop() {
                debug!("stopped {:?} track", track.kind());
            }
        }
    }
}

impl Drop for MediaController {
    fn drop(&mut self) {
        // Covers the non-leave exit paths (errors, task teardown).
        self.release();
    }
}
