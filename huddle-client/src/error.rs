use thiserror::Error;

/// Media acquisition failures. Both are fatal preconditions for joining a
/// room: without a local stream there is nothing to attach to a session.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("permission to capture denied")]
    PermissionDenied,
    #[error("screen share is disabled for this client")]
    ScreenShareDisabled,
}

/// Failure of one peer connection. Closes that session only; it never
/// cascades to other sessions.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Rtc(#[from] webrtc::Error),
    #[error("transport failed: {0}")]
    Failed(String),
    #[error("unexpected payload for this handshake step")]
    UnexpectedPayload,
}

/// Signaling channel failures. Fatal: the user must rejoin.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay unavailable: {0}")]
    Unavailable(String),
    #[error("relay connection closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
