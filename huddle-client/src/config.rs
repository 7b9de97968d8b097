use crate::media::MediaConstraints;
use huddle_core::IceServerConfig;

/// One canonical client, configured instead of forked: the call variants
/// differ only in which capture tracks they carry.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub constraints: MediaConstraints,
    /// Gates display-track acquisition: when false, `start_screen_share`
    /// fails without touching the capture device. Screen share never
    /// renegotiates existing sessions.
    pub enable_screen_share: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec!["stun:stun.l.google.com:19302".to_owned()],
                username: None,
                credential: None,
            }],
            constraints: MediaConstraints {
                audio: true,
                video: true,
            },
            enable_screen_share: false,
        }
    }
}
