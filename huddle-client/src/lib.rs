pub mod client;
pub mod config;
pub mod error;
pub mod media;
pub mod relay_link;
pub mod session;
pub mod transport;

pub use client::RoomClient;
pub use config::ClientConfig;
pub use error::{ClientError, MediaError, RelayError, TransportError};
