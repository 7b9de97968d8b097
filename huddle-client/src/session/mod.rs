mod peer_session;
mod session_manager;

pub use peer_session::{PeerSession, Role, SessionState};
pub use session_manager::SessionManager;
