mod peer;
mod quiz;
mod room;
mod signaling;

pub use peer::PeerId;
pub use quiz::{Question, QuizAttempt, QuizId, QuizStatus};
pub use room::RoomId;
pub use signaling::{IceServerConfig, SignalMessage, SignalPayload};
