pub mod model;

pub use model::{
    IceServerConfig, PeerId, Question, QuizAttempt, QuizId, QuizStatus, RoomId, SignalMessage,
    SignalPayload,
};
