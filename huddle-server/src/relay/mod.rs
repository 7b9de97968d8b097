mod signal_relay;
mod ws_handler;

pub use signal_relay::{ForwardOutcome, SignalRelay};
pub use ws_handler::ws_handler;
