pub mod config;
pub mod quiz;
pub mod registry;
pub mod relay;

pub use registry::{RegistryError, SessionRegistry};
pub use relay::{ForwardOutcome, SignalRelay, ws_handler};
