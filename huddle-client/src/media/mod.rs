mod controller;

pub use controller::{CaptureDevice, MediaConstraints, MediaController, MediaTrack, TrackKind};
