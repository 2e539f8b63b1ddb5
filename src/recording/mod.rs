mod controller;
mod session;

pub use controller::{RecordingController, RecordingState};
pub use session::{RecordedAudio, RecordingSession};
