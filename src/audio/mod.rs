pub mod backend;
pub mod decode;
pub mod file;
pub mod output;
pub mod render;
pub mod wav;

#[cfg(feature = "device")]
pub mod device;

pub use backend::{AudioFrame, ChunkReceiver, ChunkSender, Microphone, MicrophoneFactory, MicrophoneSource};
pub use decode::{decode_segment, DecodedAudio};
pub use file::{AudioFile, WavFileMicrophone};
pub use output::{AudioOutput, NullOutput, OutputFactory};
pub use render::SegmentRenderer;
pub use wav::encode_wav;
