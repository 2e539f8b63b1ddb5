pub mod audio;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod input;
pub mod playback;
pub mod recording;
pub mod session;
pub mod transcript;
pub mod transport;

pub use audio::{AudioFile, AudioFrame, AudioOutput, DecodedAudio, Microphone, MicrophoneFactory, MicrophoneSource};
pub use client::VoiceClient;
pub use config::Config;
pub use connection::{CloseOutcome, ConnectionManager, ConnectionState, ReconnectPolicy};
pub use error::ClientError;
pub use event::{ClientEvent, UserCommand};
pub use playback::{AudioPlayer, AudioSegment, DecodingPlayer, PlaybackQueue};
pub use recording::{RecordedAudio, RecordingController, RecordingState};
pub use session::{SessionCoordinator, SessionStats};
pub use transcript::{MemoryTranscript, Role, TranscriptSink};
pub use transport::{ClientMessage, Connector, Link, OutboundFrame, ServerMessage, WebSocketConnector};
