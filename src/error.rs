use thiserror::Error;

/// Failures surfaced by the client components.
///
/// None of these are fatal to a running session: each is contained by the
/// component where it happens and at most reported to the user.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A send was attempted while no connection is open
    #[error("not connected to the server")]
    NotConnected,

    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed JSON or an unexpected frame shape
    #[error("malformed server frame: {0}")]
    Protocol(#[from] serde_json::Error),

    /// A single audio segment could not be decoded or played
    #[error("audio playback failed: {0}")]
    Media(String),

    /// The capture device could not be acquired or started
    #[error("capture device unavailable: {0}")]
    Device(String),

    #[error("gave up reconnecting after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },

    #[error("a recording is already in progress")]
    AlreadyRecording,
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
