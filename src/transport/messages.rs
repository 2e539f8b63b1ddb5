use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// JSON frame sent by the chat server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// What the server heard the user say
    Transcription { message: String },
    /// A piece of the assistant's reply
    Chat { message: String },
    /// Server-side failure, shown to the user
    Error { message: String },
    /// Any `type` this client does not know yet
    #[serde(other)]
    Unknown,
}

/// JSON control frame sent to the chat server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Abandon any reply still being generated
    Stop,
}

/// A frame queued for transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// One finished recording (WAV bytes)
    Audio(Vec<u8>),
    Control(ClientMessage),
}

impl OutboundFrame {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundFrame::Audio(_) => "audio",
            OutboundFrame::Control(_) => "control",
        }
    }
}

pub fn parse_server_message(text: &str) -> Result<ServerMessage, ClientError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_client_message(message: &ClientMessage) -> Result<String, ClientError> {
    Ok(serde_json::to_string(message)?)
}
