//! Duplex connection to the chat server
//!
//! A [`Connector`] opens one connection per generation and reports everything
//! that happens on it as [`TransportEvent`]s. The returned [`Link`] is the
//! write half; it never blocks the caller.

pub mod messages;
pub mod websocket;

pub use messages::{
    encode_client_message, parse_server_message, ClientMessage, OutboundFrame, ServerMessage,
};
pub use websocket::WebSocketConnector;

use crate::error::ClientError;
use crate::event::EventSender;

/// Close code for an orderly shutdown
pub const NORMAL_CLOSURE: u16 = 1000;
/// Close frame carried no status code
pub const NO_STATUS_RECEIVED: u16 = 1005;
/// Connection dropped or never established
pub const ABNORMAL_CLOSURE: u16 = 1006;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    /// Which connection this came from
    pub generation: u64,
    pub kind: TransportEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    Opened,
    Binary(Vec<u8>),
    Text(String),
    Error(String),
    Closed { code: u16, reason: String },
}

impl TransportEvent {
    pub fn new(generation: u64, kind: TransportEventKind) -> Self {
        Self { generation, kind }
    }
}

/// Opens connections to the server
pub trait Connector: Send {
    /// Start connecting to `url`.
    ///
    /// Returns immediately; `Opened` (or `Error` + `Closed`) arrives later on
    /// `events`, tagged with `generation`.
    fn open(&self, url: &str, generation: u64, events: EventSender) -> Box<dyn Link>;
}

/// Write half of one connection
pub trait Link: Send {
    fn send(&self, frame: OutboundFrame) -> Result<(), ClientError>;

    /// Request an orderly close (code 1000)
    fn close(&self);
}
