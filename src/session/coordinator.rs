use tracing::{info, warn};

use crate::connection::ConnectionManager;
use crate::playback::PlaybackQueue;
use crate::transcript::{Role, TranscriptSink};
use crate::transport::{ClientMessage, OutboundFrame};

pub const CONVERSATION_STOPPED: &str = "Conversation stopped";

/// Suppresses playback and auto-advance while a barge-in is in progress
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterruptFlag(bool);

impl InterruptFlag {
    pub fn is_set(&self) -> bool {
        self.0
    }

    fn raise(&mut self) {
        self.0 = true;
    }

    fn clear(&mut self) {
        self.0 = false;
    }
}

/// Shared barge-in state across playback, connection and recording
#[derive(Debug, Default)]
pub struct SessionCoordinator {
    flag: InterruptFlag,
    interrupts: u64,
}

impl SessionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&self) -> &InterruptFlag {
        &self.flag
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.is_set()
    }

    pub fn interrupts(&self) -> u64 {
        self.interrupts
    }

    /// Abandon the reply in flight: raise the flag, flush playback, tell the
    /// server to stop generating, and let the user know.
    pub fn interrupt(
        &mut self,
        playback: &mut PlaybackQueue,
        connection: &ConnectionManager,
        transcript: &dyn TranscriptSink,
    ) {
        info!("Stopping current conversation");
        self.flag.raise();
        self.interrupts += 1;

        playback.flush();

        if connection.is_open() {
            if let Err(e) = connection.send(OutboundFrame::Control(ClientMessage::Stop)) {
                warn!("Failed to send stop request: {}", e);
            }
        }

        transcript.add_message(Role::System, CONVERSATION_STOPPED);
    }

    /// A new recording is starting; replies to it play normally
    pub fn resume(&mut self) {
        self.flag.clear();
    }
}
