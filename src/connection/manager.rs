use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::reconnect::{CloseOutcome, ReconnectPolicy};
use super::state::ConnectionState;
use crate::error::ClientError;
use crate::event::{ClientEvent, EventSender};
use crate::transport::{Connector, Link, OutboundFrame};

/// Owns the single duplex connection to the server and its reconnect cycle
pub struct ConnectionManager {
    url: String,
    connector: Box<dyn Connector>,
    policy: ReconnectPolicy,
    events: EventSender,

    state: ConnectionState,
    /// Consecutive automatic attempts since the last successful open
    attempts: u32,
    /// Bumped for every new connection; older transport events are stale
    generation: u64,
    link: Option<Box<dyn Link>>,
    reconnect_timer: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(
        url: impl Into<String>,
        connector: Box<dyn Connector>,
        policy: ReconnectPolicy,
        events: EventSender,
    ) -> Self {
        Self {
            url: url.into(),
            connector,
            policy,
            events,
            state: ConnectionState::Closed,
            attempts: 0,
            generation: 0,
            link: None,
            reconnect_timer: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether an event tagged with `generation` belongs to the live connection
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.link.is_some()
    }

    /// Open a new connection unless one is already open, opening or closing.
    ///
    /// Returns `true` when a new connection attempt was started.
    pub fn connect(&mut self) -> bool {
        if self.state != ConnectionState::Closed {
            debug!("Connection already {:?}, not reconnecting", self.state);
            return false;
        }

        self.generation += 1;
        self.state = ConnectionState::Connecting;
        info!(
            "Initializing connection to {} (generation {})",
            self.url, self.generation
        );
        self.link = Some(
            self.connector
                .open(&self.url, self.generation, self.events.clone()),
        );
        true
    }

    /// Transmit immediately on the open connection
    pub fn send(&self, frame: OutboundFrame) -> Result<(), ClientError> {
        if self.state != ConnectionState::Open {
            return Err(ClientError::NotConnected);
        }
        let link = self.link.as_ref().ok_or(ClientError::NotConnected)?;
        let kind = frame.kind();
        link.send(frame)?;
        debug!("Sent {} frame", kind);
        Ok(())
    }

    pub fn on_open(&mut self) {
        // Close was requested while connecting; the link still closes it
        if self.state == ConnectionState::Closing {
            debug!("Connection opened after close was requested: {}", self.url);
            return;
        }
        info!("Connection established: {}", self.url);
        self.state = ConnectionState::Open;
        self.attempts = 0;
    }

    /// Transport errors are only logged; the close that follows drives recovery
    pub fn on_error(&self, error: &str) {
        warn!("Connection error: {}", error);
    }

    /// Handle the close of the live connection and schedule a reconnect if
    /// the policy allows one.
    pub fn on_close(&mut self, code: u16) -> CloseOutcome {
        let expected = self.state == ConnectionState::Closing;
        self.state = ConnectionState::Closed;
        self.link = None;

        if expected {
            info!("Connection closed (code {})", code);
            return CloseOutcome::Normal;
        }

        let (outcome, attempts) = self.policy.on_close(code, self.attempts);
        self.attempts = attempts;

        match outcome {
            CloseOutcome::Reconnect { attempt, delay } => {
                info!(
                    "Connection closed (code {}), reconnecting ({}/{}) in {:?}",
                    code, attempt, self.policy.max_attempts, delay
                );
                self.schedule_reconnect(delay);
            }
            CloseOutcome::Exhausted { attempts } => {
                warn!("Max reconnection attempts reached ({})", attempts);
            }
            CloseOutcome::Normal => {
                info!("Connection closed normally (code {})", code);
            }
        }

        outcome
    }

    /// Called when the back-off timer fires
    pub fn on_reconnect_due(&mut self) -> bool {
        self.reconnect_timer = None;
        self.connect()
    }

    /// Orderly shutdown; no reconnect follows
    pub fn close(&mut self) {
        self.cancel_reconnect();

        match self.state {
            ConnectionState::Open | ConnectionState::Connecting => {
                info!("Closing connection to {}", self.url);
                self.state = ConnectionState::Closing;
                if let Some(link) = &self.link {
                    link.close();
                }
            }
            ConnectionState::Closing | ConnectionState::Closed => {}
        }
    }

    fn schedule_reconnect(&mut self, delay: std::time::Duration) {
        self.cancel_reconnect();
        let events = self.events.clone();
        self.reconnect_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(ClientEvent::ReconnectDue);
        }));
    }

    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect_timer.take() {
            timer.abort();
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancel_reconnect();
    }
}
