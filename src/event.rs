use tokio::sync::mpsc;

use crate::playback::PlaybackEvent;
use crate::transport::TransportEvent;

/// Everything the client event loop reacts to.
///
/// Background work (socket tasks, playback threads, timers, stdin) never
/// touches client state directly; it posts one of these instead.
#[derive(Debug)]
pub enum ClientEvent {
    Transport(TransportEvent),
    Playback(PlaybackEvent),
    Command(UserCommand),
    /// The reconnect back-off elapsed
    ReconnectDue,
}

/// Push-to-talk gestures and lifecycle commands from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    BeginRecording,
    EndRecording,
    /// Begin if idle, end if capturing
    ToggleRecording,
    Quit,
}

pub type EventSender = mpsc::UnboundedSender<ClientEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
