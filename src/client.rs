use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::audio::Microphone;
use crate::config::Config;
use crate::connection::{CloseOutcome, ConnectionManager, ConnectionState, ReconnectPolicy};
use crate::error::ClientError;
use crate::event::{ClientEvent, EventReceiver, EventSender, UserCommand};
use crate::playback::{AudioPlayer, AudioSegment, PlaybackQueue};
use crate::recording::RecordingController;
use crate::session::{SessionCoordinator, SessionStats};
use crate::transcript::{Role, TranscriptSink};
use crate::transport::{
    parse_server_message, Connector, OutboundFrame, ServerMessage, TransportEvent,
    TransportEventKind,
};

/// Shown when a recording is attempted before the connection is ready
pub const CONNECTING_NOTICE: &str = "Connecting to server, please try again shortly";
/// Shown once automatic reconnection gives up
pub const RECONNECT_EXHAUSTED_NOTICE: &str =
    "Unable to reach the server; restart the client to retry";

/// How long to wait for the close handshake on quit
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// The voice chat client
///
/// Owns the connection, the playback queue, the recorder and the interrupt
/// flag, and mutates them only from [`VoiceClient::handle`], one event at a
/// time.
pub struct VoiceClient {
    connection: ConnectionManager,
    playback: PlaybackQueue,
    recorder: RecordingController,
    coordinator: SessionCoordinator,
    transcript: Arc<dyn TranscriptSink>,
    stats: SessionStats,
    shutting_down: bool,
}

impl VoiceClient {
    pub fn new(
        config: &Config,
        connector: Box<dyn Connector>,
        player: Box<dyn AudioPlayer>,
        microphone: Option<Box<dyn Microphone>>,
        transcript: Arc<dyn TranscriptSink>,
        events: EventSender,
    ) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        info!("Creating voice client session: {}", session_id);

        Self {
            connection: ConnectionManager::new(
                config.server.endpoint(),
                connector,
                ReconnectPolicy::from(&config.reconnect),
                events.clone(),
            ),
            playback: PlaybackQueue::new(player, events),
            recorder: RecordingController::new(microphone, &config.audio),
            coordinator: SessionCoordinator::new(),
            transcript,
            stats: SessionStats::new(session_id),
            shutting_down: false,
        }
    }

    /// Open the initial connection
    pub fn start(&mut self) {
        self.connection.connect();
    }

    /// Process events until the user quits and the connection has closed
    pub async fn run(mut self, mut events: EventReceiver) -> SessionStats {
        self.start();

        loop {
            let event = if self.shutting_down {
                match tokio::time::timeout(SHUTDOWN_GRACE, events.recv()).await {
                    Ok(event) => event,
                    Err(_) => {
                        warn!("Connection did not close within {:?}", SHUTDOWN_GRACE);
                        break;
                    }
                }
            } else {
                events.recv().await
            };

            let Some(event) = event else {
                break;
            };
            if !self.handle(event) {
                break;
            }
        }

        self.stats()
    }

    /// Apply one event. Returns `false` once the client has finished.
    pub fn handle(&mut self, event: ClientEvent) -> bool {
        match event {
            ClientEvent::Transport(event) => self.on_transport(event),
            ClientEvent::Playback(event) => {
                self.playback.on_playback_event(event, self.coordinator.flag())
            }
            ClientEvent::Command(command) => self.on_command(command),
            ClientEvent::ReconnectDue => {
                if !self.shutting_down {
                    self.connection.on_reconnect_due();
                }
            }
        }

        !self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.shutting_down && self.connection.state() == ConnectionState::Closed
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn playback(&self) -> &PlaybackQueue {
        &self.playback
    }

    pub fn recorder(&self) -> &RecordingController {
        &self.recorder
    }

    pub fn is_interrupted(&self) -> bool {
        self.coordinator.is_interrupted()
    }

    pub fn stats(&self) -> SessionStats {
        let mut stats = self.stats.clone();
        let counters = self.playback.counters();
        stats.segments_played = counters.played;
        stats.segments_failed = counters.failed;
        stats.segments_dropped += counters.flushed;
        stats.interrupts = self.coordinator.interrupts();
        stats.duration_secs =
            Utc::now().signed_duration_since(stats.started_at).num_milliseconds() as f64 / 1000.0;
        stats
    }

    fn on_transport(&mut self, event: TransportEvent) {
        if !self.connection.is_current(event.generation) {
            debug!(
                "Ignoring event from stale connection {} ({:?})",
                event.generation, event.kind
            );
            return;
        }

        match event.kind {
            TransportEventKind::Opened => self.connection.on_open(),
            TransportEventKind::Binary(bytes) => self.on_audio(bytes),
            TransportEventKind::Text(text) => self.on_text(&text),
            TransportEventKind::Error(e) => self.connection.on_error(&e),
            TransportEventKind::Closed { code, reason } => {
                debug!("Close reason: {:?}", reason);
                match self.connection.on_close(code) {
                    CloseOutcome::Reconnect { .. } => self.stats.reconnect_attempts += 1,
                    CloseOutcome::Exhausted { attempts } => {
                        error!("{}", ClientError::ReconnectExhausted { attempts });
                        self.transcript
                            .add_message(Role::Error, RECONNECT_EXHAUSTED_NOTICE);
                    }
                    CloseOutcome::Normal => {}
                }
            }
        }
    }

    fn on_audio(&mut self, bytes: Vec<u8>) {
        self.stats.segments_received += 1;

        if self.coordinator.is_interrupted() {
            debug!("Audio segment ignored while interrupted");
            self.stats.segments_dropped += 1;
            return;
        }

        self.playback
            .enqueue(AudioSegment::new(bytes), self.coordinator.flag());
    }

    fn on_text(&mut self, text: &str) {
        if self.coordinator.is_interrupted() {
            debug!("Message ignored while interrupted");
            return;
        }

        match parse_server_message(text) {
            Ok(ServerMessage::Transcription { message }) => {
                self.transcript.add_message(Role::User, &message)
            }
            Ok(ServerMessage::Chat { message }) => {
                self.transcript.add_message(Role::Assistant, &message)
            }
            Ok(ServerMessage::Error { message }) => {
                error!("Server error: {}", message);
                self.stats.server_errors += 1;
                self.transcript
                    .add_message(Role::Error, &format!("Error: {}", message));
            }
            Ok(ServerMessage::Unknown) => debug!("Ignoring unrecognized message: {}", text),
            Err(e) => warn!("Error processing message: {}", e),
        }
    }

    fn on_command(&mut self, command: UserCommand) {
        if self.shutting_down {
            return;
        }

        match command {
            UserCommand::BeginRecording => self.begin_recording(),
            UserCommand::EndRecording => self.end_recording(),
            UserCommand::ToggleRecording => {
                if self.recorder.is_capturing() {
                    self.end_recording();
                } else {
                    self.begin_recording();
                }
            }
            UserCommand::Quit => self.shutdown(),
        }
    }

    fn begin_recording(&mut self) {
        if !self.connection.is_open() {
            info!("Connection not open, attempting to reconnect");
            self.transcript.add_message(Role::Error, CONNECTING_NOTICE);
            self.connection.connect();
            return;
        }

        if !self.recorder.can_begin() {
            debug!(
                "Ignoring begin gesture (capturing={}, device={})",
                self.recorder.is_capturing(),
                self.recorder.has_device()
            );
            return;
        }

        if self.playback.is_busy() {
            self.coordinator.interrupt(
                &mut self.playback,
                &self.connection,
                self.transcript.as_ref(),
            );
        }

        self.coordinator.resume();

        if let Err(e) = self.recorder.begin() {
            error!("Failed to start recording: {}", e);
        }
    }

    fn end_recording(&mut self) {
        let Some(result) = self.recorder.end() else {
            return;
        };

        let recording = match result {
            Ok(recording) => recording,
            Err(e) => {
                error!("Recording failed: {}", e);
                self.stats.recordings_dropped += 1;
                return;
            }
        };

        if recording.is_empty() {
            warn!("Recording captured no audio; not sending");
            self.stats.recordings_dropped += 1;
            return;
        }

        let bytes = recording.wav.len();
        match self.connection.send(OutboundFrame::Audio(recording.wav)) {
            Ok(()) => {
                self.stats.recordings_sent += 1;
                info!("Audio data sent ({} bytes)", bytes);
            }
            Err(e) => {
                self.stats.recordings_dropped += 1;
                error!("Dropping recording: {}", e);
            }
        }
    }

    fn shutdown(&mut self) {
        info!("Shutting down");
        self.shutting_down = true;
        self.recorder.cancel();
        self.playback.flush();
        self.connection.close();
    }
}
