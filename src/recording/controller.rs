use tracing::{info, warn};

use super::session::{RecordedAudio, RecordingSession};
use crate::audio::Microphone;
use crate::config::AudioConfig;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Capturing,
}

/// Push-to-talk capture: `Idle → Capturing → Idle`
pub struct RecordingController {
    /// `None` when the device could not be acquired at startup
    microphone: Option<Box<dyn Microphone>>,
    session: Option<RecordingSession>,
    sample_rate: u32,
    channels: u16,
}

impl RecordingController {
    pub fn new(microphone: Option<Box<dyn Microphone>>, config: &AudioConfig) -> Self {
        match &microphone {
            Some(mic) => info!("Recording enabled with {}", mic.name()),
            None => warn!("No capture device; recording is unavailable"),
        }

        Self {
            microphone,
            session: None,
            sample_rate: config.sample_rate,
            channels: config.channels,
        }
    }

    pub fn state(&self) -> RecordingState {
        if self.session.is_some() {
            RecordingState::Capturing
        } else {
            RecordingState::Idle
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.session.is_some()
    }

    pub fn has_device(&self) -> bool {
        self.microphone.is_some()
    }

    /// Whether a begin gesture would be accepted
    pub fn can_begin(&self) -> bool {
        self.has_device() && !self.is_capturing()
    }

    /// Start a new capture session
    pub fn begin(&mut self) -> ClientResult<()> {
        if self.is_capturing() {
            return Err(ClientError::AlreadyRecording);
        }
        let microphone = self
            .microphone
            .as_mut()
            .ok_or_else(|| ClientError::Device("no capture device".to_string()))?;

        let (session, chunk_tx) = RecordingSession::new();
        microphone
            .start(chunk_tx)
            .map_err(|e| ClientError::Device(format!("{:#}", e)))?;

        self.session = Some(session);
        info!("Recording started");
        Ok(())
    }

    /// Stop capturing and finalize the buffered chunks into one blob.
    ///
    /// Returns `None` when nothing was being captured. The session buffer is
    /// discarded either way.
    pub fn end(&mut self) -> Option<ClientResult<RecordedAudio>> {
        let session = self.session.take()?;
        self.stop_microphone();

        let result = session
            .finish(self.sample_rate, self.channels)
            .map_err(|e| ClientError::Device(format!("failed to encode recording: {:#}", e)));

        if let Ok(recording) = &result {
            info!(
                "Recording stopped: {} samples, {}Hz, held {:.1}s",
                recording.sample_count,
                recording.sample_rate,
                recording.held_for.as_secs_f64()
            );
        }

        Some(result)
    }

    /// Stop capturing and throw the recording away
    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            self.stop_microphone();
            info!("Recording discarded");
        }
    }

    fn stop_microphone(&mut self) {
        if let Some(microphone) = self.microphone.as_mut() {
            if let Err(e) = microphone.stop() {
                warn!("Failed to stop {}: {:#}", microphone.name(), e);
            }
        }
    }
}
