use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::config::AudioConfig;

/// Captured audio chunk (16-bit PCM, interleaved)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Where a microphone delivers its chunks
pub type ChunkSender = mpsc::UnboundedSender<AudioFrame>;
pub type ChunkReceiver = mpsc::UnboundedReceiver<AudioFrame>;

/// Audio capture device
///
/// Implementations:
/// - cpal default input device (`device` feature)
/// - WAV file replay (for headless runs and testing)
pub trait Microphone: Send {
    /// Start capturing, delivering chunks in order on `chunks`
    fn start(&mut self, chunks: ChunkSender) -> Result<()>;

    /// Stop capturing. Once this returns no further chunks are sent.
    fn stop(&mut self) -> Result<()>;

    /// Check if the device is currently capturing
    fn is_capturing(&self) -> bool;

    /// Device name for logging
    fn name(&self) -> &str;
}

/// Microphone source type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MicrophoneSource {
    /// Default system input device
    Default,
    /// Replay a WAV file as every recording
    File(PathBuf),
}

impl MicrophoneSource {
    pub fn from_config(config: &AudioConfig) -> Self {
        match &config.input_wav {
            Some(path) => MicrophoneSource::File(PathBuf::from(path)),
            None => MicrophoneSource::Default,
        }
    }
}

/// Microphone factory
pub struct MicrophoneFactory;

impl MicrophoneFactory {
    /// Probe and open the capture device once; failure means recording is
    /// unavailable for this session.
    pub fn create(source: MicrophoneSource, config: &AudioConfig) -> Result<Box<dyn Microphone>> {
        match source {
            MicrophoneSource::Default => {
                #[cfg(feature = "device")]
                {
                    let microphone = super::device::CpalMicrophone::new(config)?;
                    Ok(Box::new(microphone))
                }

                #[cfg(not(feature = "device"))]
                {
                    let _ = config;
                    anyhow::bail!(
                        "Microphone capture needs the `device` feature; use --input-wav instead"
                    )
                }
            }

            MicrophoneSource::File(path) => {
                let microphone = super::file::WavFileMicrophone::open(path)?;
                Ok(Box::new(microphone))
            }
        }
    }
}
