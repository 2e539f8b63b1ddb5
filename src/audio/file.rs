use anyhow::{bail, Context, Result};
use hound::WavReader;
use std::path::Path;
use tracing::info;

use super::backend::{AudioFrame, ChunkSender, Microphone};

/// Chunk length used when replaying a file as capture
const REPLAY_CHUNK_MS: u64 = 100;

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .context("Failed to open WAV file")?;

        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            bail!(
                "Expected 16-bit PCM WAV, got {} bits {:?}",
                spec.bits_per_sample,
                spec.sample_format
            );
        }

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds = samples.len() as f64 /
            (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Split the file into capture-sized frames
    pub fn frames(&self, chunk_ms: u64) -> Vec<AudioFrame> {
        let samples_per_chunk = ((self.sample_rate as u64 * chunk_ms / 1000) as usize
            * self.channels as usize)
            .max(self.channels as usize)
            .max(1);

        self.samples
            .chunks(samples_per_chunk)
            .enumerate()
            .map(|(index, chunk)| AudioFrame {
                samples: chunk.to_vec(),
                sample_rate: self.sample_rate,
                channels: self.channels,
                timestamp_ms: index as u64 * chunk_ms,
            })
            .collect()
    }
}

/// Microphone that "captures" the contents of a WAV file
///
/// Every recording delivers the whole file, so a push-to-talk cycle sends
/// the same utterance each time.
pub struct WavFileMicrophone {
    name: String,
    frames: Vec<AudioFrame>,
    capturing: bool,
}

impl WavFileMicrophone {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = AudioFile::open(path)?;
        let frames = file.frames(REPLAY_CHUNK_MS);

        Ok(Self {
            name: format!("WAV file {}", file.path),
            frames,
            capturing: false,
        })
    }
}

impl Microphone for WavFileMicrophone {
    fn start(&mut self, chunks: ChunkSender) -> Result<()> {
        if self.capturing {
            bail!("Already capturing");
        }

        for frame in &self.frames {
            chunks
                .send(frame.clone())
                .context("Recording buffer is gone")?;
        }
        self.capturing = true;

        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        &self.name
    }
}
