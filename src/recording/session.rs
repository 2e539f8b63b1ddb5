use anyhow::Result;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::audio::{encode_wav, AudioFrame, ChunkReceiver, ChunkSender};

/// One press-to-release capture
///
/// Chunks arrive on a channel from the microphone and are buffered here in
/// arrival order until the session is finished.
pub struct RecordingSession {
    chunk_rx: ChunkReceiver,
    chunks: Vec<AudioFrame>,
    started_at: Instant,
}

/// A finished recording, ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAudio {
    /// WAV-encoded blob
    pub wav: Vec<u8>,
    pub sample_count: usize,
    pub sample_rate: u32,
    pub channels: u16,
    /// Wall-clock time between press and release
    pub held_for: Duration,
}

impl RecordedAudio {
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

impl RecordingSession {
    /// Create a session and the sender its microphone should deliver to
    pub fn new() -> (Self, ChunkSender) {
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let session = Self {
            chunk_rx,
            chunks: Vec::new(),
            started_at: Instant::now(),
        };
        (session, chunk_tx)
    }

    /// Move every chunk delivered so far into the buffer
    pub fn collect(&mut self) {
        while let Ok(chunk) = self.chunk_rx.try_recv() {
            self.chunks.push(chunk);
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Concatenate all chunks into one WAV blob.
    ///
    /// Format comes from the first chunk; the fallbacks apply only to an
    /// empty recording.
    pub fn finish(mut self, fallback_rate: u32, fallback_channels: u16) -> Result<RecordedAudio> {
        self.collect();

        let (sample_rate, channels) = self
            .chunks
            .first()
            .map(|c| (c.sample_rate, c.channels))
            .unwrap_or((fallback_rate, fallback_channels));

        let samples: Vec<i16> = self
            .chunks
            .iter()
            .flat_map(|c| c.samples.iter().copied())
            .collect();

        let wav = encode_wav(&samples, sample_rate, channels)?;

        Ok(RecordedAudio {
            wav,
            sample_count: samples.len(),
            sample_rate,
            channels,
            held_for: self.started_at.elapsed(),
        })
    }
}
