use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use super::decode::DecodedAudio;
use crate::config::AudioConfig;

/// How often a blocking output checks the stop flag
pub(crate) const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Audio output sink
///
/// `play` blocks the calling thread until the audio has been rendered or
/// `stop` is raised. The flag is shared so device callbacks can watch it
/// too. Each call acquires and releases its own output resources, so nothing
/// carries over from one segment to the next.
pub trait AudioOutput: Send + Sync {
    fn play(&self, audio: &DecodedAudio, stop: &Arc<AtomicBool>) -> Result<()>;

    /// Output name for logging
    fn name(&self) -> &str;
}

/// Renders nothing but takes as long as the audio would
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl AudioOutput for NullOutput {
    fn play(&self, audio: &DecodedAudio, stop: &Arc<AtomicBool>) -> Result<()> {
        let deadline = Instant::now() + audio.duration();
        while Instant::now() < deadline {
            if stop.load(Ordering::SeqCst) {
                break;
            }
            std::thread::sleep(STOP_POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "silent"
    }
}

/// Audio output factory
pub struct OutputFactory;

impl OutputFactory {
    pub fn create(config: &AudioConfig) -> Arc<dyn AudioOutput> {
        if config.mute {
            info!("Playback muted; replies are decoded but not rendered");
            return Arc::new(NullOutput);
        }

        #[cfg(feature = "device")]
        {
            Arc::new(super::device::CpalOutput::new())
        }

        #[cfg(not(feature = "device"))]
        {
            tracing::warn!("Built without the `device` feature; replies will not be audible");
            Arc::new(NullOutput)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(frames: usize, sample_rate: u32) -> DecodedAudio {
        DecodedAudio {
            samples: vec![0.1; frames],
            sample_rate,
            channels: 1,
        }
    }

    #[test]
    fn test_null_output_waits_for_duration() {
        let stop = Arc::new(AtomicBool::new(false));
        let started = Instant::now();

        NullOutput.play(&tone(800, 16000), &stop).unwrap(); // 50ms

        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_null_output_returns_early_when_stopped() {
        let stop = Arc::new(AtomicBool::new(true));
        let started = Instant::now();

        NullOutput.play(&tone(160_000, 16000), &stop).unwrap(); // 10s

        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
