use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Feeds one segment's PCM into device callbacks
///
/// Shared between the playback thread and the realtime output callback. The
/// callback reads the segment's stop flag directly, so a flush silences the
/// output from the very next device buffer.
pub struct SegmentRenderer {
    pcm: Vec<f32>,
    cursor: AtomicUsize,
    stop: Arc<AtomicBool>,
    /// Set once a callback found nothing left to play
    drained: AtomicBool,
    /// Samples requested by the most recent callback
    last_buffer: AtomicUsize,
}

impl SegmentRenderer {
    pub fn new(pcm: Vec<f32>, stop: Arc<AtomicBool>) -> Self {
        Self {
            pcm,
            cursor: AtomicUsize::new(0),
            stop,
            drained: AtomicBool::new(false),
            last_buffer: AtomicUsize::new(0),
        }
    }

    /// Fill one device buffer: the next PCM samples, then silence
    pub fn fill(&self, data: &mut [f32]) {
        self.last_buffer.store(data.len(), Ordering::SeqCst);

        if self.stop.load(Ordering::SeqCst) {
            data.fill(0.0);
            return;
        }

        let start = self.cursor.load(Ordering::SeqCst);
        if start >= self.pcm.len() {
            data.fill(0.0);
            self.drained.store(true, Ordering::SeqCst);
            return;
        }

        let n = data.len().min(self.pcm.len() - start);
        data[..n].copy_from_slice(&self.pcm[start..start + n]);
        data[n..].fill(0.0);
        self.cursor.store(start + n, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// The device has asked for audio past the end of the segment
    pub fn is_drained(&self) -> bool {
        self.drained.load(Ordering::SeqCst)
    }

    /// How long the device's last buffer takes to play out
    pub fn buffer_duration(&self, sample_rate: u32, channels: u16) -> Duration {
        let frames = self.last_buffer.load(Ordering::SeqCst) / channels.max(1) as usize;
        if sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(frames as f64 / sample_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(len: usize) -> (SegmentRenderer, Arc<AtomicBool>) {
        let stop = Arc::new(AtomicBool::new(false));
        let pcm = (1..=len).map(|i| i as f32 / 100.0).collect();
        (SegmentRenderer::new(pcm, Arc::clone(&stop)), stop)
    }

    #[test]
    fn test_stop_silences_next_buffer() {
        let (renderer, stop) = renderer(8);
        let mut buffer = [0.0f32; 4];

        renderer.fill(&mut buffer);
        assert_eq!(buffer, [0.01, 0.02, 0.03, 0.04]);

        stop.store(true, Ordering::SeqCst);
        renderer.fill(&mut buffer);
        assert_eq!(buffer, [0.0; 4]);
        assert!(renderer.is_stopped());
        assert!(!renderer.is_drained());
    }

    #[test]
    fn test_tail_is_padded_then_drained() {
        let (renderer, _stop) = renderer(6);
        let mut buffer = [9.0f32; 4];

        renderer.fill(&mut buffer);
        renderer.fill(&mut buffer);
        assert_eq!(buffer, [0.05, 0.06, 0.0, 0.0]);
        // The tail buffer has been handed over but not played out yet
        assert!(!renderer.is_drained());

        renderer.fill(&mut buffer);
        assert_eq!(buffer, [0.0; 4]);
        assert!(renderer.is_drained());
    }

    #[test]
    fn test_buffer_duration_follows_device_request() {
        let (renderer, _stop) = renderer(10);
        let mut buffer = vec![0.0f32; 960];

        renderer.fill(&mut buffer);

        // 480 stereo frames at 48kHz
        assert_eq!(renderer.buffer_duration(48000, 2), Duration::from_millis(10));
    }
}
