use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::queue::{AudioSegment, SegmentId};
use crate::audio::{decode_segment, AudioOutput};
use crate::error::ClientError;
use crate::event::{ClientEvent, EventSender};

/// How one segment's playback ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Played to the end
    Finished,
    /// Cut short by a stop request
    Stopped,
    /// Decode or output failure
    Failed(String),
}

/// Completion notice for one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackEvent {
    pub id: SegmentId,
    pub outcome: PlaybackOutcome,
}

/// Decode-and-play capability
pub trait AudioPlayer: Send {
    /// Begin playing `segment`. Exactly one [`PlaybackEvent`] with `id` is
    /// posted on `events` once playback ends, however it ends.
    fn start(
        &self,
        id: SegmentId,
        segment: AudioSegment,
        events: EventSender,
    ) -> Result<Box<dyn PlaybackHandle>, ClientError>;
}

/// The active playback of one segment
pub trait PlaybackHandle: Send {
    /// Silence and release the playback; safe to call more than once
    fn stop(&mut self);
}

/// Decodes with symphonia and renders on an [`AudioOutput`], one thread per
/// segment
pub struct DecodingPlayer {
    output: Arc<dyn AudioOutput>,
}

impl DecodingPlayer {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self { output }
    }
}

impl AudioPlayer for DecodingPlayer {
    fn start(
        &self,
        id: SegmentId,
        segment: AudioSegment,
        events: EventSender,
    ) -> Result<Box<dyn PlaybackHandle>, ClientError> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let output = Arc::clone(&self.output);

        std::thread::Builder::new()
            .name(format!("playback-{}", id))
            .spawn(move || {
                let result = decode_segment(segment.as_bytes())
                    .and_then(|audio| {
                        debug!(
                            "Playing segment {} ({:.2}s) on {}",
                            id,
                            audio.duration().as_secs_f64(),
                            output.name()
                        );
                        output.play(&audio, &thread_stop)
                    });

                let outcome = match result {
                    Ok(()) if thread_stop.load(Ordering::SeqCst) => PlaybackOutcome::Stopped,
                    Ok(()) => PlaybackOutcome::Finished,
                    Err(e) => PlaybackOutcome::Failed(format!("{:#}", e)),
                };
                let _ = events.send(ClientEvent::Playback(PlaybackEvent { id, outcome }));
            })
            .map_err(|e| ClientError::Media(format!("failed to spawn playback thread: {}", e)))?;

        Ok(Box::new(ThreadPlayback { stop }))
    }
}

struct ThreadPlayback {
    stop: Arc<AtomicBool>,
}

impl PlaybackHandle for ThreadPlayback {
    fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl Drop for ThreadPlayback {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}
