use std::collections::VecDeque;
use tracing::{debug, info, warn};

use super::player::{AudioPlayer, PlaybackEvent, PlaybackHandle, PlaybackOutcome};
use crate::event::EventSender;
use crate::session::InterruptFlag;

/// Identifies one segment's playback
pub type SegmentId = u64;

/// One opaque encoded audio reply from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment(Vec<u8>);

impl AudioSegment {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Running totals for the queue
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueCounters {
    pub enqueued: u64,
    pub played: u64,
    pub failed: u64,
    /// Pending or playing segments discarded by a flush
    pub flushed: u64,
}

struct ActivePlayback {
    id: SegmentId,
    handle: Box<dyn PlaybackHandle>,
}

/// Sequential FIFO playback with hard cancellation
///
/// At most one segment is active at a time. Completion events for anything
/// other than the active segment are ignored, which keeps callbacks from a
/// flushed segment from advancing the queue.
pub struct PlaybackQueue {
    pending: VecDeque<AudioSegment>,
    active: Option<ActivePlayback>,
    next_id: SegmentId,
    player: Box<dyn AudioPlayer>,
    events: EventSender,
    counters: QueueCounters,
}

impl PlaybackQueue {
    pub fn new(player: Box<dyn AudioPlayer>, events: EventSender) -> Self {
        Self {
            pending: VecDeque::new(),
            active: None,
            next_id: 0,
            player,
            events,
            counters: QueueCounters::default(),
        }
    }

    /// Append to the tail and start playback if idle
    pub fn enqueue(&mut self, segment: AudioSegment, flag: &InterruptFlag) {
        debug!("Queued audio segment ({} bytes)", segment.len());
        self.pending.push_back(segment);
        self.counters.enqueued += 1;
        self.play_next(flag);
    }

    /// Start the head segment unless something is playing, the queue is
    /// empty, or playback is interrupted.
    pub fn play_next(&mut self, flag: &InterruptFlag) {
        while self.active.is_none() && !flag.is_set() {
            let Some(segment) = self.pending.pop_front() else {
                return;
            };

            self.next_id += 1;
            let id = self.next_id;

            match self.player.start(id, segment, self.events.clone()) {
                Ok(handle) => {
                    debug!("Segment {} started ({} still queued)", id, self.pending.len());
                    self.active = Some(ActivePlayback { id, handle });
                }
                Err(e) => {
                    warn!("Skipping segment {}: {}", id, e);
                    self.counters.failed += 1;
                }
            }
        }
    }

    /// Completion of a segment; advances to the next one unless interrupted
    pub fn on_playback_event(&mut self, event: PlaybackEvent, flag: &InterruptFlag) {
        match &self.active {
            Some(active) if active.id == event.id => {}
            _ => {
                debug!("Ignoring completion of inactive segment {}", event.id);
                return;
            }
        }

        // Dropping the handle releases the segment's playback resources
        self.active = None;

        match event.outcome {
            PlaybackOutcome::Finished => {
                self.counters.played += 1;
                debug!("Segment {} finished", event.id);
            }
            PlaybackOutcome::Stopped => {
                debug!("Segment {} stopped", event.id);
            }
            PlaybackOutcome::Failed(reason) => {
                self.counters.failed += 1;
                warn!("Error playing segment {}: {}", event.id, reason);
            }
        }

        if !flag.is_set() {
            self.play_next(flag);
        }
    }

    /// Drop everything queued and silence the active segment
    pub fn flush(&mut self) {
        let dropped = self.pending.len();
        self.pending.clear();
        self.counters.flushed += dropped as u64;

        if let Some(mut active) = self.active.take() {
            active.handle.stop();
            self.counters.flushed += 1;
            info!("Stopped segment {} and dropped {} queued", active.id, dropped);
        } else if dropped > 0 {
            info!("Dropped {} queued segments", dropped);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    /// Playing or holding pending segments
    pub fn is_busy(&self) -> bool {
        self.active.is_some() || !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn active_id(&self) -> Option<SegmentId> {
        self.active.as_ref().map(|a| a.id)
    }

    pub fn counters(&self) -> QueueCounters {
        self.counters
    }
}
