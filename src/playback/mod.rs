//! Server audio playback
//!
//! Segments are played strictly one after another in arrival order. A flush
//! (barge-in) drops everything pending and silences the active segment.

mod player;
mod queue;

pub use player::{AudioPlayer, DecodingPlayer, PlaybackEvent, PlaybackHandle, PlaybackOutcome};
pub use queue::{AudioSegment, PlaybackQueue, QueueCounters, SegmentId};
