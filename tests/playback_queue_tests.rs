// Integration tests for sequential playback and barge-in flushing

mod common;

use common::{failed, finished, MockConnector, ScriptedPlayer};
use talkback::event::{self, EventReceiver};
use talkback::playback::{AudioSegment, PlaybackEvent, PlaybackOutcome};
use talkback::session::{InterruptFlag, SessionCoordinator};
use talkback::{ConnectionManager, MemoryTranscript, PlaybackQueue, ReconnectPolicy};

fn segment(bytes: &[u8]) -> AudioSegment {
    AudioSegment::new(bytes.to_vec())
}

fn queue_with(player: ScriptedPlayer) -> (PlaybackQueue, EventReceiver) {
    let (tx, rx) = event::channel();
    (PlaybackQueue::new(Box::new(player), tx), rx)
}

#[test]
fn test_segments_play_in_arrival_order() {
    let (player, log) = ScriptedPlayer::new();
    let (mut queue, _rx) = queue_with(player);
    let flag = InterruptFlag::default();

    queue.enqueue(segment(b"A"), &flag);
    queue.enqueue(segment(b"B"), &flag);
    queue.enqueue(segment(b"C"), &flag);

    // Only the head starts; the rest wait
    assert_eq!(log.started_payloads(), vec![b"A".to_vec()]);
    assert_eq!(queue.pending_len(), 2);
    assert!(queue.is_playing());

    queue.on_playback_event(finished(log.last_id()), &flag);
    assert_eq!(log.started_payloads(), vec![b"A".to_vec(), b"B".to_vec()]);

    queue.on_playback_event(finished(log.last_id()), &flag);
    queue.on_playback_event(finished(log.last_id()), &flag);

    assert_eq!(
        log.started_payloads(),
        vec![b"A".to_vec(), b"B".to_vec(), b"C".to_vec()]
    );
    assert!(!queue.is_busy());
    assert_eq!(queue.counters().played, 3);
}

#[test]
fn test_segment_arriving_while_idle_starts_immediately() {
    let (player, log) = ScriptedPlayer::new();
    let (mut queue, _rx) = queue_with(player);
    let flag = InterruptFlag::default();

    queue.enqueue(segment(b"A"), &flag);
    queue.on_playback_event(finished(log.last_id()), &flag);
    assert!(!queue.is_playing());

    queue.enqueue(segment(b"B"), &flag);
    assert!(queue.is_playing());
    assert_eq!(queue.pending_len(), 0);
    assert_eq!(log.started_payloads().len(), 2);
}

#[test]
fn test_flush_when_idle_is_noop() {
    let (player, log) = ScriptedPlayer::new();
    let (mut queue, _rx) = queue_with(player);

    queue.flush();
    queue.flush();

    assert!(!queue.is_busy());
    assert!(log.stopped().is_empty());
    assert_eq!(queue.counters().flushed, 0);
}

#[test]
fn test_flush_stops_active_and_drops_pending() {
    let (player, log) = ScriptedPlayer::new();
    let (mut queue, _rx) = queue_with(player);
    let flag = InterruptFlag::default();

    for payload in [b"A", b"B", b"C", b"D"] {
        queue.enqueue(segment(payload), &flag);
    }
    let active = queue.active_id().unwrap();

    queue.flush();

    assert_eq!(log.stopped(), vec![active]);
    assert_eq!(queue.pending_len(), 0);
    assert!(!queue.is_playing());
    assert_eq!(queue.counters().flushed, 4);

    // Nothing else was started
    assert_eq!(log.started_payloads(), vec![b"A".to_vec()]);
}

#[test]
fn test_completion_of_flushed_segment_is_ignored() {
    let (player, log) = ScriptedPlayer::new();
    let (mut queue, _rx) = queue_with(player);
    let flag = InterruptFlag::default();

    queue.enqueue(segment(b"A"), &flag);
    let flushed = log.last_id();
    queue.flush();

    queue.enqueue(segment(b"B"), &flag);
    queue.enqueue(segment(b"C"), &flag);
    let active = queue.active_id().unwrap();

    // Late callback from the flushed segment
    queue.on_playback_event(
        PlaybackEvent {
            id: flushed,
            outcome: PlaybackOutcome::Stopped,
        },
        &flag,
    );

    assert_eq!(queue.active_id(), Some(active));
    assert_eq!(queue.pending_len(), 1);
    assert_eq!(log.started_payloads(), vec![b"A".to_vec(), b"B".to_vec()]);
}

#[test]
fn test_failed_segment_advances_to_next() {
    let (player, log) = ScriptedPlayer::new();
    let (mut queue, _rx) = queue_with(player);
    let flag = InterruptFlag::default();

    queue.enqueue(segment(b"corrupt"), &flag);
    queue.enqueue(segment(b"B"), &flag);

    queue.on_playback_event(failed(log.last_id()), &flag);

    assert_eq!(log.started_payloads(), vec![b"corrupt".to_vec(), b"B".to_vec()]);
    assert_eq!(queue.counters().failed, 1);
}

#[test]
fn test_rejected_start_is_skipped() {
    let (player, log) = ScriptedPlayer::rejecting(&[b"bad".as_slice()]);
    let (mut queue, _rx) = queue_with(player);
    let flag = InterruptFlag::default();

    queue.enqueue(segment(b"A"), &flag);
    queue.enqueue(segment(b"bad"), &flag);
    queue.enqueue(segment(b"C"), &flag);

    queue.on_playback_event(finished(log.last_id()), &flag);

    assert_eq!(log.started_payloads(), vec![b"A".to_vec(), b"C".to_vec()]);
    assert_eq!(queue.pending_len(), 0);
    assert_eq!(queue.counters().failed, 1);
}

#[test]
fn test_interrupt_suppresses_playback_until_resume() {
    let (connector, _transport) = MockConnector::new();
    let (tx, _rx) = event::channel();
    let connection = ConnectionManager::new(
        "ws://127.0.0.1:8000/ws",
        Box::new(connector),
        ReconnectPolicy::default(),
        tx,
    );
    let transcript = MemoryTranscript::new();

    let (player, log) = ScriptedPlayer::new();
    let (mut queue, _rx) = queue_with(player);
    let mut coordinator = SessionCoordinator::new();

    queue.enqueue(segment(b"A"), coordinator.flag());
    coordinator.interrupt(&mut queue, &connection, &transcript);
    assert!(coordinator.is_interrupted());

    // Anything queued while interrupted just waits
    queue.enqueue(segment(b"late"), coordinator.flag());
    assert!(!queue.is_playing());
    assert_eq!(queue.pending_len(), 1);

    coordinator.resume();
    queue.play_next(coordinator.flag());
    assert_eq!(log.started_payloads(), vec![b"A".to_vec(), b"late".to_vec()]);
}
