// Test doubles for the client's collaborators
//
// Each double records what the client asked of it in a shared log so tests
// can inspect behaviour after handing ownership to the client.

#![allow(dead_code)]

use anyhow::{bail, Result};
use std::sync::{Arc, Mutex};
use talkback::audio::{AudioFrame, ChunkSender, Microphone};
use talkback::event::{self, ClientEvent, EventReceiver, EventSender, UserCommand};
use talkback::playback::{AudioPlayer, AudioSegment, PlaybackEvent, PlaybackHandle, PlaybackOutcome, SegmentId};
use talkback::transport::{Connector, Link, OutboundFrame, TransportEvent, TransportEventKind};
use talkback::{ClientError, Config, MemoryTranscript, VoiceClient};

// ----------------------------------------------------------------------------
// Transport
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TransportState {
    /// (url, generation) for every connection opened
    pub opened: Vec<(String, u64)>,
    pub sent: Vec<OutboundFrame>,
    pub close_requests: usize,
}

#[derive(Clone, Default)]
pub struct TransportLog(Arc<Mutex<TransportState>>);

impl TransportLog {
    pub fn opened(&self) -> usize {
        self.0.lock().unwrap().opened.len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.0.lock().unwrap().opened.iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn sent(&self) -> Vec<OutboundFrame> {
        self.0.lock().unwrap().sent.clone()
    }

    pub fn close_requests(&self) -> usize {
        self.0.lock().unwrap().close_requests
    }
}

pub struct MockConnector {
    log: TransportLog,
}

impl MockConnector {
    pub fn new() -> (Self, TransportLog) {
        let log = TransportLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl Connector for MockConnector {
    fn open(&self, url: &str, generation: u64, _events: EventSender) -> Box<dyn Link> {
        self.log.0.lock().unwrap().opened.push((url.to_string(), generation));
        Box::new(MockLink {
            log: self.log.clone(),
        })
    }
}

struct MockLink {
    log: TransportLog,
}

impl Link for MockLink {
    fn send(&self, frame: OutboundFrame) -> Result<(), ClientError> {
        self.log.0.lock().unwrap().sent.push(frame);
        Ok(())
    }

    fn close(&self) {
        self.log.0.lock().unwrap().close_requests += 1;
    }
}

// ----------------------------------------------------------------------------
// Playback
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PlayerState {
    /// (segment id, payload) in start order
    pub started: Vec<(SegmentId, Vec<u8>)>,
    pub stopped: Vec<SegmentId>,
}

#[derive(Clone, Default)]
pub struct PlayerLog(Arc<Mutex<PlayerState>>);

impl PlayerLog {
    pub fn started_payloads(&self) -> Vec<Vec<u8>> {
        self.0.lock().unwrap().started.iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn started_ids(&self) -> Vec<SegmentId> {
        self.0.lock().unwrap().started.iter().map(|(id, _)| *id).collect()
    }

    pub fn last_id(&self) -> SegmentId {
        *self.started_ids().last().expect("nothing started")
    }

    pub fn stopped(&self) -> Vec<SegmentId> {
        self.0.lock().unwrap().stopped.clone()
    }
}

/// Records starts; completion is driven by the test
pub struct ScriptedPlayer {
    log: PlayerLog,
    /// Payloads whose start fails synchronously
    reject: Vec<Vec<u8>>,
}

impl ScriptedPlayer {
    pub fn new() -> (Self, PlayerLog) {
        let log = PlayerLog::default();
        (Self { log: log.clone(), reject: Vec::new() }, log)
    }

    pub fn rejecting(payloads: &[&[u8]]) -> (Self, PlayerLog) {
        let (mut player, log) = Self::new();
        player.reject = payloads.iter().map(|p| p.to_vec()).collect();
        (player, log)
    }
}

impl AudioPlayer for ScriptedPlayer {
    fn start(
        &self,
        id: SegmentId,
        segment: AudioSegment,
        _events: EventSender,
    ) -> Result<Box<dyn PlaybackHandle>, ClientError> {
        if self.reject.iter().any(|p| p.as_slice() == segment.as_bytes()) {
            return Err(ClientError::Media("rejected by test player".to_string()));
        }
        self.log
            .0
            .lock()
            .unwrap()
            .started
            .push((id, segment.as_bytes().to_vec()));
        Ok(Box::new(ScriptedHandle {
            id,
            log: self.log.clone(),
        }))
    }
}

struct ScriptedHandle {
    id: SegmentId,
    log: PlayerLog,
}

impl PlaybackHandle for ScriptedHandle {
    fn stop(&mut self) {
        let mut state = self.log.0.lock().unwrap();
        if !state.stopped.contains(&self.id) {
            state.stopped.push(self.id);
        }
    }
}

pub fn finished(id: SegmentId) -> PlaybackEvent {
    PlaybackEvent {
        id,
        outcome: PlaybackOutcome::Finished,
    }
}

pub fn failed(id: SegmentId) -> PlaybackEvent {
    PlaybackEvent {
        id,
        outcome: PlaybackOutcome::Failed("corrupt segment".to_string()),
    }
}

// ----------------------------------------------------------------------------
// Microphone
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MicrophoneState {
    pub starts: usize,
    pub stops: usize,
}

#[derive(Clone, Default)]
pub struct MicrophoneLog(Arc<Mutex<MicrophoneState>>);

impl MicrophoneLog {
    pub fn starts(&self) -> usize {
        self.0.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.0.lock().unwrap().stops
    }
}

/// Delivers a fixed set of chunks on every start
pub struct FakeMicrophone {
    chunks: Vec<AudioFrame>,
    fail_start: bool,
    capturing: bool,
    log: MicrophoneLog,
}

impl FakeMicrophone {
    pub fn new(chunks: Vec<AudioFrame>) -> (Self, MicrophoneLog) {
        let log = MicrophoneLog::default();
        let mic = Self {
            chunks,
            fail_start: false,
            capturing: false,
            log: log.clone(),
        };
        (mic, log)
    }

    pub fn failing() -> (Self, MicrophoneLog) {
        let (mut mic, log) = Self::new(Vec::new());
        mic.fail_start = true;
        (mic, log)
    }
}

impl Microphone for FakeMicrophone {
    fn start(&mut self, chunks: ChunkSender) -> Result<()> {
        if self.fail_start {
            bail!("device busy");
        }
        self.log.0.lock().unwrap().starts += 1;
        for chunk in &self.chunks {
            chunks.send(chunk.clone())?;
        }
        self.capturing = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.log.0.lock().unwrap().stops += 1;
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "fake microphone"
    }
}

pub fn chunk(samples: &[i16], timestamp_ms: u64) -> AudioFrame {
    AudioFrame {
        samples: samples.to_vec(),
        sample_rate: 16000,
        channels: 1,
        timestamp_ms,
    }
}

// ----------------------------------------------------------------------------
// Client harness
// ----------------------------------------------------------------------------

pub struct Harness {
    pub client: VoiceClient,
    pub transport: TransportLog,
    pub player: PlayerLog,
    pub microphone: MicrophoneLog,
    pub transcript: MemoryTranscript,
    pub events: EventReceiver,
    pub events_tx: EventSender,
}

impl Harness {
    /// Client with a working microphone delivering `chunks`
    pub fn new(chunks: Vec<AudioFrame>) -> Self {
        let (mic, mic_log) = FakeMicrophone::new(chunks);
        Self::build(Some(Box::new(mic)), mic_log)
    }

    /// Client whose capture device failed at startup
    pub fn without_microphone() -> Self {
        Self::build(None, MicrophoneLog::default())
    }

    fn build(microphone: Option<Box<dyn Microphone>>, microphone_log: MicrophoneLog) -> Self {
        let (connector, transport) = MockConnector::new();
        let (player, player_log) = ScriptedPlayer::new();
        let transcript = MemoryTranscript::new();
        let (events_tx, events) = event::channel();

        let client = VoiceClient::new(
            &Config::default(),
            Box::new(connector),
            Box::new(player),
            microphone,
            Arc::new(transcript.clone()),
            events_tx.clone(),
        );

        Self {
            client,
            transport,
            player: player_log,
            microphone: microphone_log,
            transcript,
            events,
            events_tx,
        }
    }

    /// Start the client and complete the first handshake
    pub fn connected(chunks: Vec<AudioFrame>) -> Self {
        let mut harness = Self::new(chunks);
        harness.client.start();
        harness.transport(TransportEventKind::Opened);
        harness
    }

    pub fn transport(&mut self, kind: TransportEventKind) -> bool {
        let generation = self.client.connection().generation();
        self.client
            .handle(ClientEvent::Transport(TransportEvent::new(generation, kind)))
    }

    pub fn server_audio(&mut self, payload: &[u8]) {
        self.transport(TransportEventKind::Binary(payload.to_vec()));
    }

    pub fn server_text(&mut self, text: &str) {
        self.transport(TransportEventKind::Text(text.to_string()));
    }

    pub fn close(&mut self, code: u16) {
        self.transport(TransportEventKind::Closed {
            code,
            reason: String::new(),
        });
    }

    pub fn playback(&mut self, event: PlaybackEvent) {
        self.client.handle(ClientEvent::Playback(event));
    }

    pub fn command(&mut self, command: UserCommand) -> bool {
        self.client.handle(ClientEvent::Command(command))
    }
}
