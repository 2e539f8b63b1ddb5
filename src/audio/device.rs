// Local audio devices via cpal

use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{info, warn};

use super::backend::{AudioFrame, ChunkSender, Microphone};
use super::decode::DecodedAudio;
use super::output::{AudioOutput, STOP_POLL_INTERVAL};
use super::render::SegmentRenderer;
use crate::config::AudioConfig;

/// Microphone capture from the default input device
///
/// The cpal stream lives on its own thread so the handle stays `Send`.
pub struct CpalMicrophone {
    name: String,
    stream_config: cpal::StreamConfig,
    /// Downmix to this many channels (1 or device native)
    output_channels: u16,
    worker: Option<CaptureWorker>,
}

struct CaptureWorker {
    stop_tx: std_mpsc::Sender<()>,
    thread: JoinHandle<()>,
}

impl CpalMicrophone {
    pub fn new(config: &AudioConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .context("No default input device")?;
        let name = device.name().unwrap_or_else(|_| "unknown".into());

        let default = device
            .default_input_config()
            .context("Input device has no usable configuration")?;

        let stream_config = cpal::StreamConfig {
            channels: default.channels(),
            sample_rate: default.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };
        let output_channels = if config.channels == 1 { 1 } else { default.channels() };

        if default.sample_rate().0 != config.sample_rate {
            info!(
                "Input device runs at {}Hz (requested {}Hz); recordings use the device rate",
                default.sample_rate().0,
                config.sample_rate
            );
        }

        info!(
            "Microphone ready: {} ({}Hz, {} channels)",
            name,
            default.sample_rate().0,
            default.channels()
        );

        Ok(Self {
            name,
            stream_config,
            output_channels,
            worker: None,
        })
    }
}

impl Microphone for CpalMicrophone {
    fn start(&mut self, chunks: ChunkSender) -> Result<()> {
        if self.worker.is_some() {
            bail!("Already capturing");
        }

        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), String>>();
        let stream_config = self.stream_config.clone();
        let output_channels = self.output_channels;

        let thread = std::thread::Builder::new()
            .name("capture".into())
            .spawn(move || {
                let stream = match open_input_stream(&stream_config, output_channels, chunks) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("{:#}", e)));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                let _ = stop_rx.recv();
                drop(stream);
            })
            .context("Failed to spawn capture thread")?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                bail!("Failed to start capture: {}", e);
            }
            Err(_) => bail!("Capture thread exited before starting"),
        }

        self.worker = Some(CaptureWorker { stop_tx, thread });
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            worker
                .thread
                .join()
                .map_err(|_| anyhow!("Capture thread panicked"))?;
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.worker.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn open_input_stream(
    config: &cpal::StreamConfig,
    output_channels: u16,
    chunks: ChunkSender,
) -> Result<cpal::Stream> {
    let device = cpal::default_host()
        .default_input_device()
        .context("No default input device")?;

    let channels = config.channels as usize;
    let sample_rate = config.sample_rate.0;
    let downmix = output_channels == 1 && channels > 1;
    let started = Instant::now();

    let stream = device
        .build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let samples: Vec<i16> = if downmix {
                    data.chunks(channels)
                        .map(|frame| to_i16(frame.iter().sum::<f32>() / channels as f32))
                        .collect()
                } else {
                    data.iter().map(|&s| to_i16(s)).collect()
                };
                let _ = chunks.send(AudioFrame {
                    samples,
                    sample_rate,
                    channels: if downmix { 1 } else { channels as u16 },
                    timestamp_ms: started.elapsed().as_millis() as u64,
                });
            },
            |err| warn!("Input stream error: {}", err),
            None,
        )
        .context("Failed to build input stream")?;

    stream.play().context("Failed to start input stream")?;
    Ok(stream)
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Speaker output on the default device, one stream per segment
#[derive(Debug, Default)]
pub struct CpalOutput;

impl CpalOutput {
    pub fn new() -> Self {
        Self
    }
}

impl AudioOutput for CpalOutput {
    fn play(&self, audio: &DecodedAudio, stop: &Arc<AtomicBool>) -> Result<()> {
        let device = cpal::default_host()
            .default_output_device()
            .context("No default output device")?;
        let supported = device
            .default_output_config()
            .context("Output device has no usable configuration")?;
        let config = supported.config();

        let renderer = Arc::new(SegmentRenderer::new(
            adapt(audio, config.sample_rate.0, config.channels),
            Arc::clone(stop),
        ));

        let stream = {
            let renderer = Arc::clone(&renderer);
            device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| renderer.fill(data),
                    |err| warn!("Output stream error: {}", err),
                    None,
                )
                .context("Failed to build output stream")?
        };
        stream.play().context("Failed to start output stream")?;

        loop {
            if renderer.is_stopped() {
                break;
            }
            if renderer.is_drained() {
                // The tail is still in the device's last buffer
                std::thread::sleep(renderer.buffer_duration(config.sample_rate.0, config.channels));
                break;
            }
            std::thread::sleep(STOP_POLL_INTERVAL);
        }

        drop(stream);
        Ok(())
    }

    fn name(&self) -> &str {
        "cpal default output"
    }
}

/// Nearest-neighbour resample and channel map to the device format
fn adapt(audio: &DecodedAudio, rate: u32, channels: u16) -> Vec<f32> {
    let in_channels = audio.channels.max(1) as usize;
    let out_channels = channels.max(1) as usize;
    let in_frames = audio.frames();
    if in_frames == 0 || audio.sample_rate == 0 {
        return Vec::new();
    }

    let out_frames = (in_frames as u64 * rate as u64 / audio.sample_rate as u64) as usize;
    let mut out = Vec::with_capacity(out_frames * out_channels);

    for i in 0..out_frames {
        let src = ((i as u64 * audio.sample_rate as u64 / rate as u64) as usize).min(in_frames - 1);
        let frame = &audio.samples[src * in_channels..(src + 1) * in_channels];
        if out_channels == 1 {
            out.push(frame.iter().sum::<f32>() / in_channels as f32);
        } else {
            for c in 0..out_channels {
                out.push(frame[c.min(in_channels - 1)]);
            }
        }
    }

    out
}
