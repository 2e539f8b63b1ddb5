use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use talkback::audio::{MicrophoneFactory, MicrophoneSource, OutputFactory};
use talkback::event::{self, ClientEvent, UserCommand};
use talkback::playback::DecodingPlayer;
use talkback::transcript::ConsoleTranscript;
use talkback::transport::WebSocketConnector;
use talkback::{input, Config, VoiceClient};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Push-to-talk voice chat client
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file (extension optional)
    #[arg(long, default_value = "config/talkback")]
    config: String,

    /// Server `host:port`, overrides the configuration
    #[arg(long)]
    host: Option<String>,

    /// Send this WAV file as every recording instead of using a microphone
    #[arg(long)]
    input_wav: Option<String>,

    /// Decode replies without playing them
    #[arg(long)]
    mute: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(host) = args.host {
        cfg.server.host = host;
    }
    if args.input_wav.is_some() {
        cfg.audio.input_wav = args.input_wav;
    }
    cfg.audio.mute |= args.mute;

    info!("Talkback v{}", env!("CARGO_PKG_VERSION"));
    info!("Server endpoint: {}", cfg.server.endpoint());

    let microphone = match MicrophoneFactory::create(MicrophoneSource::from_config(&cfg.audio), &cfg.audio) {
        Ok(microphone) => Some(microphone),
        Err(e) => {
            error!("Recording initialization failed: {:#}", e);
            None
        }
    };
    let player = DecodingPlayer::new(OutputFactory::create(&cfg.audio));

    let (events_tx, events_rx) = event::channel();
    let client = VoiceClient::new(
        &cfg,
        Box::new(WebSocketConnector::new()),
        Box::new(player),
        microphone,
        Arc::new(ConsoleTranscript),
        events_tx.clone(),
    );

    // Blocking thread -> event channel
    input::spawn_stdin_reader(events_tx.clone())?;

    let ctrl_c_tx = events_tx;
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        let _ = ctrl_c_tx.send(ClientEvent::Command(UserCommand::Quit));
    });

    let stats = client.run(events_rx).await;

    info!("Session summary: {}", serde_json::to_string(&stats)?);

    Ok(())
}
