use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub reconnect: ReconnectConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `host:port` of the voice chat server
    pub host: String,
    /// WebSocket path on that host
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1:8000".to_string(),
            path: "/ws".to_string(),
        }
    }
}

impl ServerConfig {
    /// Full WebSocket URL for the chat endpoint
    pub fn endpoint(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!("ws://{}{}", self.host, path)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub base_delay_ms: u64,
    pub max_attempts: u32,
    /// Delay stops growing once the attempt count reaches this factor
    pub max_delay_factor: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_attempts: 5,
            max_delay_factor: 5,
        }
    }
}

impl ReconnectConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Capture sample rate requested from the microphone
    pub sample_rate: u32,
    pub channels: u16,
    /// Decode replies but never open an output device
    pub mute: bool,
    /// Replay this WAV file as every recording instead of using a microphone
    pub input_wav: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            mute: false,
            input_wav: None,
        }
    }
}

impl Config {
    /// Load layered configuration: optional file at `path`, then
    /// `TALKBACK__SECTION__KEY` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("TALKBACK").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_adds_leading_slash() {
        let server = ServerConfig {
            host: "example.com:9000".to_string(),
            path: "chat".to_string(),
        };
        assert_eq!(server.endpoint(), "ws://example.com:9000/chat");
    }

    #[test]
    fn test_default_settings() {
        let cfg = Config::default();
        assert_eq!(cfg.server.endpoint(), "ws://127.0.0.1:8000/ws");
        assert_eq!(cfg.reconnect.max_attempts, 5);
        assert_eq!(cfg.reconnect.base_delay(), Duration::from_secs(1));
        assert_eq!(cfg.reconnect.max_delay_factor, 5);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = Config::load("/nonexistent/talkback-config").unwrap();
        assert_eq!(cfg.server.path, "/ws");
        assert!(!cfg.audio.mute);
    }
}
