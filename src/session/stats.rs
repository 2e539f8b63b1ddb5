use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a client session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Random identifier used in logs
    pub session_id: String,

    /// When the client started
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Audio segments received from the server
    pub segments_received: u64,

    /// Segments that played to the end
    pub segments_played: u64,

    /// Segments that failed to decode or play
    pub segments_failed: u64,

    /// Segments discarded by barge-in
    pub segments_dropped: u64,

    /// Recordings transmitted to the server
    pub recordings_sent: u64,

    /// Recordings lost because the connection was down or they were empty
    pub recordings_dropped: u64,

    /// Barge-in count
    pub interrupts: u64,

    /// Automatic reconnection attempts scheduled
    pub reconnect_attempts: u64,

    /// `error` frames received from the server
    pub server_errors: u64,
}

impl SessionStats {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            started_at: Utc::now(),
            duration_secs: 0.0,
            segments_received: 0,
            segments_played: 0,
            segments_failed: 0,
            segments_dropped: 0,
            recordings_sent: 0,
            recordings_dropped: 0,
            interrupts: 0,
            reconnect_attempts: 0,
            server_errors: 0,
        }
    }
}
