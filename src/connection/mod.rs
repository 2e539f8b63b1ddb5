//! Connection lifecycle and reconnection

mod manager;
mod reconnect;

pub use manager::ConnectionManager;
pub use reconnect::{CloseOutcome, ReconnectPolicy};
pub use state::ConnectionState;

mod state {
    /// Lifecycle of the duplex connection
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ConnectionState {
        Closed,
        Connecting,
        Open,
        Closing,
    }
}
