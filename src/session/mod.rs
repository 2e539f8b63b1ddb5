//! Session-wide state
//!
//! This module holds what the other components share:
//! - The interrupt flag and the barge-in procedure
//! - Session statistics

mod coordinator;
mod stats;

pub use coordinator::{InterruptFlag, SessionCoordinator, CONVERSATION_STOPPED};
pub use stats::SessionStats;
