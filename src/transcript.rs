use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Who a transcript line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Error,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::User => "you",
            Role::Assistant => "assistant",
            Role::Error => "error",
            Role::System => "system",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

/// Where conversation lines are displayed. Fire-and-forget.
pub trait TranscriptSink: Send + Sync {
    fn add_message(&self, role: Role, text: &str);
}

/// Prints each line to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleTranscript;

impl TranscriptSink for ConsoleTranscript {
    fn add_message(&self, role: Role, text: &str) {
        println!("[{}] {:>9}: {}", Local::now().format("%H:%M:%S"), role, text);
    }
}

/// Keeps every line in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryTranscript {
    entries: Arc<Mutex<Vec<TranscriptEntry>>>,
}

impl MemoryTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// `(role, text)` pairs in display order
    pub fn lines(&self) -> Vec<(Role, String)> {
        self.entries()
            .into_iter()
            .map(|entry| (entry.role, entry.text))
            .collect()
    }
}

impl TranscriptSink for MemoryTranscript {
    fn add_message(&self, role: Role, text: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(TranscriptEntry {
                role,
                text: text.to_string(),
                timestamp: Local::now(),
            });
        }
    }
}
