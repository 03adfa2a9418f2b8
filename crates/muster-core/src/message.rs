//! Chat message type and its rendered form.

use std::time::{SystemTime, UNIX_EPOCH};

/// One outbound or inbound chat message.
///
/// Built at send time and transmitted immediately; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: String,
    /// Unix timestamp in milliseconds, stamped by the sender.
    pub timestamp_ms: u64,
    pub body: String,
}

impl ChatMessage {
    /// Build a message stamped with the current time.
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            timestamp_ms: unix_millis(),
            body: body.into(),
        }
    }

    /// The conventional display line: `[<HH:MM:SS>] <name>: <body>`.
    pub fn render(&self) -> String {
        format!("[{}] {}: {}", clock(self.timestamp_ms), self.sender, self.body)
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Wall-clock HH:MM:SS (UTC) from unix milliseconds.
fn clock(timestamp_ms: u64) -> String {
    let secs_of_day = (timestamp_ms / 1000) % 86_400;
    format!(
        "{:02}:{:02}:{:02}",
        secs_of_day / 3600,
        (secs_of_day / 60) % 60,
        secs_of_day % 60
    )
}
