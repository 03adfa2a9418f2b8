//! The collaborator boundary.
//!
//! The core never prompts, renders, or owns a UI. Whatever does (a
//! console, a window, a test harness) implements this trait and is
//! handed to the loops as `Arc<dyn EventSink>`.

use std::net::SocketAddr;

/// Callbacks into the presentation layer.
pub trait EventSink: Send + Sync {
    /// Registration completed against `service`; the directory holds
    /// `peer_count` entries (self included).
    fn connected(&self, service: SocketAddr, peer_count: usize);

    /// A chat message arrived, already rendered for display.
    fn message(&self, line: &str);

    /// A loop hit a fatal transport error and is terminating.
    fn error(&self, error: &(dyn std::error::Error + 'static));
}
