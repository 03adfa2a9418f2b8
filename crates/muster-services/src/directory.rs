//! Participant-side directory — the local cache of the peer list.
//!
//! Installed from the snapshot returned at join time and replaced
//! wholesale by each refresh. The refresh task is the single writer; the
//! send path only reads. Broadcast targets are selected by id equality,
//! never by comparing transport addresses.

use std::sync::Arc;

use tokio::sync::RwLock;

use muster_core::wire::{PeerEntry, PeerId};

/// The resolved peer list, plus this participant's own id.
#[derive(Debug, Clone)]
pub struct Directory {
    self_id: PeerId,
    peers: Vec<PeerEntry>,
}

/// Handle shared between the refresh task (writer) and the send path
/// (reader).
pub type SharedDirectory = Arc<RwLock<Directory>>;

impl Directory {
    pub fn new(self_id: PeerId, peers: Vec<PeerEntry>) -> Self {
        Self { self_id, peers }
    }

    /// Wrap into the shared handle used across tasks.
    pub fn into_shared(self) -> SharedDirectory {
        Arc::new(RwLock::new(self))
    }

    /// Replace the directory with a fresh snapshot.
    ///
    /// The id is replaced too: if the service restarted, the refresh
    /// registration will have assigned this participant a new identity.
    pub fn install(&mut self, self_id: PeerId, peers: Vec<PeerEntry>) {
        self.self_id = self_id;
        self.peers = peers;
    }

    pub fn self_id(&self) -> PeerId {
        self.self_id
    }

    /// All known entries, including our own, in snapshot order.
    pub fn peers(&self) -> &[PeerEntry] {
        &self.peers
    }

    /// Broadcast targets: every entry whose id differs from ours.
    pub fn peers_except_self(&self) -> impl Iterator<Item = &PeerEntry> + '_ {
        self.peers.iter().filter(|p| p.id != self.self_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
