//! Participant registry — the authoritative, ordered record of who is
//! registered with the rendezvous service.
//!
//! Owned exclusively by the service loop; all mutation happens on that
//! one task, so the type itself carries no locks. Insertion order is the
//! wire-visible order of every peer-list snapshot.

use std::net::SocketAddr;

use muster_core::wire::{PeerEntry, PeerId};

/// Ordered collection of registered participants.
#[derive(Debug)]
pub struct Registry {
    next_id: PeerId,
    participants: Vec<PeerEntry>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            participants: Vec::new(),
        }
    }

    /// Register `endpoint` under `name`, or refresh an existing
    /// registration from the same endpoint.
    ///
    /// A refresh keeps the participant's id and position and updates the
    /// stored name. Returns the (possibly pre-existing) id together with
    /// the full snapshot, caller included, for use as the reply payload.
    pub fn register(&mut self, endpoint: SocketAddr, name: &str) -> (PeerId, Vec<PeerEntry>) {
        let id = match self.participants.iter_mut().find(|p| p.addr == endpoint) {
            Some(existing) => {
                existing.name = name.to_string();
                existing.id
            }
            None => {
                let id = self.next_id;
                self.next_id += 1;
                self.participants.push(PeerEntry {
                    id,
                    addr: endpoint,
                    name: name.to_string(),
                });
                id
            }
        };
        (id, self.snapshot())
    }

    /// Remove the registration for `endpoint`. Unknown endpoints are a
    /// no-op, not an error.
    pub fn unregister(&mut self, endpoint: SocketAddr) {
        if let Some(pos) = self.participants.iter().position(|p| p.addr == endpoint) {
            self.participants.remove(pos);
        }
    }

    /// The current participant list in insertion order.
    pub fn snapshot(&self) -> Vec<PeerEntry> {
        self.participants.clone()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
