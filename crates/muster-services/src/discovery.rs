//! Discovery client — how a participant talks to the rendezvous service.
//!
//! `join` performs the registration round trip with a bounded wait and a
//! retry budget; an unanswered service is a typed error, not an infinite
//! block. `leave` is fire-and-forget. `refresh_loop` re-registers on an
//! interval so the directory tracks later joins and departures; its
//! consistency is eventual, bounded by the interval.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc};
use tokio::time;

use muster_core::config::DiscoveryConfig;
use muster_core::wire::{self, Frame, PeerEntry, PeerId, MAX_DATAGRAM};

use crate::directory::{Directory, SharedDirectory};

/// A peer-list snapshot routed from the receive loop to the refresh
/// task: the refreshed self id plus the entries.
pub type PeerListUpdate = (PeerId, Vec<PeerEntry>);

/// Errors surfaced by the discovery exchange.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),

    #[error("malformed reply: {0}")]
    Malformed(#[from] wire::WireError),

    #[error("service replied with something other than a peer list")]
    UnexpectedReply,

    #[error("registration unanswered after {attempts} attempt(s)")]
    UnansweredRegistration { attempts: u32 },
}

/// Register with the rendezvous service and resolve the reply into a
/// [`Directory`].
///
/// Must be called while nothing else is receiving on `socket` — the
/// reply is read directly here. Once the receive loop owns the socket,
/// refreshes go through [`refresh_loop`] instead.
pub async fn join(
    socket: &UdpSocket,
    service: SocketAddr,
    name: &str,
    config: &DiscoveryConfig,
) -> Result<Directory, DiscoveryError> {
    let register = wire::encode_register(name)?;
    let timeout = Duration::from_millis(config.register_timeout_ms);
    let attempts = config.register_attempts.max(1);

    let mut buf = [0u8; MAX_DATAGRAM];
    for attempt in 1..=attempts {
        socket.send_to(&register, service).await?;

        let received = match time::timeout(timeout, socket.recv_from(&mut buf)).await {
            Ok(received) => received?,
            Err(_elapsed) => {
                tracing::debug!(attempt, attempts, "registration reply timed out");
                continue;
            }
        };

        let (len, from) = received;
        if from != service {
            // Chat traffic can land before we are even registered; only
            // the service's reply concludes the join.
            tracing::debug!(peer = %from, "ignoring non-service datagram during join");
            continue;
        }

        return match wire::decode(&buf[..len])? {
            Frame::PeerList { self_id, peers } => {
                tracing::info!(id = self_id, peers = peers.len(), "joined");
                Ok(Directory::new(self_id, peers))
            }
            _ => Err(DiscoveryError::UnexpectedReply),
        };
    }

    Err(DiscoveryError::UnansweredRegistration { attempts })
}

/// Send the unregistration notice. Fire-and-forget: no reply is defined,
/// so only local failures are reported.
pub async fn leave(
    socket: &UdpSocket,
    service: SocketAddr,
    name: &str,
) -> Result<(), DiscoveryError> {
    let unregister = wire::encode_unregister(name)?;
    socket.send_to(&unregister, service).await?;
    tracing::info!(name, "unregistered");
    Ok(())
}

/// Periodically re-register and install the fresh snapshot.
///
/// The receive loop owns the socket's inbound side by now, so replies
/// arrive through `updates` rather than a direct read. A missed reply
/// keeps the stale directory; the next tick tries again.
pub async fn refresh_loop(
    socket: std::sync::Arc<UdpSocket>,
    service: SocketAddr,
    name: String,
    directory: SharedDirectory,
    mut updates: mpsc::Receiver<PeerListUpdate>,
    config: DiscoveryConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    if config.refresh_interval_secs == 0 {
        tracing::info!("directory refresh disabled");
        let _ = shutdown.recv().await;
        return;
    }

    let register = match wire::encode_register(&name) {
        Ok(payload) => payload,
        Err(e) => {
            // join() already validated the name, so this cannot happen
            // after a successful join.
            tracing::error!(error = %e, "cannot encode refresh registration");
            return;
        }
    };
    let reply_timeout = Duration::from_millis(config.register_timeout_ms);
    let mut interval = time::interval(Duration::from_secs(config.refresh_interval_secs));
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    // The first tick fires immediately; the directory was installed at
    // join time, so skip it.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.recv() => return,
            _ = interval.tick() => {}
        }

        // Discard any reply left over from a previous, slower exchange.
        while updates.try_recv().is_ok() {}

        if let Err(e) = socket.send_to(&register, service).await {
            tracing::warn!(error = %e, "refresh registration send failed");
            continue;
        }

        match time::timeout(reply_timeout, updates.recv()).await {
            Ok(Some((self_id, peers))) => {
                let count = peers.len();
                directory.write().await.install(self_id, peers);
                tracing::debug!(id = self_id, peers = count, "directory refreshed");
            }
            Ok(None) => {
                // Receive loop gone; nothing further to refresh for.
                return;
            }
            Err(_elapsed) => {
                tracing::warn!("refresh reply timed out, keeping stale directory");
            }
        }
    }
}
