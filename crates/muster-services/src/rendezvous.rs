//! Rendezvous service loop.
//!
//! One task owns the socket and the registry; every datagram is
//! processed sequentially on it, which is the registry's entire
//! synchronization story. REGISTER gets the snapshot back, UNREGISTER is
//! silent, and anything else is logged and dropped. A bad datagram never
//! stops the loop.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;

use muster_core::wire::{self, Frame, MAX_DATAGRAM};

use crate::registry::Registry;

/// Run the rendezvous service until shutdown is signalled.
///
/// Fatal only on transport-level receive failure; the error is returned
/// to the caller after being logged.
pub async fn serve(
    socket: UdpSocket,
    mut registry: Registry,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let local = socket.local_addr().context("service socket has no local addr")?;
    tracing::info!(addr = %local, "rendezvous service listening");

    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        let (len, src) = tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("rendezvous service shutting down");
                return Ok(());
            }
            received = socket.recv_from(&mut buf) => {
                received.context("rendezvous recv_from failed")?
            }
        };

        if let Some(reply) = handle_datagram(&mut registry, src, &buf[..len]) {
            if let Err(e) = socket.send_to(&reply, src).await {
                // The client may already be gone; it will retry if it cares.
                tracing::warn!(peer = %src, error = %e, "failed to send peer-list reply");
            }
        }
    }
}

/// Decode one inbound datagram and apply it to the registry.
///
/// Returns the encoded reply payload, if the command calls for one.
fn handle_datagram(registry: &mut Registry, src: SocketAddr, payload: &[u8]) -> Option<Bytes> {
    match wire::decode(payload) {
        Ok(Frame::Register { name }) => {
            let (id, snapshot) = registry.register(src, &name);
            tracing::info!(peer = %src, name, id, total = snapshot.len(), "participant registered");
            match wire::encode_peer_list(id, &snapshot) {
                Ok(reply) => Some(reply),
                Err(e) => {
                    tracing::warn!(peer = %src, error = %e, "peer list does not fit a datagram");
                    None
                }
            }
        }
        Ok(Frame::Unregister { name }) => {
            registry.unregister(src);
            tracing::info!(peer = %src, name, total = registry.len(), "participant unregistered");
            None
        }
        Ok(frame) => {
            tracing::debug!(peer = %src, ?frame, "unexpected frame on the rendezvous port");
            None
        }
        Err(e) => {
            tracing::warn!(peer = %src, error = %e, "discarding malformed datagram");
            None
        }
    }
}
