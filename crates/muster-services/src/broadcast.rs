//! Chat broadcast — fan a message out to every known peer but ourselves.
//!
//! Encode once, send per target. Each send is independent and
//! best-effort: a failed target is logged and the fan-out continues. No
//! retries, no delivery confirmation, no cross-recipient ordering.

use tokio::net::UdpSocket;

use muster_core::message::ChatMessage;
use muster_core::wire::{self, WireError};

use crate::directory::Directory;

/// Send `message` to every directory entry except ourselves.
///
/// Returns how many datagrams were handed to the transport. Encoding
/// failure (an oversized body, in practice) is the only error; send
/// failures are per-target and contained.
pub async fn broadcast(
    socket: &UdpSocket,
    directory: &Directory,
    message: &ChatMessage,
) -> Result<usize, WireError> {
    let payload = wire::encode_chat(
        directory.self_id(),
        &message.sender,
        message.timestamp_ms,
        &message.body,
    )?;

    let mut sent = 0;
    for peer in directory.peers_except_self() {
        match socket.send_to(&payload, peer.addr).await {
            Ok(_) => sent += 1,
            Err(e) => {
                tracing::warn!(peer = %peer.addr, id = peer.id, error = %e, "chat send failed");
            }
        }
    }

    tracing::debug!(sent, "chat broadcast complete");
    Ok(sent)
}
