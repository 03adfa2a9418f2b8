//! Participant receive loop.
//!
//! After join, this loop owns all inbound traffic on the participant's
//! socket: chat frames are rendered into the sink, peer-list frames are
//! routed to the refresh task, and anything else is skipped. One bad
//! datagram never ends the loop; a transport failure does, after being
//! reported through the sink.

use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc};

use muster_core::message::ChatMessage;
use muster_core::wire::{self, Frame, MAX_DATAGRAM};

use crate::discovery::PeerListUpdate;
use crate::sink::EventSink;

/// Receive datagrams until shutdown or a fatal transport error.
///
/// Runs concurrently with the send path; tokio's `UdpSocket` allows
/// sends while this task is parked in `recv_from`.
pub async fn receive_loop(
    socket: Arc<UdpSocket>,
    sink: Arc<dyn EventSink>,
    updates: mpsc::Sender<PeerListUpdate>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        let (len, src) = tokio::select! {
            _ = shutdown.recv() => {
                tracing::debug!("receive loop shutting down");
                return;
            }
            received = socket.recv_from(&mut buf) => match received {
                Ok(received) => received,
                Err(e) => {
                    tracing::error!(error = %e, "receive loop transport failure");
                    sink.error(&e);
                    return;
                }
            }
        };

        match wire::decode(&buf[..len]) {
            Ok(Frame::Chat {
                sender,
                timestamp_ms,
                body,
                ..
            }) => {
                let message = ChatMessage {
                    sender,
                    timestamp_ms,
                    body,
                };
                sink.message(&message.render());
            }
            Ok(Frame::PeerList { self_id, peers }) => {
                if updates.send((self_id, peers)).await.is_err() {
                    tracing::debug!("refresh task gone, dropping peer-list update");
                }
            }
            Ok(frame) => {
                tracing::debug!(peer = %src, ?frame, "unexpected control frame, skipping");
            }
            Err(e) => {
                tracing::debug!(peer = %src, error = %e, "skipping malformed datagram");
            }
        }
    }
}
