use crate::{join_peer, start_service, wait_for_directory_len};

use std::time::Duration;

use anyhow::Result;

use muster_core::message::ChatMessage;
use muster_services::{broadcast, discovery};

// ══════════════════════════════════════════════════════════════════════════════
//  Chat — refresh-driven directories and peer-to-peer fan-out
// ══════════════════════════════════════════════════════════════════════════════

/// The refresh loop folds a later joiner into an earlier joiner's
/// directory without any action on the earlier joiner's part.
#[tokio::test]
async fn refresh_observes_a_later_joiner() -> Result<()> {
    let service = start_service().await?;

    let alice = join_peer(service.addr, "alice").await?;
    assert_eq!(alice.directory.read().await.len(), 1);

    let bob = join_peer(service.addr, "bob").await?;
    wait_for_directory_len(&alice.directory, 2).await?;

    {
        let directory = alice.directory.read().await;
        let bob_entry = directory
            .peers_except_self()
            .next()
            .expect("bob should be a broadcast target");
        assert_eq!(bob_entry.name, "bob");
        assert_eq!(bob_entry.addr, bob.socket.local_addr()?);
    }

    service.stop().await;
    Ok(())
}

/// A broadcast lands on every other participant and never on the sender,
/// with the body intact even when it contains delimiters and command text.
#[tokio::test]
async fn broadcast_reaches_peers_and_skips_the_sender() -> Result<()> {
    let service = start_service().await?;

    let mut alice = join_peer(service.addr, "alice").await?;
    let mut bob = join_peer(service.addr, "bob").await?;
    wait_for_directory_len(&alice.directory, 2).await?;

    let body = "meet at 10,ok? REGISTER:this stays chat";
    let message = ChatMessage::new(alice.name.clone(), body);
    let sent = {
        let directory = alice.directory.read().await;
        broadcast(&alice.socket, &directory, &message).await?
    };
    assert_eq!(sent, 1);

    let line = tokio::time::timeout(Duration::from_secs(2), bob.lines.recv())
        .await
        .expect("bob should receive the broadcast")
        .expect("bob's sink channel closed");
    assert!(
        line.ends_with(&format!("alice: {body}")),
        "unexpected rendered line: {line}"
    );

    // Nothing loops back to the sender.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(
        alice.lines.try_recv().is_err(),
        "alice must not receive her own broadcast"
    );

    service.stop().await;
    Ok(())
}

/// After a departure, refresh shrinks the remaining directories and
/// broadcasts stop targeting the departed endpoint.
#[tokio::test]
async fn departure_disappears_from_refreshed_directories() -> Result<()> {
    let service = start_service().await?;

    let alice = join_peer(service.addr, "alice").await?;
    let bob = join_peer(service.addr, "bob").await?;
    wait_for_directory_len(&alice.directory, 2).await?;

    // Stop bob's loops first so his refresh cannot re-register him.
    let _ = bob.shutdown.send(());
    tokio::time::sleep(Duration::from_millis(100)).await;
    discovery::leave(&bob.socket, service.addr, &bob.name).await?;

    wait_for_directory_len(&alice.directory, 1).await?;
    assert_eq!(alice.directory.read().await.peers_except_self().count(), 0);

    service.stop().await;
    Ok(())
}
