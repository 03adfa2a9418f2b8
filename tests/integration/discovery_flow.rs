use crate::{quick_discovery, start_service};

use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::net::UdpSocket;

use muster_services::{discovery, DiscoveryError};

// ══════════════════════════════════════════════════════════════════════════════
//  Discovery — registration, departure, and service robustness
// ══════════════════════════════════════════════════════════════════════════════

/// A lone participant's snapshot contains exactly itself, under its own id.
#[tokio::test]
async fn join_returns_a_snapshot_containing_the_caller() -> Result<()> {
    let service = start_service().await?;

    let socket = UdpSocket::bind("127.0.0.1:0").await?;
    let directory = discovery::join(&socket, service.addr, "alice", &quick_discovery()).await?;

    assert_eq!(directory.len(), 1);
    assert_eq!(directory.peers()[0].id, directory.self_id());
    assert_eq!(directory.peers()[0].name, "alice");
    assert_eq!(directory.peers()[0].addr, socket.local_addr()?);

    service.stop().await;
    Ok(())
}

/// A later joiner sees everyone, in registration order, with distinct ids.
#[tokio::test]
async fn later_joiner_sees_everyone_in_order() -> Result<()> {
    let service = start_service().await?;

    let alice = UdpSocket::bind("127.0.0.1:0").await?;
    let bob = UdpSocket::bind("127.0.0.1:0").await?;

    let alice_dir = discovery::join(&alice, service.addr, "alice", &quick_discovery()).await?;
    let bob_dir = discovery::join(&bob, service.addr, "bob", &quick_discovery()).await?;

    let names: Vec<&str> = bob_dir.peers().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["alice", "bob"]);
    assert_ne!(alice_dir.self_id(), bob_dir.self_id());
    assert_eq!(bob_dir.peers()[1].id, bob_dir.self_id());

    service.stop().await;
    Ok(())
}

/// Joining twice from the same socket is a refresh, not a duplicate.
#[tokio::test]
async fn rejoining_is_idempotent() -> Result<()> {
    let service = start_service().await?;

    let socket = UdpSocket::bind("127.0.0.1:0").await?;
    let first = discovery::join(&socket, service.addr, "alice", &quick_discovery()).await?;
    let second = discovery::join(&socket, service.addr, "alice", &quick_discovery()).await?;

    assert_eq!(second.len(), 1);
    assert_eq!(first.self_id(), second.self_id());

    service.stop().await;
    Ok(())
}

/// Departure removes the record; the next snapshot no longer carries it.
#[tokio::test]
async fn leave_removes_the_registration() -> Result<()> {
    let service = start_service().await?;

    let alice = UdpSocket::bind("127.0.0.1:0").await?;
    let bob = UdpSocket::bind("127.0.0.1:0").await?;

    discovery::join(&alice, service.addr, "alice", &quick_discovery()).await?;
    discovery::join(&bob, service.addr, "bob", &quick_discovery()).await?;

    discovery::leave(&alice, service.addr, "alice").await?;
    // Fire-and-forget: give the service loop a beat to process it.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let refreshed = discovery::join(&bob, service.addr, "bob", &quick_discovery()).await?;
    let names: Vec<&str> = refreshed.peers().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["bob"]);

    service.stop().await;
    Ok(())
}

/// An unanswered registration fails with a typed error inside the
/// configured retry budget instead of blocking forever.
#[tokio::test]
async fn unanswered_registration_is_bounded() -> Result<()> {
    // Bound but silent: datagrams are accepted and never answered.
    let silent = UdpSocket::bind("127.0.0.1:0").await?;
    let dead_service = silent.local_addr()?;

    let socket = UdpSocket::bind("127.0.0.1:0").await?;
    let started = Instant::now();
    let err = discovery::join(&socket, dead_service, "alice", &quick_discovery())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DiscoveryError::UnansweredRegistration { attempts: 2 }
    ));
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "bounded wait took {:?}",
        started.elapsed()
    );
    Ok(())
}

/// Garbage datagrams are discarded; registrations keep working after.
#[tokio::test]
async fn service_survives_malformed_datagrams() -> Result<()> {
    let service = start_service().await?;

    let hostile = UdpSocket::bind("127.0.0.1:0").await?;
    for payload in [
        &b""[..],
        b"REGISTER",
        b"PEERS:not-a-number",
        b"CHAT:1:alice:0:hello",
        &[0xff, 0xfe, 0xfd][..],
        b"BOGUS:whatever",
    ] {
        hostile.send_to(payload, service.addr).await?;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    let socket = UdpSocket::bind("127.0.0.1:0").await?;
    let directory = discovery::join(&socket, service.addr, "alice", &quick_discovery()).await?;
    assert_eq!(directory.len(), 1);

    service.stop().await;
    Ok(())
}
