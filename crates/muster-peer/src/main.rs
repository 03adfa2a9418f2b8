//! muster-peer — a Muster chat participant.
//!
//! Registers with the rendezvous service, then chats peer-to-peer: the
//! receive loop and the refresh loop run alongside a console send path.
//! Everything console-shaped lives here; the protocol lives in
//! muster-services.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc};

use muster_core::config::MusterConfig;
use muster_core::message::ChatMessage;
use muster_services::{discovery, receive, EventSink};

/// Renders events to the terminal.
struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn connected(&self, service: SocketAddr, peer_count: usize) {
        println!("connected via {service}; {peer_count} participant(s) registered");
    }

    fn message(&self, line: &str) {
        println!("{line}");
    }

    fn error(&self, error: &(dyn std::error::Error + 'static)) {
        eprintln!("connection lost: {error}");
    }
}

fn print_usage() {
    println!("Usage: muster-peer <name> [--service <addr:port>]");
    println!();
    println!("Options:");
    println!("  --service <addr:port>   Rendezvous service (default: from config)");
    println!();
    println!("Type lines to chat; /quit (or EOF) leaves.");
}

fn parse_args(config: &MusterConfig) -> Result<(String, SocketAddr)> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut name: Option<String> = None;
    let mut service: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--service" => {
                i += 1;
                service = Some(
                    args.get(i)
                        .context("--service requires a value")?
                        .clone(),
                );
            }
            "help" | "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other if name.is_none() => name = Some(other.to_string()),
            other => {
                eprintln!("Unexpected argument: {other}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(name) = name else {
        print_usage();
        std::process::exit(1);
    };

    let service = service.unwrap_or_else(|| {
        format!(
            "{}:{}",
            config.network.service_addr, config.network.service_port
        )
    });
    let service: SocketAddr = service
        .parse()
        .with_context(|| format!("invalid service address: {service}"))?;

    Ok((name, service))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = MusterConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = MusterConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        MusterConfig::default()
    });

    let (name, service) = parse_args(&config)?;

    let socket = Arc::new(
        UdpSocket::bind("0.0.0.0:0")
            .await
            .context("failed to bind local socket")?,
    );
    tracing::info!(local = %socket.local_addr()?, service = %service, "muster-peer starting");

    let sink: Arc<dyn EventSink> = Arc::new(ConsoleSink);

    // Registration round trip, before any other reader owns the socket.
    let directory = discovery::join(&socket, service, &name, &config.discovery)
        .await
        .context("registration with the rendezvous service failed")?;
    sink.connected(service, directory.len());
    let directory = directory.into_shared();

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            let _ = shutdown.send(());
        });
    }

    // ── Spawn loops ──────────────────────────────────────────────────────────
    let (update_tx, update_rx) = mpsc::channel(4);

    let receive_task = tokio::spawn(receive::receive_loop(
        socket.clone(),
        sink.clone(),
        update_tx,
        shutdown_tx.subscribe(),
    ));

    let refresh_task = tokio::spawn(discovery::refresh_loop(
        socket.clone(),
        service,
        name.clone(),
        directory.clone(),
        update_rx,
        config.discovery.clone(),
        shutdown_tx.subscribe(),
    ));

    // ── Console send path ────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shutdown_rx = shutdown_tx.subscribe();
    loop {
        let line = tokio::select! {
            _ = shutdown_rx.recv() => break,
            line = lines.next_line() => line.context("stdin read failed")?,
        };
        let Some(line) = line else {
            break; // EOF
        };
        if line.trim() == "/quit" {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let message = ChatMessage::new(name.clone(), line);
        let snapshot = directory.read().await;
        match muster_services::broadcast(&socket, &snapshot, &message).await {
            Ok(sent) => tracing::debug!(sent, "message broadcast"),
            Err(e) => eprintln!("not sent: {e}"),
        }
    }

    // Departure: tell the service, then stop the loops.
    if let Err(e) = discovery::leave(&socket, service, &name).await {
        tracing::warn!(error = %e, "failed to send unregistration");
    }
    let _ = shutdown_tx.send(());
    let _ = tokio::join!(receive_task, refresh_task);

    Ok(())
}
