//! musterd — the Muster rendezvous service.
//!
//! Maintains the participant registry and answers discovery requests.
//! All datagrams are processed sequentially on one task; the registry
//! never leaves it.

use anyhow::{Context, Result};
use tokio::net::UdpSocket;

use muster_core::config::MusterConfig;
use muster_services::{rendezvous, Registry};

fn print_usage() {
    println!("Usage: musterd [--port <port>]");
    println!();
    println!("Options:");
    println!("  --port <port>   UDP listen port (default: from config, 12345)");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = MusterConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = MusterConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        MusterConfig::default()
    });

    // Parse --port option
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut port = config.network.service_port;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                port = args
                    .get(i)
                    .context("--port requires a value")?
                    .parse()
                    .context("--port must be a number")?;
            }
            "help" | "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {other}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let socket = UdpSocket::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind UDP port {port}"))?;
    tracing::info!(port, "musterd starting");

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    rendezvous::serve(socket, Registry::new(), shutdown_tx.subscribe()).await
}
