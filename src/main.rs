// src/main.rs

//! The command-line entry point: runs the bridge, logs what the debuggee says,
//! and forwards each stdin line to it as a command.

use anyhow::Result;
use futures::StreamExt;
use mobdebug_bridge::config::Config;
use mobdebug_bridge::core::protocol::LineCodec;
use mobdebug_bridge::{BridgeError, DebugServer, SessionListener};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::codec::FramedRead;
use tracing::{error, info, warn};
use tracing_subscriber::{filter::EnvFilter, prelude::*};

/// Prints everything the debuggee reports to the log.
struct LoggingListener;

impl SessionListener for LoggingListener {
    fn handle_resp(&self, code: i32, params: &[String]) {
        info!("<- {} {}", code, params.join(" "));
    }

    fn handle_fault(&self, error: &BridgeError) {
        warn!("Session fault: {}", error);
    }

    fn on_connected(&self, peer: SocketAddr) {
        info!("Debuggee attached from {}", peer);
    }

    fn on_disconnected(&self) {
        info!("Debuggee detached.");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Define version information.
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) {
        println!("mobdebug-bridge version {VERSION}");
        return Ok(());
    }

    // Without --config the defaults apply.
    let mut config = match args
        .iter()
        .position(|arg| arg == "--config")
        .map(|i| args.get(i + 1))
    {
        Some(Some(path)) => match Config::from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load configuration from \"{path}\": {e:#}");
                std::process::exit(1);
            }
        },
        Some(None) => {
            eprintln!("--config flag requires a value");
            std::process::exit(1);
        }
        None => Config::default(),
    };

    // Override port if provided as a command-line argument
    if let Some(port_index) = args.iter().position(|arg| arg == "--port") {
        if let Some(port_str) = args.get(port_index + 1) {
            match port_str.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => {
                    eprintln!("Invalid port number: {port_str}");
                    std::process::exit(1);
                }
            }
        } else {
            eprintln!("--port flag requires a value");
            std::process::exit(1);
        }
    }

    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact() // Use the compact, single-line format.
                .with_ansi(true),
        )
        .init();

    let max_line_length = config.max_line_length;
    let server = DebugServer::new(config, Arc::new(LoggingListener));
    if let Err(e) = server.start().await {
        error!("Failed to start debug bridge: {}", e);
        return Err(e.into());
    }

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut stdin = FramedRead::new(tokio::io::stdin(), LineCodec::new(max_line_length));

    loop {
        tokio::select! {
            biased;

            _ = sigint.recv() => {
                info!("SIGINT received, stopping.");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, stopping.");
                break;
            }
            line = stdin.next() => match line {
                Some(Ok(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if !server.add_text_command(line) {
                        warn!("Session closed; command '{}' dropped.", line);
                        break;
                    }
                }
                Some(Err(e)) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
                None => {
                    info!("stdin closed, stopping.");
                    break;
                }
            }
        }
    }

    server.stop().await;
    Ok(())
}
