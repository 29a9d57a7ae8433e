//! Guardian alert service (guardian-alert) - Main entry point
//!
//! Assesses distress signals and dispatches SMS alerts to emergency
//! contacts. Runs without a reasoning key (keyword fallback) and without a
//! gateway endpoint (sends fail with INTERNAL_ERROR).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use guardian_alert::services::{
    GeminiClient, HttpSmsGateway, ReasoningService, SmsGateway, UnconfiguredGateway,
};
use guardian_alert::{build_router, AppState, Pipeline};
use guardian_common::config::{ConfigOverrides, ConfigResolver};
use guardian_common::events::EventBus;
use guardian_common::logging::init_tracing;
use tokio::signal;
use tracing::{info, warn};

/// Events buffered per SSE subscriber before it starts skipping
const EVENT_BUS_CAPACITY: usize = 100;

/// Command-line arguments for guardian-alert
#[derive(Parser, Debug)]
#[command(name = "guardian-alert")]
#[command(about = "Distress signal assessment and alert dispatch service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "GUARDIAN_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "GUARDIAN_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "GUARDIAN_CONFIG")]
    config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long, env = "GUARDIAN_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = ConfigOverrides {
        bind_address: args.bind_address,
        port: args.port,
        log_level: args.log_level,
    };
    let resolver = ConfigResolver::new(args.config);
    let config = resolver
        .resolve(&overrides)
        .context("Failed to load configuration")?;

    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "Starting Guardian alert service (guardian-alert) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match resolver.config_path() {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file found, using defaults and environment"),
    }

    let reasoning: Option<Arc<dyn ReasoningService>> = if config.reasoning.is_live() {
        match GeminiClient::new(&config.reasoning) {
            Ok(client) => {
                info!("Reasoning service: {} (LIVE)", client.model());
                Some(Arc::new(client) as Arc<dyn ReasoningService>)
            }
            Err(e) => {
                warn!("Reasoning client unavailable, using keyword fallback: {}", e);
                None
            }
        }
    } else {
        info!("No reasoning API key configured, using keyword fallback");
        None
    };

    let gateway: Arc<dyn SmsGateway> = match HttpSmsGateway::new(&config.gateway) {
        Ok(gateway) => {
            info!("SMS gateway: {} at {}", config.gateway.provider, gateway.endpoint());
            Arc::new(gateway)
        }
        Err(e) => {
            warn!("SMS gateway not configured, sends will fail: {}", e);
            Arc::new(UnconfiguredGateway::new(config.gateway.provider.clone()))
        }
    };

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
    let pipeline = Pipeline::new(&config, reasoning, gateway, event_bus);
    let app = build_router(AppState::new(pipeline));

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
