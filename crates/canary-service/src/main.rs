//! Canary Service - Background poller and HTTP accessory API.
//!
//! Run with: `cargo run -p canary-service`

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::info;

use canary_core::{Bridge, CanaryClient};
use canary_service::{AppState, Config, api};

/// Canary Service - Background poller and HTTP accessory API.
#[derive(Parser, Debug)]
#[command(name = "canary-service")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long)]
    bind: Option<String>,

    /// Device serial number (overrides config).
    #[arg(short, long)]
    serial: Option<String>,

    /// Canary account username (overrides config).
    #[arg(long, env = "CANARY_USERNAME")]
    username: Option<String>,

    /// Canary account password (overrides config).
    #[arg(long, env = "CANARY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Pre-obtained bearer token; skips login (overrides config).
    #[arg(long, env = "CANARY_SESSION", hide_env_values = true)]
    session: Option<String>,

    /// Seconds between update cycles (overrides config).
    #[arg(long)]
    polling_interval: Option<u64>,

    /// Disable background poller (API only mode).
    #[arg(long)]
    no_poller: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("canary_service=info".parse()?)
                .add_directive("canary_core=info".parse()?),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    apply_overrides(&mut config, args.clone_overrides());
    config.validate()?;

    let client = CanaryClient::with_timeout(&config.api.base_url, config.api.timeout())?;
    let bridge = Bridge::new(Arc::new(client), config.accessory.bridge_settings())?;
    let state = AppState::new(&bridge, config.clone());

    info!(
        "Bridging Canary device {} as \"{}\"",
        config.accessory.serial, config.accessory.name
    );

    let poller = if args.no_poller {
        info!("Background poller disabled");
        None
    } else {
        let handle = bridge.start().await;
        state.set_polling(true);
        Some(handle)
    };

    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(config.server.bind.as_str()).await?;
    info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = poller {
        handle.shutdown().await;
        state.set_polling(false);
    }
    info!("Service stopped");

    Ok(())
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Default)]
struct Overrides {
    bind: Option<String>,
    serial: Option<String>,
    username: Option<String>,
    password: Option<String>,
    session: Option<String>,
    polling_interval: Option<u64>,
}

impl Args {
    fn clone_overrides(&self) -> Overrides {
        Overrides {
            bind: self.bind.clone(),
            serial: self.serial.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            session: self.session.clone(),
            polling_interval: self.polling_interval,
        }
    }
}

fn apply_overrides(config: &mut Config, overrides: Overrides) {
    if let Some(bind) = overrides.bind {
        config.server.bind = bind;
    }
    if let Some(serial) = overrides.serial {
        config.accessory.serial = serial;
    }
    if let Some(username) = overrides.username {
        config.accessory.username = Some(username);
    }
    if let Some(password) = overrides.password {
        config.accessory.password = Some(password);
    }
    if let Some(session) = overrides.session {
        config.accessory.session = Some(session);
    }
    if let Some(interval) = overrides.polling_interval {
        config.accessory.polling_interval = interval;
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
