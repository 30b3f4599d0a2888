// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mail Bridge Service
//!
//! Relays contact-form style mail to a fixed set of recipients. Clients
//! fetch a token from `GET /api/token` and present it with the message to
//! `POST /api/send`.
//!
//! ## Configuration
//!
//! Configuration is read from a JSON file (`--config-file`, default
//! `config.json`). These environment variables override the file:
//!
//! - `BIND_ADDR`: Server bind address
//! - `SMTP_USERNAME`, `SMTP_PASSWORD`: SMTP relay credentials

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mailbridge::{
    config::Config,
    handlers::{router, AppState},
    mail::SmtpMailer,
    metrics::Metrics,
    tarpit::Tarpit,
    token::ActiveTokenStore,
};

#[derive(Parser)]
#[command(name = "mailbridge", version, about = "Token-gated SMTP relay")]
struct Args {
    /// Configuration file (JSON)
    #[arg(long, default_value = "config.json")]
    config_file: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let mut config = Config::from_file(&args.config_file)?;
    config.apply_env_overrides();
    info!(
        bind_addr = %config.bind_addr,
        lifetime_secs = config.tokens.lifetime_secs,
        cleanup_interval_secs = config.tokens.cleanup_interval_secs,
        tarpit_tick_secs = config.tarpit.tick_secs,
        recipients = config.recipients.len(),
        "Starting mail bridge"
    );

    // Core components and their sweeps
    let shutdown = CancellationToken::new();
    let (tokens, token_sweeper) = ActiveTokenStore::start(&config.tokens, shutdown.clone());
    let (tarpit, tarpit_sweeper) = Tarpit::start(&config.tarpit, shutdown.clone());

    let mailer = SmtpMailer::new(&config.smtp, config.recipients.clone())?;
    let state = Arc::new(AppState {
        tokens,
        tarpit,
        mailer: Arc::new(mailer),
        metrics: Arc::new(Metrics::new()?),
        config: config.clone(),
    });

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await?;

    shutdown.cancel();
    let (tokens_done, tarpit_done) = tokio::join!(token_sweeper, tarpit_sweeper);
    for (name, result) in [("token", tokens_done), ("tarpit", tarpit_done)] {
        if let Err(e) = result {
            warn!(sweeper = name, error = %e, "Sweeper task failed");
        }
    }
    info!("Server shut down");
    Ok(())
}

/// Resolve on Ctrl+C, or when something else cancels `shutdown`.
async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                // Keep serving; only an explicit cancel stops us now
                shutdown.cancelled().await;
            }
            info!("Received shutdown signal");
        }
        _ = shutdown.cancelled() => {}
    }
}
