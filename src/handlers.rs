// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the mail bridge.
//!
//! A client first fetches a token from `/api/token` (tarpitted per address)
//! and then presents it once to `/api/send`.

use crate::address::ClientInfo;
use crate::config::Config;
use crate::error::Result;
use crate::mail::{EmailMessage, Mailer};
use crate::metrics::Metrics;
use crate::tarpit::Tarpit;
use crate::token::{ActiveTokenStore, Token, TokenError};
use crate::validator::SendMailRequest;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Shared application state.
pub struct AppState {
    pub tokens: Arc<ActiveTokenStore>,
    pub tarpit: Arc<Tarpit>,
    pub mailer: Arc<dyn Mailer>,
    pub metrics: Arc<Metrics>,
    pub config: Config,
}

/// Body returned by the token endpoint.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    #[serde(rename = "Token")]
    pub token: String,
    /// Unix seconds
    #[serde(rename = "Expires")]
    pub expires: i64,
}

impl From<&Token> for TokenResponse {
    fn from(token: &Token) -> Self {
        Self {
            token: token.key(),
            expires: token.expires().timestamp(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/api/token", get(get_token))
        .route("/api/send", post(send_mail))
        .route("/health", get(health))
        .route("/healthz", get(health));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(DefaultBodyLimit::max(state.config.http.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "mailbridge",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Issue a token, after tarpitting the caller.
pub async fn get_token(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let client = ClientInfo::from_parts(&headers, peer);

    let delay = state.tarpit.wait(&client).await?;
    state.metrics.tarpit_delay.observe(delay.as_secs_f64());

    let token = state.tokens.new_token().await?;
    state.metrics.tokens_issued.inc();
    debug!(peer = %peer, delay_secs = delay.as_secs(), "Token issued");

    Ok((StatusCode::CREATED, Json(TokenResponse::from(&token))))
}

/// Validate the presented token and hand the mail to the mailer.
pub async fn send_mail(State(state): State<Arc<AppState>>, body: Bytes) -> Result<StatusCode> {
    let request: SendMailRequest = serde_json::from_slice(&body)?;
    request.validate().into_result()?;

    let validation = state.tokens.validate(&request.token).await;
    let outcome = match &validation {
        Ok(()) => "ok",
        Err(TokenError::NotFound) => "not_found",
        Err(TokenError::Expired) => "expired",
        Err(_) => "error",
    };
    state
        .metrics
        .token_validations
        .with_label_values(&[outcome])
        .inc();
    validation?;

    let mail = EmailMessage {
        from: request.from,
        recipient_id: request.to,
        subject: request.subject,
        body: request.body,
    };
    match state.mailer.send(mail).await {
        Ok(()) => {
            state.metrics.mails_sent.with_label_values(&["ok"]).inc();
            Ok(StatusCode::CREATED)
        }
        Err(e) => {
            state.metrics.mails_sent.with_label_values(&["error"]).inc();
            Err(e.into())
        }
    }
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}
