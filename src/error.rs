// SPDX-License-Identifier: Apache-2.0
//! Error types for the mail bridge request path

use crate::address::AddressError;
use crate::mail::MailError;
use crate::token::TokenError;
use crate::validator::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, info, warn};

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Tarpit: {0}")]
    Address(#[from] AddressError),

    #[error("Token: {0}")]
    Token(#[from] TokenError),

    #[error("Invalid request body: {0}")]
    Body(#[from] serde_json::Error),

    #[error("Failed validation: {0}")]
    Validation(#[from] ValidationError),

    #[error("Mail sending: {0}")]
    Mail(#[from] MailError),
}

/// Every failure looks the same to the client, so callers cannot probe
/// whether a token ever existed.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Token(TokenError::NotFound | TokenError::Expired)
            | AppError::Body(_)
            | AppError::Validation(_) => info!(error = %self, "Request rejected"),
            AppError::Address(_) => warn!(error = %self, "Request rejected"),
            AppError::Token(_) | AppError::Mail(_) => error!(error = %self, "Request failed"),
        }
        (StatusCode::BAD_REQUEST, "ERROR").into_response()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
