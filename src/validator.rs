// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Send request validator.
//!
//! Checks presence of every field a send request needs. Address syntax is
//! left to the mailer, which has to parse it anyway.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Request is valid
    Valid,
    /// Request is invalid
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid(e) => Err(e),
        }
    }
}

/// Body accepted by the send endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendMailRequest {
    #[serde(rename = "Token", default)]
    pub token: String,
    #[serde(rename = "From", default)]
    pub from: String,
    /// Recipient id, resolved against the configured recipient map
    #[serde(rename = "To", default)]
    pub to: String,
    #[serde(rename = "Subject", default)]
    pub subject: String,
    #[serde(rename = "Body", default)]
    pub body: String,
}

impl SendMailRequest {
    /// Report every empty field at once.
    pub fn validate(&self) -> ValidationResult {
        let missing: Vec<&'static str> = [
            ("Token", &self.token),
            ("From", &self.from),
            ("To", &self.to),
            ("Subject", &self.subject),
            ("Body", &self.body),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            ValidationResult::Valid
        } else {
            debug!(?missing, "Send request incomplete");
            ValidationResult::Invalid(ValidationError::MissingFields(missing))
        }
    }
}
