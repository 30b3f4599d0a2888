// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outgoing mail over SMTP.
//!
//! Clients address mail by recipient id only; the real address comes from the
//! configured recipient map, so the bridge cannot be used as an open relay.

use crate::config::{SmtpConfig, TlsMode};
use async_trait::async_trait;
use lettre::message::{Mailbox, Message, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

/// Mail delivery errors.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("No email for recipient id {0:?}")]
    UnknownRecipient(String),

    #[error("Invalid address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// A mail as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub recipient_id: String,
    pub subject: String,
    pub body: String,
}

/// Anything that can deliver an [`EmailMessage`].
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: EmailMessage) -> Result<(), MailError>;
}

/// Look up the real address behind a recipient id.
pub fn resolve_recipient<'a>(
    recipients: &'a HashMap<String, String>,
    recipient_id: &str,
) -> Result<&'a str, MailError> {
    recipients
        .get(recipient_id)
        .map(String::as_str)
        .ok_or_else(|| MailError::UnknownRecipient(recipient_id.to_string()))
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|source| MailError::InvalidAddress {
        address: address.to_string(),
        source,
    })
}

/// Build the RFC 5322 message for `mail` addressed to `to`.
pub fn build_message(mail: &EmailMessage, to: &str) -> Result<Message, MailError> {
    let message = Message::builder()
        .from(parse_mailbox(&mail.from)?)
        .to(parse_mailbox(to)?)
        .date_now()
        .subject(mail.subject.as_str())
        .singlepart(SinglePart::plain(mail.body.clone()))?;
    Ok(message)
}

/// SMTP delivery through the configured relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    recipients: HashMap<String, String>,
}

impl SmtpMailer {
    pub fn new(
        config: &SmtpConfig,
        recipients: HashMap<String, String>,
    ) -> Result<Self, MailError> {
        let tls = match config.tls_mode {
            TlsMode::None => Tls::None,
            TlsMode::Starttls => Tls::Required(TlsParameters::new(config.host.clone())?),
            TlsMode::Tls => Tls::Wrapper(TlsParameters::new(config.host.clone())?),
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .timeout(Some(config.timeout()))
            .tls(tls);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            recipients,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: EmailMessage) -> Result<(), MailError> {
        let to = resolve_recipient(&self.recipients, &mail.recipient_id)?;
        let message = build_message(&mail, to)?;

        match self.transport.send(message).await {
            Ok(response) => {
                info!(to = %to, code = %response.code(), "Mail sent");
                Ok(())
            }
            Err(e) => {
                warn!(to = %to, error = %e, "Failed to send mail");
                Err(MailError::Smtp(e))
            }
        }
    }
}
