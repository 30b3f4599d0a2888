// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mailer doubles for the HTTP tests.

use async_trait::async_trait;
use mailbridge::mail::{EmailMessage, MailError, Mailer};
use std::sync::Mutex;

/// Records every mail instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: EmailMessage) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

/// Rejects every mail as addressed to an unknown recipient.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, mail: EmailMessage) -> Result<(), MailError> {
        Err(MailError::UnknownRecipient(mail.recipient_id))
    }
}
