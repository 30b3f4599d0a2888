// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Service metrics, registered on a private registry.
pub struct Metrics {
    registry: Registry,
    pub tokens_issued: IntCounter,
    pub token_validations: IntCounterVec,
    pub mails_sent: IntCounterVec,
    pub tarpit_delay: Histogram,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("mailbridge".to_string()), None)?;

        let tokens_issued = IntCounter::new("tokens_issued_total", "Access tokens issued")?;
        let token_validations = IntCounterVec::new(
            Opts::new("token_validations_total", "Token validations by outcome"),
            &["outcome"],
        )?;
        let mails_sent = IntCounterVec::new(
            Opts::new("mails_sent_total", "Mail send attempts by outcome"),
            &["outcome"],
        )?;
        let tarpit_delay = Histogram::with_opts(
            HistogramOpts::new("tarpit_delay_seconds", "Delay imposed by the tarpit")
                .buckets(vec![0.0, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        )?;

        registry.register(Box::new(tokens_issued.clone()))?;
        registry.register(Box::new(token_validations.clone()))?;
        registry.register(Box::new(mails_sent.clone()))?;
        registry.register(Box::new(tarpit_delay.clone()))?;

        Ok(Self {
            registry,
            tokens_issued,
            token_validations,
            mails_sent,
            tarpit_delay,
        })
    }

    /// Render all metrics in the text exposition format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
