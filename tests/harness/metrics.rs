// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Delay metrics collected during abuse simulation.

use std::collections::HashMap;
use std::time::Duration;

/// Collects tarpit delays per client address.
#[derive(Debug, Default)]
pub struct DelayMetrics {
    /// Delays served, in call order, by address
    delays_per_ip: HashMap<String, Vec<Duration>>,
    /// Calls rejected before being tarpitted
    rejected: usize,
}

impl DelayMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a served delay.
    pub fn record(&mut self, ip: &str, delay: Duration) {
        self.delays_per_ip.entry(ip.to_string()).or_default().push(delay);
    }

    /// Record a rejected call.
    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    /// Merge another collector into this one.
    pub fn merge(&mut self, other: DelayMetrics) {
        for (ip, delays) in other.delays_per_ip {
            self.delays_per_ip.entry(ip).or_default().extend(delays);
        }
        self.rejected += other.rejected;
    }

    /// Get total request count.
    pub fn total_requests(&self) -> usize {
        self.delays_per_ip.values().map(Vec::len).sum::<usize>() + self.rejected
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Get number of unique IPs that were tarpitted.
    pub fn unique_ips(&self) -> usize {
        self.delays_per_ip.len()
    }

    /// Delays served to one address, in call order.
    pub fn delays(&self, ip: &str) -> &[Duration] {
        self.delays_per_ip.get(ip).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sum of delays served to one address.
    pub fn total_delay(&self, ip: &str) -> Duration {
        self.delays(ip).iter().sum()
    }

    /// Longest single delay served to anyone.
    pub fn max_delay(&self) -> Duration {
        self.delays_per_ip
            .values()
            .flatten()
            .copied()
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

impl std::fmt::Display for DelayMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Tarpit Delay Report ===")?;
        writeln!(f, "Total Requests:    {}", self.total_requests())?;
        writeln!(f, "Rejected:          {}", self.rejected)?;
        writeln!(f, "Unique IPs:        {}", self.unique_ips())?;
        writeln!(f, "Max Delay:         {:?}", self.max_delay())?;
        Ok(())
    }
}
