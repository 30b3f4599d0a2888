// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Abuse patterns against the token endpoint.

use std::time::Duration;

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Number of unique client addresses
    pub unique_ips: usize,
    /// Token requests each address sends back to back
    pub requests_per_ip: usize,
    /// Whether clients arrive through a proxy header
    pub via_proxy: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            unique_ips: 1,
            requests_per_ip: 5,
            via_proxy: true,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// Single IP hammering the endpoint.
    pub fn single_ip_flood() -> Self {
        Self {
            unique_ips: 1,
            requests_per_ip: 10,
            ..Default::default()
        }
    }

    /// Many IPs, a few requests each, all at once.
    pub fn distributed_attack() -> Self {
        Self {
            unique_ips: 50,
            requests_per_ip: 5,
            ..Default::default()
        }
    }

    /// Direct connections, one per address.
    pub fn one_shot_crowd() -> Self {
        Self {
            unique_ips: 100,
            requests_per_ip: 1,
            via_proxy: false,
        }
    }

    /// Delay one address accumulates over its requests: 0 + 1 + ... + (n-1) ticks.
    pub fn expected_delay_per_ip(&self, tick: Duration) -> Duration {
        let n = self.requests_per_ip as u32;
        tick * (n * n.saturating_sub(1) / 2)
    }
}
