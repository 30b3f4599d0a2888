// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for abuse simulation.

use mailbridge::address::ClientInfo;
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// A client seen directly, without a proxy in front.
pub fn direct_client(ip: IpAddr, port: u16) -> ClientInfo {
    ClientInfo::new(None, std::net::SocketAddr::new(ip, port).to_string())
}

/// A client seen through a reverse proxy at 127.0.0.1.
pub fn proxied_client(ip: IpAddr) -> ClientInfo {
    ClientInfo::new(Some(ip.to_string()), "127.0.0.1:40000")
}

/// Header values that must never be accepted as a client address.
pub fn generate_malformed_forwarded_for() -> Vec<&'static str> {
    vec![
        "not-an-ip",
        "256.1.1.1",
        "1.2.3",
        "192.168.1.1:8080",
        "unknown",
        "::gg",
        "example.com",
        "<script>",
    ]
}
