// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client address resolution.
//!
//! The tarpit buckets callers by the string this module produces, so the same
//! client must always map to the same canonical form.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

/// Header set by reverse proxies; takes precedence over the peer address.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Address resolution errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Could not parse client IP: {0:?}")]
    Parse(String),
}

/// The address-bearing part of an incoming request.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    /// Value of the forwarded-for header, if any
    pub forwarded_for: Option<String>,
    /// Transport peer address, `ip:port`
    pub peer_addr: String,
}

impl ClientInfo {
    pub fn new(forwarded_for: Option<String>, peer_addr: impl Into<String>) -> Self {
        Self {
            forwarded_for,
            peer_addr: peer_addr.into(),
        }
    }

    /// Build from request headers and the connection's peer address.
    pub fn from_parts(headers: &HeaderMap, peer: SocketAddr) -> Self {
        let forwarded_for = headers
            .get(FORWARDED_FOR)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
        Self::new(forwarded_for, peer.to_string())
    }
}

/// Resolve the canonical client IP for a request.
///
/// A non-empty forwarded-for header wins; when it carries a proxy chain the
/// first (client-most) hop is used. Otherwise the port is stripped from the
/// peer address. Whatever is chosen must parse as an IP literal.
pub fn resolve_address(client: &ClientInfo) -> Result<String, AddressError> {
    let forwarded = client
        .forwarded_for
        .as_deref()
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let ip = match forwarded {
        Some(value) => value
            .parse::<IpAddr>()
            .map_err(|_| AddressError::Parse(value.to_string()))?,
        None => client
            .peer_addr
            .parse::<SocketAddr>()
            .map(|addr| addr.ip())
            .map_err(|_| AddressError::Parse(client.peer_addr.clone()))?,
    };

    // IPv4-mapped IPv6 collapses to plain IPv4
    Ok(ip.to_canonical().to_string())
}
