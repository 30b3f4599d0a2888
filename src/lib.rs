// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mail Bridge
//!
//! A small HTTP front for an SMTP relay, guarded by two in-memory defences:
//!
//! - Single-use, time-limited access tokens required to send mail
//! - A per-client tarpit that slows down repeated token requests
//!
//! All state lives in memory and is lost on restart.

pub mod address;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod metrics;
pub mod tarpit;
pub mod token;
pub mod validator;

pub use address::{resolve_address, AddressError, ClientInfo};
pub use config::Config;
pub use tarpit::{Tarpit, TarpitEntry};
pub use token::{ActiveTokenStore, Token, TokenError, TokenId};
