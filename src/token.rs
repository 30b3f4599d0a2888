// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Single-use, time-limited access tokens.
//!
//! A client must fetch a token before it may trigger a mail send. Tokens live
//! in memory only; a restart invalidates all of them.

use crate::config::TokenConfig;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Token store errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Random source unavailable: {0}")]
    RandomSource(#[from] rand::Error),

    #[error("Freshly generated token exists already in the store")]
    Collision,

    #[error("Token did not exist")]
    NotFound,

    #[error("Token already expired")]
    Expired,
}

/// 128 random bits identifying a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId([u8; 16]);

impl TokenId {
    /// Draw a fresh identifier from the operating system's CSPRNG.
    pub fn generate() -> Result<Self, TokenError> {
        let mut bytes = [0u8; 16];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

/// Uppercase hex grouped 8-4-4-4-12.
impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{}-{}-{}-{}-{}",
            hex::encode_upper(&b[0..4]),
            hex::encode_upper(&b[4..6]),
            hex::encode_upper(&b[6..8]),
            hex::encode_upper(&b[8..10]),
            hex::encode_upper(&b[10..16]),
        )
    }
}

/// An issued access token. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    id: TokenId,
    expires: DateTime<Utc>,
}

impl Token {
    fn new(id: TokenId, lifetime: Duration) -> Self {
        let now = Utc::now();
        let expires = chrono::Duration::from_std(lifetime)
            .ok()
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { id, expires }
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    /// The transport form, also used as the store key.
    pub fn key(&self) -> String {
        self.id.to_string()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

/// In-memory set of live tokens.
pub struct ActiveTokenStore {
    tokens: RwLock<HashMap<String, Token>>,
    lifetime: Duration,
    cleanup_interval: Duration,
}

impl ActiveTokenStore {
    /// Create an empty store. No sweep runs until [`spawn_sweeper`](Self::spawn_sweeper).
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            lifetime: config.lifetime(),
            cleanup_interval: config.cleanup_interval(),
        }
    }

    /// Create a shared store and start its periodic cleanup.
    pub fn start(config: &TokenConfig, shutdown: CancellationToken) -> (Arc<Self>, JoinHandle<()>) {
        let store = Arc::new(Self::new(config));
        let handle = store.spawn_sweeper(shutdown);
        (store, handle)
    }

    /// Issue a new token and record it as live.
    ///
    /// A collision is reported, never retried: at 128 bits it means the
    /// random source is broken.
    pub async fn new_token(&self) -> Result<Token, TokenError> {
        self.insert(TokenId::generate()?).await
    }

    /// Record a token for `id`; an existing live entry is left untouched.
    async fn insert(&self, id: TokenId) -> Result<Token, TokenError> {
        let token = Token::new(id, self.lifetime);
        let key = token.key();

        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&key) {
            return Err(TokenError::Collision);
        }
        tokens.insert(key, token.clone());
        debug!(expires = %token.expires, "Issued token");
        Ok(token)
    }

    /// Consume a token.
    ///
    /// The entry is removed before its expiry is checked, so a token can be
    /// presented at most once whatever the outcome.
    pub async fn validate(&self, key: &str) -> Result<(), TokenError> {
        let token = self
            .tokens
            .write()
            .await
            .remove(key)
            .ok_or(TokenError::NotFound)?;

        if token.is_expired_at(Utc::now()) {
            return Err(TokenError::Expired);
        }
        Ok(())
    }

    /// Drop every expired token; returns how many were removed.
    pub async fn clean(&self) -> usize {
        let now = Utc::now();
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| !token.is_expired_at(now));
        before - tokens.len()
    }

    /// Number of live (not yet swept) tokens.
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.tokens.read().await.contains_key(key)
    }

    /// Run [`clean`](Self::clean) every cleanup interval until `shutdown` fires.
    pub fn spawn_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let period = store.cleanup_interval;
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("Token sweeper stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        let deleted = store.clean().await;
                        if deleted > 0 {
                            info!(deleted, "Cleaned up expired tokens");
                        }
                    }
                }
            }
        })
    }
}
