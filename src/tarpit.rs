// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-client tarpit.
//!
//! Every call to [`Tarpit::wait`] from the same address adds one tick of
//! delay to the next call. A periodic sweep decays the counters once an
//! address has been quiet long enough, until it is forgotten entirely.

use crate::address::{resolve_address, AddressError, ClientInfo};
use crate::config::TarpitConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Penalty state of one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TarpitEntry {
    /// Pending penalty units; the next call sleeps this many ticks
    pub counter: u32,
    /// Decay starts only after this instant
    pub expires: Instant,
}

/// Escalating per-address delay.
pub struct Tarpit {
    tick: Duration,
    entries: RwLock<HashMap<String, TarpitEntry>>,
}

impl Tarpit {
    /// Create an empty tarpit. No decay runs until [`spawn_sweeper`](Self::spawn_sweeper).
    pub fn new(config: &TarpitConfig) -> Self {
        Self::with_tick(config.tick())
    }

    pub fn with_tick(tick: Duration) -> Self {
        Self {
            tick,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a shared tarpit and start its decay sweep.
    pub fn start(config: &TarpitConfig, shutdown: CancellationToken) -> (Arc<Self>, JoinHandle<()>) {
        let tarpit = Arc::new(Self::new(config));
        let handle = tarpit.spawn_sweeper(shutdown);
        (tarpit, handle)
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Delay the caller according to how often its address called before.
    ///
    /// Returns the delay that was served. Fails only if the client address
    /// cannot be resolved, in which case nothing is recorded.
    pub async fn wait(&self, client: &ClientInfo) -> Result<Duration, AddressError> {
        let ip = resolve_address(client)?;
        let delay = self.register(&ip).await;

        // Lock already released by register
        if !delay.is_zero() {
            debug!(%ip, delay_secs = delay.as_secs(), "Tarpitting client");
            tokio::time::sleep(delay).await;
        }
        Ok(delay)
    }

    /// Record one call from `ip` and return the delay it has earned.
    ///
    /// Concurrent callers for the same address may observe the same counter
    /// and serve equal delays; the bookkeeping itself is never lost.
    async fn register(&self, ip: &str) -> Duration {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(ip.to_string()).or_insert_with(|| TarpitEntry {
            counter: 0,
            expires: Instant::now(),
        });

        let sleep_units = entry.counter;
        entry.counter = entry.counter.saturating_add(1);
        entry.expires = Instant::now() + self.tick.saturating_mul(entry.counter);
        debug!(%ip, counter = entry.counter, "Incremented tarpit counter");

        self.tick.saturating_mul(sleep_units)
    }

    /// Decay every entry whose window has passed by one unit.
    ///
    /// Entries reaching zero are removed. Returns the number of entries touched.
    pub async fn decrement(&self) -> usize {
        let now = Instant::now();
        let mut touched = 0;
        let mut entries = self.entries.write().await;
        entries.retain(|ip, entry| {
            if now <= entry.expires {
                return true;
            }
            touched += 1;
            entry.counter = entry.counter.saturating_sub(1);
            if entry.counter == 0 {
                debug!(%ip, "Removed tarpit entry");
                false
            } else {
                debug!(%ip, counter = entry.counter, "Decremented tarpit counter");
                true
            }
        });
        touched
    }

    /// Current state for `ip`, if tracked.
    pub async fn entry(&self, ip: &str) -> Option<TarpitEntry> {
        self.entries.read().await.get(ip).copied()
    }

    /// Number of tracked addresses.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Run [`decrement`](Self::decrement) every tick until `shutdown` fires.
    pub fn spawn_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let tarpit = Arc::clone(self);
        tokio::spawn(async move {
            let period = tarpit.tick;
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("Tarpit sweeper stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        let started = Instant::now();
                        let decremented = tarpit.decrement().await;
                        if decremented > 0 {
                            info!(
                                decremented,
                                elapsed_us = started.elapsed().as_micros() as u64,
                                "Decayed tarpit entries"
                            );
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_secs(1);

    fn client(ip: &str) -> ClientInfo {
        ClientInfo::new(Some(ip.to_string()), "127.0.0.1:9000")
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_free() {
        let tarpit = Tarpit::with_tick(TICK);
        let start = Instant::now();

        let delay = tarpit.wait(&client("192.0.2.1")).await.unwrap();

        assert_eq!(delay, Duration::ZERO);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(tarpit.entry("192.0.2.1").await.map(|e| e.counter), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_escalates() {
        let tarpit = Tarpit::with_tick(TICK);
        let c = client("192.0.2.1");

        assert_eq!(tarpit.wait(&c).await.unwrap(), Duration::ZERO);
        assert_eq!(tarpit.wait(&c).await.unwrap(), TICK);
        assert_eq!(tarpit.wait(&c).await.unwrap(), TICK * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_extends_with_counter() {
        let tarpit = Tarpit::with_tick(TICK);
        let c = client("192.0.2.1");

        tarpit.wait(&c).await.unwrap();
        tarpit.wait(&c).await.unwrap();

        // Second call: slept 1 tick, set expires = now + 2 ticks before sleeping
        let entry = tarpit.entry("192.0.2.1").await.unwrap();
        assert_eq!(entry.counter, 2);
        assert_eq!(entry.expires, Instant::now() + tarpit.tick());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_address_is_not_tracked() {
        let tarpit = Tarpit::with_tick(TICK);
        let bad = ClientInfo::new(Some("garbage".into()), "127.0.0.1:1");

        assert!(tarpit.wait(&bad).await.is_err());
        assert!(tarpit.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decrement_skips_active_window() {
        let tarpit = Tarpit::with_tick(TICK);
        tarpit.wait(&client("192.0.2.1")).await.unwrap();

        // expires = now + 1 tick, not yet passed
        assert_eq!(tarpit.decrement().await, 0);
        assert_eq!(tarpit.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decrement_removes_at_zero() {
        let tarpit = Tarpit::with_tick(TICK);
        let c = client("192.0.2.1");
        tarpit.wait(&c).await.unwrap();
        tarpit.wait(&c).await.unwrap();

        tokio::time::advance(TICK * 2).await;
        assert_eq!(tarpit.decrement().await, 1);
        assert_eq!(tarpit.entry("192.0.2.1").await.map(|e| e.counter), Some(1));

        assert_eq!(tarpit.decrement().await, 1);
        assert!(tarpit.entry("192.0.2.1").await.is_none());
        assert_eq!(tarpit.decrement().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_addresses_are_independent() {
        let tarpit = Tarpit::with_tick(TICK);
        tarpit.wait(&client("192.0.2.1")).await.unwrap();

        let delay = tarpit.wait(&client("192.0.2.2")).await.unwrap();
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn test_tick_from_config() {
        let tarpit = Tarpit::new(&TarpitConfig { tick_secs: 7 });
        assert_eq!(tarpit.tick(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_on_cancel() {
        let shutdown = CancellationToken::new();
        let (tarpit, handle) = Tarpit::start(
            &TarpitConfig { tick_secs: 1 },
            shutdown.clone(),
        );
        tarpit.wait(&client("192.0.2.1")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(tarpit.is_empty().await, "sweeper should have decayed the entry");

        shutdown.cancel();
        handle.await.unwrap();
    }
}
