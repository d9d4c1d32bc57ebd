use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::store::KeyValueStore;

const TOKEN_KEY: &str = "eligibility_token";
const EXPIRY_KEY: &str = "eligibility_token_expiry";

/// Source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests.
#[derive(Clone, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn at(millis: i64) -> Self {
        Self(Arc::new(AtomicI64::new(millis)))
    }

    pub fn advance_millis(&self, delta: i64) {
        self.0.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Bearer token plus absolute expiry, kept in a [`KeyValueStore`].
///
/// Entries are never deleted. A stale token simply stops being returned
/// by [`read_valid`](TokenCache::read_valid).
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl TokenCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn save(&self, token: &str, expires_in_secs: u64) {
        let lifetime_ms = i64::try_from(expires_in_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        let expiry = self.clock.now_millis().saturating_add(lifetime_ms);

        if let Err(e) = self.store.set(TOKEN_KEY, token).await {
            tracing::warn!(error = %e, "failed to persist token");
            return;
        }
        if let Err(e) = self.store.set(EXPIRY_KEY, &expiry.to_string()).await {
            tracing::warn!(error = %e, "failed to persist token expiry");
            return;
        }
        tracing::debug!(expires_at_ms = expiry, "token cached");
    }

    /// The stored token, if both entries exist and `now <= expiry`.
    pub async fn read_valid(&self) -> Option<String> {
        let token = self.store.get(TOKEN_KEY).await.filter(|t| !t.is_empty())?;
        let expiry: i64 = self.store.get(EXPIRY_KEY).await?.trim().parse().ok()?;

        if self.clock.now_millis() > expiry {
            return None;
        }
        Some(token)
    }

    /// Mark the stored token unusable by overwriting its expiry.
    pub async fn invalidate(&self) {
        if let Err(e) = self.store.set(EXPIRY_KEY, "0").await {
            tracing::warn!(error = %e, "failed to invalidate cached token");
        }
    }
}
