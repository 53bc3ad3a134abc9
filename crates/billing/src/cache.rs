use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use billchat_core::BillingPeriod;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_PAYMENT_WINDOW: Duration = Duration::from_secs(300);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PaymentKey(String);

impl PaymentKey {
    pub fn new(subscriber_no: &str, period: BillingPeriod) -> Self {
        Self(format!("{subscriber_no}-{period}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedPayment {
    pub subscriber_no: String,
    pub period: BillingPeriod,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub recorded_at: DateTime<Utc>,
}

impl CachedPayment {
    pub fn key(&self) -> PaymentKey {
        PaymentKey::new(&self.subscriber_no, self.period)
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let Ok(window) = chrono::Duration::from_std(window) else {
            return true;
        };
        now.signed_duration_since(self.recorded_at) < window
    }
}

/// Volatile overlay of payments completed within the freshness window.
///
/// Freshness is checked on every read; the eviction task spawned by
/// [`PaymentCache::record`] only keeps the map from growing.
#[derive(Clone)]
pub struct PaymentCache {
    entries: Arc<Mutex<HashMap<PaymentKey, CachedPayment>>>,
    window: Duration,
}

impl Default for PaymentCache {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENT_WINDOW)
    }
}

impl PaymentCache {
    pub fn new(window: Duration) -> Self {
        Self { entries: Arc::new(Mutex::new(HashMap::new())), window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Stores the payment and schedules a sweep at the window boundary.
    ///
    /// The sweep only drops entries that are stale by then, so a newer payment
    /// for the same key survives it. Must be called from within a tokio runtime.
    pub async fn record(&self, payment: CachedPayment) {
        let key = payment.key();
        self.insert(payment).await;

        let cache = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(cache.window()).await;
            let removed = cache.evict_stale_at(Utc::now()).await;
            debug!(
                event_name = "billing.cache.evicted",
                key = %key,
                removed,
                "payment cache sweep finished"
            );
        });
    }

    pub async fn insert(&self, payment: CachedPayment) {
        self.entries.lock().await.insert(payment.key(), payment);
    }

    pub async fn fresh(&self, key: &PaymentKey) -> Option<CachedPayment> {
        self.fresh_at(key, Utc::now()).await
    }

    /// Returns the entry only if it is still inside the window at `now`.
    /// A stale entry found here is dropped.
    pub async fn fresh_at(&self, key: &PaymentKey, now: DateTime<Utc>) -> Option<CachedPayment> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_fresh_at(now, self.window) => Some(entry.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn evict_stale_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh_at(now, self.window));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
