//! Time-bounded web search cache.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Source of the current time, injectable so expiry can be tested.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One cached search. `result_text == None` records a search that found nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub timestamp: DateTime<Utc>,
    pub result_text: Option<String>,
}

/// Process-wide cache keyed by exact query text. Never persisted.
#[derive(Debug)]
pub struct SearchCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl SearchCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// A fresh entry for `query`, if any. Expired entries are evicted.
    ///
    /// The outer `Option` is hit/miss; the inner one is the cached result,
    /// which may itself be "no results".
    pub async fn get(&self, query: &str) -> Option<Option<String>> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(query)?;

        if self.clock.now() - entry.timestamp < self.ttl {
            return Some(entry.result_text.clone());
        }

        tracing::info!("Cached web results for '{}' expired", query);
        entries.remove(query);
        None
    }

    /// Store `result_text` for `query`, sweeping out every expired entry.
    pub async fn insert(&self, query: &str, result_text: Option<String>) {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;

        let before = entries.len();
        entries.retain(|_, entry| now - entry.timestamp < self.ttl);
        if entries.len() < before {
            tracing::debug!(evicted = before - entries.len(), "Swept expired web results");
        }

        entries.insert(
            query.to_string(),
            CacheEntry {
                timestamp: now,
                result_text,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
