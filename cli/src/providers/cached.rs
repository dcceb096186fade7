use super::{MarketDataProvider, ProviderError};
use crate::models::OhlcvRow;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

type CacheKey = (String, NaiveDate, NaiveDate);

struct CacheEntry {
    stored_at: Instant,
    rows: Vec<OhlcvRow>,
}

/// Memoizes successful fetches of an inner provider for `ttl`.
///
/// Failures are never cached. The lock is released before the inner fetch runs.
pub struct CachedProvider {
    inner: Arc<dyn MarketDataProvider>,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn MarketDataProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

// Drop entries older than `ttl`; returns how many went
fn evict_expired(entries: &mut HashMap<CacheKey, CacheEntry>, ttl: Duration) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    before - entries.len()
}

#[async_trait]
impl MarketDataProvider for CachedProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvRow>, ProviderError> {
        let key = (symbol.to_string(), start, end);

        {
            let entries = self.entries.lock().await;
            if let Some(entry) = entries.get(&key) {
                let age = entry.stored_at.elapsed();
                if age < self.ttl {
                    debug!(symbol, age_secs = age.as_secs(), "Cache hit");
                    return Ok(entry.rows.clone());
                }
                debug!(symbol, age_secs = age.as_secs(), ttl_secs = self.ttl.as_secs(), "Cache expired");
            }
        }

        let rows = self.inner.fetch(symbol, start, end).await?;

        let mut entries = self.entries.lock().await;
        let evicted = evict_expired(&mut entries, self.ttl);
        if evicted > 0 {
            debug!(evicted, remaining = entries.len(), "Evicted expired cache entries");
        }
        entries.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                rows: rows.clone(),
            },
        );
        Ok(rows)
    }
}
