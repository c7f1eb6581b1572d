use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CounterStore;
use crate::error::GatewayError;

struct Bucket {
    count: i64,
    expires_at: Option<Instant>,
}

/// In-process fallback counter store, used for the process lifetime when the
/// remote counter service can't be reached at startup. A single write lock
/// guards the whole map, the same shape used elsewhere for per-IP rate
/// limiting buckets, sized for counter throughput rather than per-IP
/// cardinality.
///
/// A key whose TTL has elapsed is treated as absent and recreated at 1 on the
/// next increment, matching "creates with 0+1 if absent" for a key that has
/// expired rather than one that was never seen.
#[derive(Clone)]
pub struct LocalCounterStore {
    buckets: Arc<RwLock<HashMap<String, Bucket>>>,
}

impl LocalCounterStore {
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Drop buckets whose TTL has elapsed. Call periodically from a
    /// background task to bound memory; incr/expire are correct without it.
    pub async fn sweep(&self) {
        let mut buckets = self.buckets.write().await;
        let now = Instant::now();
        buckets.retain(|_key, bucket| match bucket.expires_at {
            Some(expires_at) => expires_at > now,
            None => true,
        });
    }

    /// Spawn a background task that periodically sweeps expired buckets.
    pub fn spawn_sweeper(self, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.sweep().await;
            }
        })
    }
}

impl Default for LocalCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for LocalCounterStore {
    async fn incr(&self, key: &str) -> Result<i64, GatewayError> {
        let now = Instant::now();
        let mut buckets = self.buckets.write().await;

        let expired = buckets
            .get(key)
            .map(|b| matches!(b.expires_at, Some(exp) if exp <= now))
            .unwrap_or(false);

        if expired {
            buckets.remove(key);
        }

        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            count: 0,
            expires_at: None,
        });
        bucket.count += 1;
        Ok(bucket.count)
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<(), GatewayError> {
        let mut buckets = self.buckets.write().await;
        if let Some(bucket) = buckets.get_mut(key) {
            bucket.expires_at = Some(Instant::now() + Duration::from_secs(seconds));
        }
        Ok(())
    }
}
