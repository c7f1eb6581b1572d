use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use super::{CounterStore, LocalCounterStore, RedisCounterStore};
use crate::error::GatewayError;

/// The counter store selected at startup, held as a concrete enum rather
/// than a trait object so the per-request hot path avoids dynamic dispatch.
#[derive(Clone)]
pub enum CounterStoreHandle {
    Remote(RedisCounterStore),
    Local(LocalCounterStore),
}

impl CounterStoreHandle {
    /// Probe the remote counter store with a bounded-latency PING. If it
    /// answers in time, the remote implementation is used for the process
    /// lifetime. Otherwise this is a fail-open for counter *availability*:
    /// quotas are still enforced, just not shared across replicas.
    pub async fn connect(redis_url: &str, probe_timeout: Duration) -> Self {
        let probe = async {
            let client = redis::Client::open(redis_url)?;
            let mut conn = client.get_connection_manager().await?;
            let _: String = conn.ping().await?;
            Ok::<_, redis::RedisError>(conn)
        };

        match tokio::time::timeout(probe_timeout, probe).await {
            Ok(Ok(conn)) => {
                tracing::info!("counter store: connected to redis at {}", redis_url);
                CounterStoreHandle::Remote(RedisCounterStore::new(conn))
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    "counter store: redis unreachable ({}), falling back to in-process store",
                    err
                );
                CounterStoreHandle::Local(LocalCounterStore::new())
            }
            Err(_) => {
                tracing::warn!(
                    "counter store: redis probe timed out after {:?}, falling back to in-process store",
                    probe_timeout
                );
                CounterStoreHandle::Local(LocalCounterStore::new())
            }
        }
    }

    /// Which backend is actually serving counters right now. Surfaced on the
    /// health endpoint so operators can tell a fail-open fallback apart from
    /// an intentional local deployment.
    pub fn mode(&self) -> &'static str {
        match self {
            CounterStoreHandle::Remote(_) => "redis",
            CounterStoreHandle::Local(_) => "local",
        }
    }
}

#[async_trait]
impl CounterStore for CounterStoreHandle {
    async fn incr(&self, key: &str) -> Result<i64, GatewayError> {
        match self {
            CounterStoreHandle::Remote(store) => store.incr(key).await,
            CounterStoreHandle::Local(store) => store.incr(key).await,
        }
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<(), GatewayError> {
        match self {
            CounterStoreHandle::Remote(store) => store.expire(key, seconds).await,
            CounterStoreHandle::Local(store) => store.expire(key, seconds).await,
        }
    }
}
