use async_trait::async_trait;
use redis::AsyncCommands;

use super::CounterStore;
use crate::error::GatewayError;

/// Counter store backed by a remote Redis-compatible service. Wraps a
/// `ConnectionManager`, which multiplexes a single connection across
/// concurrent callers and reconnects transparently — the same connection
/// type the rest of the ambient stack uses for caching.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisCounterStore {
    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr(&self, key: &str) -> Result<i64, GatewayError> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<(), GatewayError> {
        let mut conn = self.conn.clone();
        let _: () = conn.expire(key, seconds as i64).await?;
        Ok(())
    }
}
