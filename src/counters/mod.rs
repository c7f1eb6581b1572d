mod handle;
mod local_store;
mod redis_store;

pub use handle::CounterStoreHandle;
pub use local_store::LocalCounterStore;
pub use redis_store::RedisCounterStore;

use async_trait::async_trait;

use crate::error::GatewayError;

/// Atomic integer counter with TTL, the abstraction the rate limiter and
/// usage recorder are built on. Two implementations exist behind this
/// contract: a networked counter service with native atomic increment, and
/// an in-process fallback with identical observable semantics.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increments `key` and returns the post-increment value.
    /// Creates the key at 1 if it was absent.
    async fn incr(&self, key: &str) -> Result<i64, GatewayError>;

    /// Sets the remaining TTL on `key`, in seconds. Idempotent.
    async fn expire(&self, key: &str, seconds: u64) -> Result<(), GatewayError>;
}
