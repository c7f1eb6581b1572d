use crate::counters::{CounterStore, CounterStoreHandle};
use crate::utils::time::minute_epoch;
use chrono::Utc;

/// Schedule a fire-and-forget usage increment. Must be called only for
/// requests that made it past auth and rate limiting (i.e. were actually
/// proxied, including upstream errors — the call was attempted on the
/// tenant's behalf). Never awaited by the caller: failures are logged and
/// swallowed, and the task holds no request-scoped resources beyond the
/// counter store handle, which is cheaply `Clone`.
pub fn record(counters: CounterStoreHandle, tenant_id: i64, api_id: i64) {
    tokio::spawn(async move {
        let minute = minute_epoch(Utc::now());
        let key = format!("usage:{tenant_id}:{api_id}:{minute}");
        if let Err(err) = counters.incr(&key).await {
            tracing::warn!("usage recorder: failed to increment {key}: {err}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::LocalCounterStore;

    #[tokio::test]
    async fn schedules_one_increment_per_call() {
        let counters = CounterStoreHandle::Local(LocalCounterStore::new());
        record(counters.clone(), 1, 2);

        // Give the spawned task a chance to run.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let minute = minute_epoch(Utc::now());
        let key = format!("usage:1:2:{minute}");
        // A second incr observes 2, proving the first one landed.
        assert_eq!(counters.incr(&key).await.unwrap(), 2);
    }
}
