use chrono::{DateTime, Utc};

use crate::auth::RateLimitIdentity;
use crate::counters::{CounterStore, CounterStoreHandle};
use crate::error::GatewayError;
use crate::models::Plan;
use crate::utils::time::{minute_epoch, month_label};

const MONTH_TTL_SECS: u64 = 60 * 60 * 24 * 32;

/// Enforce the per-minute and, if the plan has one, per-month quota for
/// `identity`. Per-minute is always checked; per-month only when
/// `plan.requests_per_month` is set. Per-minute is checked first, so if both
/// would be exceeded the per-minute 429 is what the caller sees.
///
/// A rejected request still consumed its increment — by design, not a bug:
/// simpler and bounded-overcount beats the complexity of an undo on reject.
///
/// A counter-store error mid-request is fail-open: the check is logged and
/// treated as passing, rather than denying service for an infrastructure
/// hiccup. This only applies once a store is connected; the initial
/// redis-vs-local selection at startup is a separate, one-time decision.
pub async fn check(
    counters: &CounterStoreHandle,
    identity: RateLimitIdentity,
    plan: &Plan,
    now: DateTime<Utc>,
) -> Result<(), GatewayError> {
    let prefix = identity.key_prefix();

    let minute_key = format!("{prefix}:{}", minute_epoch(now));
    match incr_and_seed_ttl(counters, &minute_key, 60).await {
        Ok(count) if count > plan.requests_per_minute => {
            return Err(GatewayError::RateLimited { monthly: false });
        }
        Ok(_) => {}
        Err(err) => {
            tracing::warn!("counter store incr failed for {minute_key}, failing open: {err}");
        }
    }

    if let Some(monthly_limit) = plan.requests_per_month {
        let month_key = format!("{prefix}:month:{}", month_label(now));
        match incr_and_seed_ttl(counters, &month_key, MONTH_TTL_SECS).await {
            Ok(count) if count > monthly_limit => {
                return Err(GatewayError::RateLimited { monthly: true });
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("counter store incr failed for {month_key}, failing open: {err}");
            }
        }
    }

    Ok(())
}

/// Increment `key`, seeding its TTL the first time the window is touched.
/// A race where two requests both observe count==1 is harmless: `expire` is
/// idempotent.
async fn incr_and_seed_ttl(
    counters: &CounterStoreHandle,
    key: &str,
    ttl_secs: u64,
) -> Result<i64, GatewayError> {
    let count = counters.incr(key).await?;
    if count == 1 {
        counters.expire(key, ttl_secs).await?;
    }
    Ok(count)
}
