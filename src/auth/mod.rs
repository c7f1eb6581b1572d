use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

use crate::error::GatewayError;
use crate::models::Plan;
use crate::registry::RegistryClient;

/// The subject whose quotas are consumed: the client row id if `X-Client-ID`
/// was supplied, else the api key id. Two requests with the same key, one
/// with and one without `X-Client-ID`, charge separate buckets — this enum
/// makes that switch a compile-time-checked choice rather than an `Option`
/// every caller has to re-interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitIdentity {
    Key(i64),
    Client(i64),
}

impl RateLimitIdentity {
    /// The counter-store key prefix for this identity, per spec §3:
    /// `rate_limit:{key_id}` or `rate_limit_client:{client_row_id}`.
    pub fn key_prefix(&self) -> String {
        match self {
            RateLimitIdentity::Key(id) => format!("rate_limit:{id}"),
            RateLimitIdentity::Client(id) => format!("rate_limit_client:{id}"),
        }
    }
}

/// Everything the rest of the pipeline needs once a request has been
/// authenticated and its plan resolved.
#[derive(Debug, Clone)]
pub struct ResolvedAuth {
    pub tenant_id: i64,
    pub api_id: i64,
    pub upstream_base_url: String,
    pub rate_limit_identity: RateLimitIdentity,
    pub active_plan: Plan,
}

/// SHA-256 hex digest of the raw API key, lowercase, used for registry
/// lookup. Stable across processes — the same key always hashes the same.
pub fn sha256_hex(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    format!("{digest:x}")
}

/// Resolve `(tenant_slug, api_slug, X-API-Key, optional X-Client-ID)` into a
/// `ResolvedAuth`, or the first failure encountered, per spec §4.2. Every
/// step short-circuits: a 401/404/403 here means no later step (and no
/// rate-limit bucket) is ever touched.
pub async fn resolve(
    registry: &RegistryClient,
    headers: &HeaderMap,
    tenant_slug: &str,
    api_slug: &str,
) -> Result<ResolvedAuth, GatewayError> {
    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or(GatewayError::MissingApiKey)?;

    let hashed_key = sha256_hex(api_key);

    let tenant = registry
        .find_active_tenant_by_slug(tenant_slug)
        .await?
        .ok_or(GatewayError::TenantNotFound)?;

    let api = registry
        .find_active_api_by_slug(tenant.id, api_slug)
        .await?
        .ok_or(GatewayError::ApiNotFound)?;

    // Tenant-scoped lookup: a key valid for tenant A never matches when the
    // request addresses tenant B's api, even with the identical raw key.
    let key_record = registry
        .find_active_api_key_by_hash(tenant.id, &hashed_key)
        .await?
        .ok_or(GatewayError::InvalidApiKey)?;

    let client_id_header = headers
        .get("x-client-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty());

    let (rate_limit_identity, plan_id) = if let Some(client_id) = client_id_header {
        let client = registry
            .find_client_by_client_id(tenant.id, client_id)
            .await?
            .ok_or(GatewayError::InvalidClientId)?;
        (RateLimitIdentity::Client(client.id), client.plan_id)
    } else {
        (RateLimitIdentity::Key(key_record.id), key_record.plan_id)
    };

    let active_plan = registry
        .find_plan(plan_id)
        .await?
        .filter(|plan| plan.is_active)
        .ok_or(GatewayError::PlanInvalid)?;

    Ok(ResolvedAuth {
        tenant_id: tenant.id,
        api_id: api.id,
        upstream_base_url: api.upstream_base_url,
        rate_limit_identity,
        active_plan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_pool;
    use axum::http::HeaderValue;

    async fn seed(pool: &sqlx::SqlitePool) {
        sqlx::query("INSERT INTO tenants_tenant (id, slug, is_active) VALUES (1, 'acme', 1), (2, 'other', 1)")
            .execute(pool).await.unwrap();
        sqlx::query("INSERT INTO apis_api (id, tenant_id, slug, upstream_base_url, is_active) VALUES (1, 1, 'echo', 'https://upstream.example/', 1)")
            .execute(pool).await.unwrap();
        sqlx::query("INSERT INTO billing_plan (id, requests_per_minute, requests_per_month, is_active) VALUES (1, 60, NULL, 1), (2, 1, NULL, 1), (3, 60, NULL, 0)")
            .execute(pool).await.unwrap();
        let hashed = sha256_hex("secret-key");
        sqlx::query("INSERT INTO apis_apikey (id, tenant_id, plan_id, hashed_key, is_active) VALUES (1, 1, 1, ?, 1)")
            .bind(&hashed)
            .execute(pool).await.unwrap();
        sqlx::query("INSERT INTO apis_client (id, tenant_id, plan_id, client_id) VALUES (1, 1, 2, 'c-1')")
            .execute(pool).await.unwrap();
    }

    fn headers_with(api_key: Option<&str>, client_id: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(k) = api_key {
            headers.insert("x-api-key", HeaderValue::from_str(k).unwrap());
        }
        if let Some(c) = client_id {
            headers.insert("x-client-id", HeaderValue::from_str(c).unwrap());
        }
        headers
    }

    #[tokio::test]
    async fn missing_key_is_401() {
        let pool = test_pool().await;
        seed(&pool).await;
        let registry = RegistryClient::new(pool);

        let err = resolve(&registry, &headers_with(None, None), "acme", "echo")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingApiKey));
    }

    #[tokio::test]
    async fn happy_path_resolves_key_identity() {
        let pool = test_pool().await;
        seed(&pool).await;
        let registry = RegistryClient::new(pool);

        let resolved = resolve(
            &registry,
            &headers_with(Some("secret-key"), None),
            "acme",
            "echo",
        )
        .await
        .unwrap();

        assert_eq!(resolved.tenant_id, 1);
        assert_eq!(resolved.api_id, 1);
        assert_eq!(resolved.rate_limit_identity, RateLimitIdentity::Key(1));
        assert_eq!(resolved.active_plan.requests_per_minute, 60);
    }

    #[tokio::test]
    async fn client_header_overrides_plan_and_identity() {
        let pool = test_pool().await;
        seed(&pool).await;
        let registry = RegistryClient::new(pool);

        let resolved = resolve(
            &registry,
            &headers_with(Some("secret-key"), Some("c-1")),
            "acme",
            "echo",
        )
        .await
        .unwrap();

        assert_eq!(resolved.rate_limit_identity, RateLimitIdentity::Client(1));
        assert_eq!(resolved.active_plan.requests_per_minute, 1);
    }

    #[tokio::test]
    async fn key_scoped_to_wrong_tenant_is_forbidden() {
        let pool = test_pool().await;
        seed(&pool).await;
        sqlx::query("INSERT INTO apis_api (id, tenant_id, slug, upstream_base_url, is_active) VALUES (2, 2, 'echo', 'https://upstream.example/', 1)")
            .execute(&pool).await.unwrap();
        let registry = RegistryClient::new(pool);

        let err = resolve(
            &registry,
            &headers_with(Some("secret-key"), None),
            "other",
            "echo",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidApiKey));
    }

    #[tokio::test]
    async fn unknown_client_id_is_forbidden() {
        let pool = test_pool().await;
        seed(&pool).await;
        let registry = RegistryClient::new(pool);

        let err = resolve(
            &registry,
            &headers_with(Some("secret-key"), Some("nope")),
            "acme",
            "echo",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidClientId));
    }

    #[test]
    fn sha256_hex_is_stable_and_lowercase() {
        let h1 = sha256_hex("abc");
        let h2 = sha256_hex("abc");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
