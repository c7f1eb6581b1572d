use sqlx::SqlitePool;

use crate::error::GatewayError;
use crate::models::{Api, ApiKey, Client, Plan, Tenant};

/// Read-only access to the shared registry tables (tenants, apis, api keys,
/// plans, clients). The control plane owns writes to this schema; this
/// client only ever selects.
#[derive(Clone)]
pub struct RegistryClient {
    pool: SqlitePool,
}

impl RegistryClient {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn find_active_tenant_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Tenant>, GatewayError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT id, slug, is_active FROM tenants_tenant WHERE slug = ? AND is_active = 1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    pub async fn find_active_api_by_slug(
        &self,
        tenant_id: i64,
        slug: &str,
    ) -> Result<Option<Api>, GatewayError> {
        let api = sqlx::query_as::<_, Api>(
            r#"
            SELECT id, tenant_id, slug, upstream_base_url, is_active
            FROM apis_api
            WHERE tenant_id = ? AND slug = ? AND is_active = 1
            "#,
        )
        .bind(tenant_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(api)
    }

    pub async fn find_active_api_key_by_hash(
        &self,
        tenant_id: i64,
        hashed_key: &str,
    ) -> Result<Option<ApiKey>, GatewayError> {
        let key = sqlx::query_as::<_, ApiKey>(
            r#"
            SELECT id, tenant_id, plan_id, hashed_key, is_active
            FROM apis_apikey
            WHERE hashed_key = ? AND tenant_id = ? AND is_active = 1
            "#,
        )
        .bind(hashed_key)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(key)
    }

    pub async fn find_client_by_client_id(
        &self,
        tenant_id: i64,
        client_id: &str,
    ) -> Result<Option<Client>, GatewayError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, tenant_id, plan_id, client_id
            FROM apis_client
            WHERE client_id = ? AND tenant_id = ?
            "#,
        )
        .bind(client_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    pub async fn find_plan(&self, plan_id: i64) -> Result<Option<Plan>, GatewayError> {
        let plan = sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, requests_per_minute, requests_per_month, is_active
            FROM billing_plan
            WHERE id = ?
            "#,
        )
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();

    sqlx::query(
        r#"
        CREATE TABLE tenants_tenant (
            id INTEGER PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            is_active INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE apis_api (
            id INTEGER PRIMARY KEY,
            tenant_id INTEGER NOT NULL,
            slug TEXT NOT NULL,
            upstream_base_url TEXT NOT NULL,
            is_active INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE billing_plan (
            id INTEGER PRIMARY KEY,
            requests_per_minute INTEGER NOT NULL,
            requests_per_month INTEGER,
            is_active INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE apis_apikey (
            id INTEGER PRIMARY KEY,
            tenant_id INTEGER NOT NULL,
            plan_id INTEGER NOT NULL,
            hashed_key TEXT NOT NULL UNIQUE,
            is_active INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE apis_client (
            id INTEGER PRIMARY KEY,
            tenant_id INTEGER NOT NULL,
            plan_id INTEGER NOT NULL,
            client_id TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    pool
}
