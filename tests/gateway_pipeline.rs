//! End-to-end exercise of the full auth -> rate-limit -> proxy pipeline,
//! driven through the real axum router with an in-process sqlite registry
//! and a real (local, ephemeral-port) mock upstream — no component is
//! stubbed out, matching the concrete scenarios in spec.md §8.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use gateway_dataplane::config::settings::{DatabaseConfig, ProxyConfig, RedisConfig, ServerConfig};
use gateway_dataplane::config::Settings;
use gateway_dataplane::counters::{CounterStoreHandle, LocalCounterStore};
use gateway_dataplane::registry::RegistryClient;
use gateway_dataplane::{routes, AppState};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

/// A tiny upstream that the gateway proxies to. Bound to an ephemeral local
/// port so each test gets an isolated instance instead of sharing state.
async fn spawn_mock_upstream() -> String {
    async fn echo_get() -> &'static str {
        "{\"ok\":true}"
    }
    async fn always_500() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    let app = Router::new()
        .route("/get", get(echo_get))
        .route("/boom", get(always_500));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

/// Build an in-memory registry seeded with one tenant/api/plan/key, plus an
/// optional client override, and the full gateway router over it.
async fn build_app(upstream_base: &str, per_minute: i64) -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::query("CREATE TABLE tenants_tenant (id INTEGER PRIMARY KEY, slug TEXT NOT NULL UNIQUE, is_active INTEGER NOT NULL)")
        .execute(&pool).await.unwrap();
    sqlx::query("CREATE TABLE apis_api (id INTEGER PRIMARY KEY, tenant_id INTEGER NOT NULL, slug TEXT NOT NULL, upstream_base_url TEXT NOT NULL, is_active INTEGER NOT NULL)")
        .execute(&pool).await.unwrap();
    sqlx::query("CREATE TABLE billing_plan (id INTEGER PRIMARY KEY, requests_per_minute INTEGER NOT NULL, requests_per_month INTEGER, is_active INTEGER NOT NULL)")
        .execute(&pool).await.unwrap();
    sqlx::query("CREATE TABLE apis_apikey (id INTEGER PRIMARY KEY, tenant_id INTEGER NOT NULL, plan_id INTEGER NOT NULL, hashed_key TEXT NOT NULL UNIQUE, is_active INTEGER NOT NULL)")
        .execute(&pool).await.unwrap();
    sqlx::query("CREATE TABLE apis_client (id INTEGER PRIMARY KEY, tenant_id INTEGER NOT NULL, plan_id INTEGER NOT NULL, client_id TEXT NOT NULL UNIQUE)")
        .execute(&pool).await.unwrap();

    sqlx::query("INSERT INTO tenants_tenant (id, slug, is_active) VALUES (1, 'acme', 1)")
        .execute(&pool).await.unwrap();
    sqlx::query("INSERT INTO apis_api (id, tenant_id, slug, upstream_base_url, is_active) VALUES (1, 1, 'echo', ?, 1)")
        .bind(upstream_base)
        .execute(&pool).await.unwrap();
    sqlx::query("INSERT INTO billing_plan (id, requests_per_minute, requests_per_month, is_active) VALUES (1, ?, NULL, 1)")
        .bind(per_minute)
        .execute(&pool).await.unwrap();
    let hashed = gateway_dataplane::auth::sha256_hex("test-key");
    sqlx::query("INSERT INTO apis_apikey (id, tenant_id, plan_id, hashed_key, is_active) VALUES (1, 1, 1, ?, 1)")
        .bind(&hashed)
        .execute(&pool).await.unwrap();

    let registry = RegistryClient::new(pool);
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let counters = CounterStoreHandle::Local(LocalCounterStore::new());
    let settings = Arc::new(Settings {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        },
        redis: RedisConfig {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_millis(250),
        },
        proxy: ProxyConfig {
            upstream_timeout: Duration::from_secs(5),
        },
    });

    let state = AppState {
        registry,
        http_client,
        counters,
        settings,
    };

    routes::api_routes().with_state(state)
}

#[tokio::test]
async fn happy_path_forwards_and_passes_through_upstream_body() {
    let upstream = spawn_mock_upstream().await;
    let app = build_app(&upstream, 60).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/acme/echo/get?x=1")
                .header("x-api-key", "test-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"{\"ok\":true}");
}

#[tokio::test]
async fn missing_api_key_short_circuits_with_401() {
    let upstream = spawn_mock_upstream().await;
    let app = build_app(&upstream, 60).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/acme/echo/get")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn third_request_in_one_minute_on_a_two_per_minute_plan_is_429() {
    let upstream = spawn_mock_upstream().await;
    let app = build_app(&upstream, 2).await;

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/acme/echo/get")
                    .header("x-api-key", "test-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        statuses.push(response.status());
    }

    assert_eq!(
        statuses,
        vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );
}

#[tokio::test]
async fn upstream_5xx_is_not_a_gateway_error_and_passes_through_verbatim() {
    let upstream = spawn_mock_upstream().await;
    let app = build_app(&upstream, 60).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/acme/echo/boom")
                .header("x-api-key", "test-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Upstream's own 500 is forwarded as-is, not translated into a 502 —
    // only a transport-level failure to reach the upstream becomes 502.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn upstream_down_maps_to_502_and_still_charges_the_quota() {
    // Nothing is listening on this port.
    let app = build_app("http://127.0.0.1:1", 60).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/acme/echo/get")
                .header("x-api-key", "test-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
