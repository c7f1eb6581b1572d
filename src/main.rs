use std::sync::Arc;

use axum::http::{header, Method};
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gateway_dataplane::config::Settings;
use gateway_dataplane::counters::CounterStoreHandle;
use gateway_dataplane::middleware::request_id_middleware;
use gateway_dataplane::registry::RegistryClient;
use gateway_dataplane::{routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Arc::new(Settings::from_env()?);

    tracing::info!("starting gateway data plane");

    // The registry schema (tenants, apis, api keys, plans, clients) is owned
    // and migrated by the control plane; this pool only ever selects.
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&settings.database.url)
        .await?;

    tracing::info!("registry database connection established");

    let registry = RegistryClient::new(pool);

    let http_client = reqwest::Client::builder()
        .timeout(settings.proxy.upstream_timeout)
        .build()?;

    let counters = CounterStoreHandle::connect(&settings.redis.url, settings.redis.connect_timeout).await;

    if let CounterStoreHandle::Local(local) = &counters {
        local.clone().spawn_sweeper(std::time::Duration::from_secs(60));
        tracing::info!("counter store: sweeping expired local buckets every 60s");
    }

    let state = AppState {
        registry,
        http_client,
        counters,
        settings: settings.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::HEAD,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-api-key"),
            header::HeaderName::from_static("x-client-id"),
        ]);

    let app = Router::new()
        .merge(routes::api_routes())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(settings.proxy.upstream_timeout))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("gateway listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
}
