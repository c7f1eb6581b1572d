use axum::routing::get;
use axum::Router;

mod gateway;
mod health;

use crate::AppState;

/// The entire externally-visible surface: a liveness pair for container
/// probes, plus the single proxy route family that carries all tenant
/// traffic. Everything tenant-specific (auth, quotas, upstream routing)
/// lives inside the gateway handler, not in the router shape.
///
/// Only the six methods plus HEAD/OPTIONS that the proxy ever forwards are
/// registered here, so an unsupported method (e.g. TRACE) gets axum's own
/// 405 before `gateway_handler` runs a single registry lookup or counter
/// increment — mirroring the source's `@router.api_route(..., methods=[...])`,
/// which never even invokes its auth dependency for a disallowed method.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health::live_check))
        .route("/health", get(health::health_check))
        .route(
            "/{tenant_slug}/{api_slug}/{*path}",
            get(gateway::gateway_handler)
                .post(gateway::gateway_handler)
                .put(gateway::gateway_handler)
                .delete(gateway::gateway_handler)
                .patch(gateway::gateway_handler)
                .head(gateway::gateway_handler)
                .options(gateway::gateway_handler),
        )
}
