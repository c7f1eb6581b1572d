use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::Span;

use crate::{auth, error::GatewayError, proxy, rate_limit, usage, AppState};

/// The single route family this crate serves:
/// `<METHOD> /{tenant_slug}/{api_slug}/{path...}?{query}`.
///
/// Pipeline order matches spec §5: auth resolution (registry reads) →
/// rate limiting (counter increments) → reverse proxy (outbound HTTP) →
/// response to the caller, with usage recording scheduled afterward
/// without delaying the response.
pub async fn gateway_handler(
    State(state): State<AppState>,
    Path((tenant_slug, api_slug, path)): Path<(String, String, String)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let resolved = auth::resolve(&state.registry, &headers, &tenant_slug, &api_slug).await?;

    let span = Span::current();
    span.record("tenant", tenant_slug.as_str());
    span.record("api", api_slug.as_str());

    rate_limit::check(
        &state.counters,
        resolved.rate_limit_identity,
        &resolved.active_plan,
        Utc::now(),
    )
    .await?;

    let upstream = proxy::forward(
        &state.http_client,
        &resolved.upstream_base_url,
        &path,
        uri.query(),
        &method,
        &headers,
        body,
    )
    .await;

    // Usage is recorded for every request that reached the proxy stage,
    // including upstream failures — the call was attempted on the
    // tenant's behalf regardless of whether it succeeded.
    usage::record(state.counters.clone(), resolved.tenant_id, resolved.api_id);

    let upstream = upstream?;
    Ok((upstream.status, upstream.headers, upstream.body).into_response())
}
