use axum::{
    body::Bytes,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
};

use crate::error::GatewayError;

/// Inbound request headers stripped before forwarding upstream, matching
/// `proxy.py`'s `headers.pop(...)` calls. `X-Client-ID` is intentionally
/// *not* in this set — the upstream may want to observe it.
const STRIPPED_REQUEST_HEADERS: [&str; 3] = ["host", "content-length", "x-api-key"];

/// Upstream response headers that the server regenerates, never copied
/// through to the client.
const STRIPPED_RESPONSE_HEADERS: [&str; 4] =
    ["content-encoding", "content-length", "transfer-encoding", "connection"];

/// Compose the upstream URL: strip a trailing slash from `base`, a leading
/// slash from `path`, and join with exactly one `/`. Idempotent under
/// repeated application. An empty `path` yields `base + "/"`.
pub fn build_upstream_url(base: &str, path: &str) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    let path = path.strip_prefix('/').unwrap_or(path);
    format!("{base}/{path}")
}

/// `GET`, `POST`, `PUT`, `DELETE`, `PATCH`, `HEAD`, `OPTIONS` are mirrored to
/// the upstream; anything else is not routed.
pub fn to_reqwest_method(method: &Method) -> Result<reqwest::Method, GatewayError> {
    match *method {
        Method::GET => Ok(reqwest::Method::GET),
        Method::POST => Ok(reqwest::Method::POST),
        Method::PUT => Ok(reqwest::Method::PUT),
        Method::DELETE => Ok(reqwest::Method::DELETE),
        Method::PATCH => Ok(reqwest::Method::PATCH),
        Method::HEAD => Ok(reqwest::Method::HEAD),
        Method::OPTIONS => Ok(reqwest::Method::OPTIONS),
        _ => Err(GatewayError::MethodNotRouted),
    }
}

/// Copy inbound headers onto the outbound request, excluding the three
/// hop-sensitive / credential headers spec.md names.
pub fn filter_request_headers(inbound: &HeaderMap) -> reqwest::header::HeaderMap {
    let mut out = reqwest::header::HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound.iter() {
        if STRIPPED_REQUEST_HEADERS.contains(&name.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            reqwest::header::HeaderName::from_bytes(name.as_str().as_bytes()),
            reqwest::header::HeaderValue::from_bytes(value.as_bytes()),
        ) {
            out.append(name, value);
        }
    }
    out
}

/// Copy upstream response headers onto the client response, excluding the
/// four response-framing headers the server regenerates itself.
pub fn filter_response_headers(upstream: &reqwest::header::HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream.iter() {
        if STRIPPED_RESPONSE_HEADERS.contains(&name.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            out.append(name, value);
        }
    }
    out
}

/// The result of a successful proxy call: everything the handler needs to
/// build the client-facing response.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Forward the inbound request to `upstream_base_url + path (+ query)`,
/// unchanged except for header hygiene. Any transport-level failure (DNS,
/// connect, read, write, TLS, client-side timeout) becomes a 502; a non-2xx
/// upstream response is passed through verbatim — it is not an error here.
pub async fn forward(
    client: &reqwest::Client,
    upstream_base_url: &str,
    path: &str,
    query: Option<&str>,
    method: &Method,
    inbound_headers: &HeaderMap,
    body: Bytes,
) -> Result<UpstreamResponse, GatewayError> {
    let reqwest_method = to_reqwest_method(method)?;

    let mut url = build_upstream_url(upstream_base_url, path);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }

    let response = client
        .request(reqwest_method, url)
        .headers(filter_request_headers(inbound_headers))
        .body(body)
        .send()
        .await
        .map_err(|err| {
            tracing::warn!("upstream request failed: {err}");
            GatewayError::UpstreamUnavailable
        })?;

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let headers = filter_response_headers(response.headers());
    let body = response.bytes().await.map_err(|err| {
        tracing::warn!("reading upstream response body failed: {err}");
        GatewayError::UpstreamUnavailable
    })?;

    Ok(UpstreamResponse {
        status,
        headers,
        body,
    })
}
