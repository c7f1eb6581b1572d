use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors produced by the gateway's data-plane pipeline.
///
/// Each variant maps to exactly one of the status codes in spec §6/§7.
/// Underlying causes (SQL errors, Redis errors) are logged server-side
/// and never echoed to the client.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing X-API-Key header")]
    MissingApiKey,

    #[error("tenant not found")]
    TenantNotFound,

    #[error("api not found")]
    ApiNotFound,

    #[error("invalid or inactive api key")]
    InvalidApiKey,

    #[error("invalid client id")]
    InvalidClientId,

    #[error("plan invalid")]
    PlanInvalid,

    #[error("rate limit exceeded")]
    RateLimited { monthly: bool },

    #[error("method not routed")]
    MethodNotRouted,

    #[error("upstream service unavailable")]
    UpstreamUnavailable,

    #[error("registry error: {0}")]
    Registry(#[from] sqlx::Error),

    #[error("counter store error: {0}")]
    Counter(#[from] redis::RedisError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            GatewayError::MissingApiKey => (StatusCode::UNAUTHORIZED, "missing api key"),
            GatewayError::TenantNotFound => (StatusCode::NOT_FOUND, "tenant not found"),
            GatewayError::ApiNotFound => (StatusCode::NOT_FOUND, "api not found"),
            GatewayError::InvalidApiKey => {
                (StatusCode::FORBIDDEN, "invalid or inactive api key")
            }
            GatewayError::InvalidClientId => (StatusCode::FORBIDDEN, "invalid client id"),
            GatewayError::PlanInvalid => (StatusCode::FORBIDDEN, "plan invalid"),
            GatewayError::RateLimited { monthly: false } => {
                (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded")
            }
            GatewayError::RateLimited { monthly: true } => (
                StatusCode::TOO_MANY_REQUESTS,
                "monthly rate limit exceeded",
            ),
            GatewayError::MethodNotRouted => (StatusCode::METHOD_NOT_ALLOWED, "method not routed"),
            GatewayError::UpstreamUnavailable => {
                (StatusCode::BAD_GATEWAY, "upstream service unavailable")
            }
            GatewayError::Registry(e) => {
                tracing::error!("registry lookup failed: {:?}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "registry temporarily unavailable",
                )
            }
            GatewayError::Counter(e) => {
                tracing::error!("counter store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        };

        (
            status,
            Json(ErrorBody {
                error: error.to_string(),
            }),
        )
            .into_response()
    }
}
