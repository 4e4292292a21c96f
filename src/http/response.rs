//! Error bodies and response headers.
//!
//! # Design Decisions
//! - "No route" is a 404 about the road network; system failures are 5xx
//! - Error bodies share one JSON shape: `{"error": kind, "message": text}`

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::OptimizeError;
use crate::security::RateLimitResult;

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    pub message: String,
}

pub fn error_response(status: StatusCode, kind: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: kind,
            message: message.into(),
        }),
    )
        .into_response()
}

pub fn status_for(err: &OptimizeError) -> StatusCode {
    match err {
        OptimizeError::Configuration(_) => StatusCode::BAD_REQUEST,
        OptimizeError::InvalidEndpoints(_) => StatusCode::UNPROCESSABLE_ENTITY,
        OptimizeError::NoRouteFound(_) => StatusCode::NOT_FOUND,
        OptimizeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        OptimizeError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        OptimizeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for OptimizeError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        // Internal details stay in the logs.
        let message = match &self {
            OptimizeError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        error_response(status, self.kind(), message)
    }
}

/// Copy `X-RateLimit-*` (and `Retry-After`) onto a response.
pub fn apply_rate_limit_headers(response: &mut Response, result: &RateLimitResult) {
    let headers = response.headers_mut();
    for (name, value) in result.to_headers() {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::from_str(&value)) {
            headers.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::Strategy;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (OptimizeError::Configuration("x".into()), 400),
            (OptimizeError::InvalidEndpoints("x".into()), 422),
            (OptimizeError::NoRouteFound("x".into()), 404),
            (OptimizeError::Timeout(Duration::from_secs(8)), 504),
            (OptimizeError::UpstreamUnavailable("x".into()), 503),
            (OptimizeError::Internal("x".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(&err).as_u16(), status, "{err}");
        }
    }

    #[test]
    fn test_rate_limit_headers() {
        let mut response = StatusCode::TOO_MANY_REQUESTS.into_response();
        apply_rate_limit_headers(
            &mut response,
            &RateLimitResult {
                allowed: false,
                limit: 10,
                remaining: 0,
                reset_at: 1_700_000_000,
                retry_after: Some(42),
                strategy: Strategy::SlidingWindow,
            },
        );
        let headers = response.headers();
        assert_eq!(headers["x-ratelimit-limit"], "10");
        assert_eq!(headers["x-ratelimit-strategy"], "sliding_window");
        assert_eq!(headers["retry-after"], "42");
    }
}
