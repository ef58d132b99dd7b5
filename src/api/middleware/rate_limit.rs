//! Per-client rate limiting for authenticated routes.
//!
//! Auth routes apply their own named limits inside the handlers.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::extractors::ClientIp;
use crate::api::AppState;
use crate::config::{RATE_LIMIT_REQUESTS, RATE_LIMIT_WINDOW_SECONDS};

/// Rate limit error response
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert("Retry-After", HeaderValue::from(self.retry_after));
        headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));

        let body = axum::Json(serde_json::json!({
            "error": {
                "code": "TOO_MANY_REQUESTS",
                "message": "Too many requests. Please try again later."
            }
        }));

        (StatusCode::TOO_MANY_REQUESTS, headers, body).into_response()
    }
}

/// General limit of RATE_LIMIT_REQUESTS per RATE_LIMIT_WINDOW_SECONDS.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ClientIp(client_id): ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    let key = format!("general:{}", client_id);

    let count = match state
        .rate_limiter
        .hit(&key, RATE_LIMIT_WINDOW_SECONDS)
        .await
    {
        Ok(count) => count,
        Err(e) => {
            tracing::error!(error = %e, "Rate limit check failed - denying request");
            return Err(RateLimitError {
                retry_after: RATE_LIMIT_WINDOW_SECONDS,
            });
        }
    };

    if count > RATE_LIMIT_REQUESTS {
        tracing::warn!(client = %client_id, count = count, "Rate limit exceeded");
        return Err(RateLimitError {
            retry_after: RATE_LIMIT_WINDOW_SECONDS,
        });
    }

    let mut response = next.run(request).await;

    let remaining = RATE_LIMIT_REQUESTS.saturating_sub(count);
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(RATE_LIMIT_REQUESTS));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));

    Ok(response)
}
