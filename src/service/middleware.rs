//! Service middleware for metrics and request correlation.
//!
//! ## Metrics Logged
//!
//! Under the `social_blog::metrics` target:
//! - `request_metric` - path pattern, method, status, latency
//! - `toggle_metric` - follow/like toggle outcomes

use std::sync::OnceLock;
use std::time::Instant;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use regex_lite::Regex;
use tracing::info;

/// Header carrying the correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Correlation id of the request being handled, if any.
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// Attach a correlation id to every request.
///
/// Reuses an incoming `X-Request-Id` or generates a UUID, writes it back onto
/// the request, makes it available via [`current_request_id`] and echoes it on
/// the response. Nested layers therefore agree on a single id.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let value = HeaderValue::from_str(&id).ok();
    if let Some(value) = &value {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let mut response = REQUEST_ID.scope(id, next.run(request)).await;
    if let Some(value) = value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "social_blog::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

fn uuid_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
            .expect("uuid regex should compile")
    })
}

/// Normalize path for metrics to avoid high cardinality.
fn normalize_path(path: &str) -> String {
    uuid_regex().replace_all(path, ":id").to_string()
}

/// Record a follow or like toggle outcome.
pub fn record_toggle(kind: &'static str, active: bool, count: u64) {
    info!(
        target: "social_blog::metrics",
        metric_type = "toggle",
        kind = kind,
        active = active,
        count = count,
        "toggle_metric"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_replaces_uuid() {
        let path = "/posts/550e8400-e29b-41d4-a716-446655440000/like";
        assert_eq!(normalize_path(path), "/posts/:id/like");
    }

    #[test]
    fn test_normalize_path_preserves_regular_path() {
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
    }

    #[test]
    fn test_no_request_id_outside_scope() {
        assert!(current_request_id().is_none());
    }

    #[tokio::test]
    async fn test_nested_request_id_layers_share_one_id() {
        use axum::{body::Body, middleware::from_fn, routing::get, Router};
        use tower::ServiceExt;

        let app = Router::new()
            .route("/", get(|| async { current_request_id().unwrap_or_default() }))
            .layer(from_fn(request_id_middleware))
            .layer(from_fn(request_id_middleware));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let header = response.headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), header);
    }

    #[tokio::test]
    async fn test_request_id_visible_inside_scope() {
        let seen = REQUEST_ID
            .scope("abc".to_string(), async { current_request_id() })
            .await;
        assert_eq!(seen.as_deref(), Some("abc"));
    }
}
