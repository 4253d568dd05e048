//! JSON error responses.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::SocialError;
use super::middleware::current_request_id;

/// Structured error response with correlation ID for tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Correlation ID for request tracing (matches `X-Request-Id`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            correlation_id: None,
            details: None,
        }
    }

    /// Add a correlation ID to the error.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError {
    error: SocialError,
    details: Option<String>,
}

impl ApiError {
    /// HTTP status for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match &self.error {
            SocialError::Validation(_) => StatusCode::BAD_REQUEST,
            SocialError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            SocialError::NotFound(_) => StatusCode::NOT_FOUND,
            SocialError::Unauthenticated => StatusCode::UNAUTHORIZED,
            SocialError::Conflict(_) => StatusCode::CONFLICT,
            SocialError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code for the wrapped error.
    pub fn code(&self) -> &'static str {
        match &self.error {
            SocialError::Validation(_) => "VALIDATION_ERROR",
            SocialError::PermissionDenied(_) => "PERMISSION_DENIED",
            SocialError::NotFound(_) => "NOT_FOUND",
            SocialError::Unauthenticated => "UNAUTHENTICATED",
            SocialError::Conflict(_) => "CONFLICT",
            SocialError::Store(_) => "INTERNAL_ERROR",
        }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<SocialError> for ApiError {
    fn from(error: SocialError) -> Self {
        Self { error, details: None }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::from(SocialError::validation("invalid request body"))
            .with_details(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::from(SocialError::validation("invalid query string"))
            .with_details(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        // An id that does not parse cannot name an existing resource.
        ApiError::from(SocialError::NotFound("resource"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let correlation_id = current_request_id();

        let mut body = match &self.error {
            SocialError::Store(message) => {
                tracing::error!(
                    error = %message,
                    correlation_id = ?correlation_id,
                    "Store failure"
                );
                ErrorResponse::new(self.code(), "internal server error")
            }
            other => {
                tracing::warn!(
                    code = self.code(),
                    error = %other,
                    correlation_id = ?correlation_id,
                    "Request error"
                );
                ErrorResponse::new(self.code(), other.to_string())
            }
        };
        if let Some(id) = correlation_id {
            body = body.with_correlation_id(id);
        }
        if let Some(details) = self.details {
            body = body.with_details(details);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SocialError::validation("x"), StatusCode::BAD_REQUEST),
            (SocialError::denied("x"), StatusCode::FORBIDDEN),
            (SocialError::NotFound("post"), StatusCode::NOT_FOUND),
            (SocialError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (SocialError::Conflict("x".into()), StatusCode::CONFLICT),
            (SocialError::Store("db down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn test_error_response_omits_empty_fields() {
        let json = serde_json::to_value(ErrorResponse::new("NOT_FOUND", "post not found")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json.get("correlationId").is_none());
        assert!(json.get("details").is_none());
    }
}
