//! Domain error taxonomy.

/// Error type for every domain operation.
///
/// The access layer maps each variant to one HTTP status; none of them is
/// fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    /// Bad input shape or length; user-correctable.
    #[error("{0}")]
    Validation(String),
    /// Authenticated but not allowed to touch the resource.
    #[error("{0}")]
    PermissionDenied(String),
    /// Referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Missing, invalid or expired credentials.
    #[error("authentication required")]
    Unauthenticated,
    /// Uniqueness clash the caller has to resolve (duplicate registration).
    #[error("{0}")]
    Conflict(String),
    /// Unexpected backend failure. The message is for logs only.
    #[error("store error: {0}")]
    Store(String),
}

impl SocialError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a permission error.
    pub fn denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }
}

/// Result alias for domain operations.
pub type SocialResult<T> = Result<T, SocialError>;
