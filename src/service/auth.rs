//! Bearer-token authentication extractor.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::access::Requester;
use crate::error::SocialError;
use crate::store::SocialStore;
use super::error::ApiError;
use super::state::ServiceState;

/// The authenticated requester of a handler.
///
/// Accepts `Authorization: Bearer <token>` (and the `Token <token>` scheme
/// older clients send). Anything else is rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Requester);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") && !scheme.eq_ignore_ascii_case("token") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[axum::async_trait]
impl<S: SocialStore + 'static> FromRequestParts<Arc<ServiceState<S>>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ServiceState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(SocialError::Unauthenticated)?;
        let requester = state.accounts().resolve_token(token).await?;
        Ok(AuthUser(requester))
    }
}
