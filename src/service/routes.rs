//! Axum routes for the social blog service.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Json, Path, Query, State,
    },
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::error::SocialError;
use crate::store::SocialStore;
use crate::types::{
    Comment, CommentId, FollowToggle, LikeToggle, NewPost, PostChanges, PostId, PostWithStats,
    ProfileChanges, ProfileView, User, UserId, UserSummary,
};
use crate::API_SCHEMA_VERSION;

use super::auth::AuthUser;
use super::error::ApiError;
use super::middleware::{metrics_middleware, record_toggle, request_id_middleware};
use super::state::ServiceState;

type ApiResult<T> = Result<T, ApiError>;
type SharedState<S> = State<Arc<ServiceState<S>>>;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Credential exchange request. Fields are optional so that a missing one is
/// reported as a validation error rather than a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username.
    #[serde(default)]
    pub username: Option<String>,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
}

/// Successful credential exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token.
    pub token: String,
    /// Identity the token names.
    pub user_id: UserId,
    /// Username.
    pub username: String,
}

/// Comment body for create and edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    /// Comment text.
    pub content: String,
}

/// Listing query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// 1-based page number.
    pub page: Option<usize>,
    /// Restrict to one author.
    pub author: Option<String>,
}

/// One page of posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    /// 1-based page number.
    pub page: usize,
    /// Posts, newest first.
    pub results: Vec<PostWithStats>,
}

/// Acknowledgement of a deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    /// Always true.
    pub deleted: bool,
    /// Id of the removed resource.
    pub id: String,
}

impl DeletedResponse {
    fn new(id: impl ToString) -> Self {
        Self {
            deleted: true,
            id: id.to_string(),
        }
    }
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `healthy` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// JSON wire format version.
    pub schema_version: String,
    /// Store reachability.
    pub store_connected: bool,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always `alive`.
    pub status: String,
}

/// Readiness response with dependency status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    /// Ready to accept traffic.
    pub ready: bool,
    /// Store reachability.
    pub store: bool,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ============================================================================
// Accounts
// ============================================================================

async fn register_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(request) = payload?;
    let user = state
        .accounts()
        .register(&request.username, &request.email, &request.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = payload?;
    let (username, password) = match (request.username, request.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            return Err(SocialError::validation("username and password are required").into());
        }
    };

    let accounts = state.accounts();
    let user = match accounts.authenticate(&username, &password).await? {
        Some(user) => user,
        None => {
            tracing::info!(username = %username, "Login rejected");
            return Err(SocialError::Unauthenticated.into());
        }
    };

    let token = accounts.issue_token(&user);
    tracing::info!(user = %user.id, "Login succeeded");
    Ok(Json(LoginResponse {
        token: token.as_str().to_string(),
        user_id: user.id,
        username: user.username,
    }))
}

// ============================================================================
// Posts
// ============================================================================

async fn list_posts_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    _auth: AuthUser,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<PostPage>> {
    let Query(params) = params?;
    let author = params
        .author
        .as_deref()
        .map(UserId::parse)
        .transpose()
        .map_err(|_| SocialError::validation("author must be a user id"))?;
    let page = params.page.unwrap_or(1).max(1);

    let results = state.posts().list(author, page).await?;
    Ok(Json(PostPage { page, results }))
}

async fn create_post_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    AuthUser(me): AuthUser,
    payload: Result<Json<NewPost>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PostWithStats>)> {
    let Json(new) = payload?;
    let post = state.posts().create(&me.id, new).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    _auth: AuthUser,
    id: Result<Path<PostId>, PathRejection>,
) -> ApiResult<Json<PostWithStats>> {
    let Path(id) = id?;
    Ok(Json(state.posts().get(&id).await?))
}

async fn update_post_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    AuthUser(me): AuthUser,
    id: Result<Path<PostId>, PathRejection>,
    payload: Result<Json<PostChanges>, JsonRejection>,
) -> ApiResult<Json<PostWithStats>> {
    let Path(id) = id?;
    let Json(changes) = payload?;
    Ok(Json(state.posts().update(&id, &me, changes).await?))
}

async fn delete_post_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    AuthUser(me): AuthUser,
    id: Result<Path<PostId>, PathRejection>,
) -> ApiResult<Json<DeletedResponse>> {
    let Path(id) = id?;
    state.posts().delete(&id, &me).await?;
    Ok(Json(DeletedResponse::new(id)))
}

async fn feed_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    AuthUser(me): AuthUser,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<PostPage>> {
    let Query(params) = params?;
    let page = params.page.unwrap_or(1).max(1);
    let results = state.posts().feed(&me.id, page).await?;
    Ok(Json(PostPage { page, results }))
}

// ============================================================================
// Likes and comments
// ============================================================================

async fn toggle_like_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    AuthUser(me): AuthUser,
    id: Result<Path<PostId>, PathRejection>,
) -> ApiResult<Json<LikeToggle>> {
    let Path(id) = id?;
    let outcome = state.engagement().toggle_like(&me.id, &id).await?;
    record_toggle("like", outcome.liked, outcome.like_count);
    Ok(Json(outcome))
}

async fn list_comments_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    _auth: AuthUser,
    id: Result<Path<PostId>, PathRejection>,
) -> ApiResult<Json<Vec<Comment>>> {
    let Path(id) = id?;
    Ok(Json(state.engagement().comments_for(&id).await?))
}

async fn add_comment_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    AuthUser(me): AuthUser,
    id: Result<Path<PostId>, PathRejection>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let comment = state
        .engagement()
        .add_comment(&id, &me.id, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn get_comment_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    _auth: AuthUser,
    id: Result<Path<CommentId>, PathRejection>,
) -> ApiResult<Json<Comment>> {
    let Path(id) = id?;
    Ok(Json(state.engagement().get_comment(&id).await?))
}

async fn edit_comment_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    AuthUser(me): AuthUser,
    id: Result<Path<CommentId>, PathRejection>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<Json<Comment>> {
    let Path(id) = id?;
    let Json(request) = payload?;
    Ok(Json(
        state.engagement().edit_comment(&id, &me, &request.content).await?,
    ))
}

async fn delete_comment_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    AuthUser(me): AuthUser,
    id: Result<Path<CommentId>, PathRejection>,
) -> ApiResult<Json<DeletedResponse>> {
    let Path(id) = id?;
    state.engagement().delete_comment(&id, &me).await?;
    Ok(Json(DeletedResponse::new(id)))
}

// ============================================================================
// Social graph
// ============================================================================

async fn toggle_follow_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    AuthUser(me): AuthUser,
    target: Result<Path<UserId>, PathRejection>,
) -> ApiResult<Json<FollowToggle>> {
    let Path(target) = target?;
    let outcome = state.graph().toggle_follow(&me.id, &target).await?;
    record_toggle("follow", outcome.following, outcome.follower_count);
    Ok(Json(outcome))
}

async fn followers_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    _auth: AuthUser,
    user: Result<Path<UserId>, PathRejection>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let Path(user) = user?;
    Ok(Json(state.graph().followers(&user).await?))
}

async fn following_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    _auth: AuthUser,
    user: Result<Path<UserId>, PathRejection>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let Path(user) = user?;
    Ok(Json(state.graph().following(&user).await?))
}

// ============================================================================
// Profiles
// ============================================================================

async fn own_profile_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    AuthUser(me): AuthUser,
) -> ApiResult<Json<ProfileView>> {
    Ok(Json(state.profiles().view(&me.id, &me.id).await?))
}

async fn update_own_profile_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    AuthUser(me): AuthUser,
    payload: Result<Json<ProfileChanges>, JsonRejection>,
) -> ApiResult<Json<ProfileView>> {
    let Json(changes) = payload?;
    Ok(Json(state.profiles().update(&me, &me.id, changes).await?))
}

async fn profile_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    AuthUser(me): AuthUser,
    user: Result<Path<UserId>, PathRejection>,
) -> ApiResult<Json<ProfileView>> {
    let Path(user) = user?;
    Ok(Json(state.profiles().view(&me.id, &user).await?))
}

async fn update_profile_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
    AuthUser(me): AuthUser,
    user: Result<Path<UserId>, PathRejection>,
    payload: Result<Json<ProfileChanges>, JsonRejection>,
) -> ApiResult<Json<ProfileView>> {
    let Path(user) = user?;
    let Json(changes) = payload?;
    Ok(Json(state.profiles().update(&me, &user, changes).await?))
}

// ============================================================================
// Health
// ============================================================================

/// Health check endpoint (detailed).
async fn health_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
) -> Json<HealthResponse> {
    let connected = state.store.is_healthy().await;
    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: API_SCHEMA_VERSION.to_string(),
        store_connected: connected,
    })
}

/// Liveness probe. Does NOT check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe. Returns 503 while the store is unreachable.
async fn readiness_handler<S: SocialStore + 'static>(
    State(state): SharedState<S>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    if state.store.is_healthy().await {
        Ok(Json(ReadinessResponse {
            ready: true,
            store: true,
            details: None,
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                store: false,
                details: Some("Store connection failed".to_string()),
            }),
        ))
    }
}

async fn fallback_handler() -> ApiError {
    SocialError::NotFound("route").into()
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the social blog service.
pub fn create_router<S: SocialStore + 'static>(state: ServiceState<S>) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Accounts
        .route("/auth/register", post(register_handler::<S>))
        .route("/auth/login", post(login_handler::<S>))
        // Posts
        .route("/posts", get(list_posts_handler::<S>).post(create_post_handler::<S>))
        .route(
            "/posts/:id",
            get(get_post_handler::<S>)
                .put(update_post_handler::<S>)
                .delete(delete_post_handler::<S>),
        )
        .route("/posts/:id/like", post(toggle_like_handler::<S>))
        .route(
            "/posts/:id/comments",
            get(list_comments_handler::<S>).post(add_comment_handler::<S>),
        )
        .route("/feed", get(feed_handler::<S>))
        // Comments
        .route(
            "/comments/:id",
            get(get_comment_handler::<S>)
                .put(edit_comment_handler::<S>)
                .delete(delete_comment_handler::<S>),
        )
        // Social graph
        .route("/follow/:user_id", post(toggle_follow_handler::<S>))
        .route("/users/:id/followers", get(followers_handler::<S>))
        .route("/users/:id/following", get(following_handler::<S>))
        // Profiles
        .route(
            "/profile",
            get(own_profile_handler::<S>).put(update_own_profile_handler::<S>),
        )
        .route(
            "/profile/:id",
            get(profile_handler::<S>).put(update_profile_handler::<S>),
        )
        // Health checks
        .route("/health", get(health_handler::<S>))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler::<S>))
        .fallback(fallback_handler)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
