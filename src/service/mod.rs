//! Social Blog REST Service
//!
//! Exposes the social graph and engagement core as a JSON API. All endpoints
//! except registration, login and health require `Authorization: Bearer <token>`.
//!
//! ## Endpoints
//!
//! - `POST /auth/register` - Create an identity
//! - `POST /auth/login` - Exchange credentials for a bearer token
//! - `GET /posts`, `POST /posts` - List (`?page=`, `?author=`) or create posts
//! - `GET|PUT|DELETE /posts/:id` - Read, update or delete a post
//! - `POST /posts/:id/like` - Toggle a like
//! - `GET|POST /posts/:id/comments` - List or add comments
//! - `GET|PUT|DELETE /comments/:id` - Read, edit or delete a comment
//! - `POST /follow/:user_id` - Toggle a follow
//! - `GET /users/:id/followers`, `GET /users/:id/following` - Graph listings
//! - `GET /feed` - Posts by followed identities
//! - `GET|PUT /profile`, `GET|PUT /profile/:id` - Profiles
//! - `GET /health`, `GET /health/live`, `GET /health/ready` - Probes

pub mod auth;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use auth::AuthUser;
pub use error::{ApiError, ErrorResponse};
pub use middleware::{
    current_request_id, metrics_middleware, record_toggle, request_id_middleware,
    REQUEST_ID_HEADER,
};
pub use routes::create_router;
pub use state::ServiceState;
