//! # social-blog
//!
//! Social graph and engagement core for a blogging backend.
//!
//! Identities follow each other, like posts and comment on them. The crate
//! owns the rules that keep those relations consistent:
//!
//! ## Core Contract
//!
//! 1. Follow and like are **toggle** relations: applying the same toggle twice
//!    restores the previous state, and two concurrent identical toggles never
//!    persist more than one edge
//! 2. Counts (followers, likes) are always read live, after the mutation, in
//!    the same atomic unit as the toggle
//! 3. Posts, comments and profiles can only be modified by their owner or by a
//!    privileged identity
//!
//! ## Architecture
//!
//! ```text
//! HTTP (axum) → SocialGraph / Engagement / Posts / Profiles / Accounts
//!                    ↓
//!              SocialStore (Postgres or Memory)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod error;
pub mod access;
pub mod validation;
pub mod store;
pub mod graph;
pub mod engagement;
pub mod posts;
pub mod profiles;
pub mod accounts;
pub mod config;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    AuthToken, Comment, CommentId, FollowEdge, FollowStats, FollowToggle, LikeEdge, LikeToggle,
    NewPost, NewUser, Post, PostChanges, PostFilter, PostId, PostQuery, PostWithStats, Profile,
    ProfileChanges, ProfileView, TokenError, User, UserId, UserInsert, UserSummary,
};
pub use error::{SocialError, SocialResult};
pub use access::{assert_owner_or_privileged, Requester};
pub use store::{InMemorySocialStore, SocialStore};
#[cfg(feature = "postgres")]
pub use store::PostgresSocialStore;
pub use graph::SocialGraph;
pub use engagement::Engagement;
pub use posts::Posts;
pub use profiles::Profiles;
pub use accounts::Accounts;
pub use config::ServiceConfig;

/// Version of the JSON wire format served by the REST layer.
pub const API_SCHEMA_VERSION: &str = "1.0.0";
