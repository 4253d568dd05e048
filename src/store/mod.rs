//! Persistent storage backends.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use std::collections::BTreeMap;

use async_trait::async_trait;
use crate::types::{
    Comment, CommentId, FollowEdge, FollowToggle, LikeEdge, LikeToggle, NewUser, Post, PostId,
    PostQuery, Profile, User, UserId, UserInsert,
};

/// Trait for social storage backends.
///
/// Implementations must guarantee deterministic ordering of results and must
/// run each toggle (existence check, mutation, count) as one atomic unit, so
/// concurrent identical toggles can never persist a duplicate edge.
#[async_trait]
pub trait SocialStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether the backend is reachable.
    async fn is_healthy(&self) -> bool;

    // ---- identities ------------------------------------------------------

    /// Insert a user; username/email clashes are reported, not raised.
    async fn insert_user(&self, user: NewUser) -> Result<UserInsert, Self::Error>;

    /// Fetch a user by id.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, Self::Error>;

    /// Fetch several users (ordered by id; missing ids are skipped).
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, Self::Error>;

    /// Fetch a user by exact username.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Self::Error>;

    /// Grant or revoke the privileged role. Returns false if the user is missing.
    async fn set_staff(&self, id: &UserId, is_staff: bool) -> Result<bool, Self::Error>;

    // ---- profiles --------------------------------------------------------

    /// Fetch the profile of `user`, creating a blank one if absent.
    async fn get_or_create_profile(&self, user: &UserId) -> Result<Profile, Self::Error>;

    /// Persist profile fields.
    async fn save_profile(&self, profile: &Profile) -> Result<(), Self::Error>;

    // ---- social graph ----------------------------------------------------

    /// Atomically delete the edge if present, create it otherwise, and read the
    /// target's follower count after the mutation.
    async fn toggle_follow(&self, edge: FollowEdge) -> Result<FollowToggle, Self::Error>;

    /// Whether the edge exists.
    async fn is_following(&self, edge: FollowEdge) -> Result<bool, Self::Error>;

    /// Live count of edges pointing at `user`.
    async fn follower_count(&self, user: &UserId) -> Result<u64, Self::Error>;

    /// Live count of edges leaving `user`.
    async fn following_count(&self, user: &UserId) -> Result<u64, Self::Error>;

    /// Followers of `user` (ordered by id).
    async fn followers(&self, user: &UserId) -> Result<Vec<UserId>, Self::Error>;

    /// Identities `user` follows (ordered by id).
    async fn following(&self, user: &UserId) -> Result<Vec<UserId>, Self::Error>;

    // ---- posts -----------------------------------------------------------

    /// Insert a new post.
    async fn insert_post(&self, post: &Post) -> Result<(), Self::Error>;

    /// Fetch a post by id.
    async fn get_post(&self, id: &PostId) -> Result<Option<Post>, Self::Error>;

    /// Overwrite a post's mutable fields. Returns false if it is gone.
    async fn update_post(&self, post: &Post) -> Result<bool, Self::Error>;

    /// Delete a post with its likes and comments. Returns false if absent.
    async fn delete_post(&self, id: &PostId) -> Result<bool, Self::Error>;

    /// List posts newest first.
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>, Self::Error>;

    // ---- likes -----------------------------------------------------------

    /// Atomically toggle like membership and read the like count after the
    /// mutation. `None` when the post does not exist.
    async fn toggle_like(&self, edge: LikeEdge) -> Result<Option<LikeToggle>, Self::Error>;

    /// Like counts for several posts; posts without likes map to 0.
    async fn like_counts(&self, posts: &[PostId]) -> Result<BTreeMap<PostId, u64>, Self::Error>;

    // ---- comments --------------------------------------------------------

    /// Append a comment.
    async fn insert_comment(&self, comment: &Comment) -> Result<(), Self::Error>;

    /// Fetch a comment by id.
    async fn get_comment(&self, id: &CommentId) -> Result<Option<Comment>, Self::Error>;

    /// Overwrite content and edit stamp. Returns false if it is gone.
    async fn update_comment(&self, comment: &Comment) -> Result<bool, Self::Error>;

    /// Permanently remove a comment. Returns false if absent.
    async fn delete_comment(&self, id: &CommentId) -> Result<bool, Self::Error>;

    /// Comments of a post in insertion order.
    async fn list_comments(&self, post: &PostId) -> Result<Vec<Comment>, Self::Error>;
}

pub use memory::InMemorySocialStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresSocialStore;
