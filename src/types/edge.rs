//! Edge types for the social graph and the like-sets.

use serde::{Deserialize, Serialize};

use super::ids::{PostId, UserId};

/// Directed follow relation: `follower` follows `following`.
///
/// Implements `Ord` for deterministic ordering: (follower, following).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FollowEdge {
    /// Identity doing the following.
    pub follower: UserId,
    /// Identity being followed.
    pub following: UserId,
}

impl FollowEdge {
    /// Create a new edge.
    pub fn new(follower: UserId, following: UserId) -> Self {
        Self { follower, following }
    }

    /// Self-edges are never persisted.
    pub fn is_self_edge(&self) -> bool {
        self.follower == self.following
    }
}

/// Like membership of `user` in the like-set of `post`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LikeEdge {
    /// Liked post.
    pub post: PostId,
    /// Identity that liked it.
    pub user: UserId,
}

impl LikeEdge {
    /// Create a new like edge.
    pub fn new(post: PostId, user: UserId) -> Self {
        Self { post, user }
    }
}

/// Result of a follow toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowToggle {
    /// Whether the edge exists after the toggle.
    pub following: bool,
    /// Live follower count of the target, read after the mutation.
    pub follower_count: u64,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    /// Whether the membership exists after the toggle.
    pub liked: bool,
    /// Live like-set cardinality, read after the mutation.
    pub like_count: u64,
}

/// Follow relationship between a viewer and another identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStats {
    /// Followers of the identity.
    pub followers_count: u64,
    /// Identities it follows.
    pub following_count: u64,
    /// Viewer follows the identity.
    pub is_following: bool,
    /// Identity follows the viewer back.
    pub is_followed_by: bool,
}
