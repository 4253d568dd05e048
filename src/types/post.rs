//! Post types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{PostId, UserId};

/// A post authored by an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Post id.
    pub id: PostId,
    /// Author identity.
    pub author_id: UserId,
    /// Title.
    pub title: String,
    /// Subheading shown under the title.
    pub description: String,
    /// Reference to an image held by the file store.
    pub image: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    /// Title.
    pub title: String,
    /// Subheading.
    pub description: String,
    /// Optional image reference.
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial post update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostChanges {
    /// New title.
    pub title: Option<String>,
    /// New subheading.
    pub description: Option<String>,
    /// New image reference; `Some("")` removes the image.
    pub image: Option<String>,
}

impl PostChanges {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.image.is_none()
    }
}

/// A post together with its live like count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithStats {
    /// The post.
    #[serde(flatten)]
    pub post: Post,
    /// Cardinality of the like-set.
    pub like_count: u64,
}

/// Which posts a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    /// Every post.
    All,
    /// Posts written by one identity.
    Author(UserId),
    /// Posts written by identities that the given identity follows.
    FollowedBy(UserId),
}

/// Listing window. Posts are always returned newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    /// Inclusion filter.
    pub filter: PostFilter,
    /// Rows to skip.
    pub offset: usize,
    /// Maximum rows to return.
    pub limit: usize,
}

impl PostQuery {
    /// Query for a 1-based page of the given size.
    pub fn page(filter: PostFilter, page: usize, per_page: usize) -> Self {
        let page = page.max(1);
        Self {
            filter,
            offset: (page - 1).saturating_mul(per_page),
            limit: per_page,
        }
    }
}
