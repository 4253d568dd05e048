//! Comment types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CommentId, PostId, UserId};

/// A comment on a post. Listed in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment id.
    pub id: CommentId,
    /// Post the comment belongs to.
    pub post_id: PostId,
    /// Author identity.
    pub author_id: UserId,
    /// Text content.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Set when the author edited the content.
    pub edited_at: Option<DateTime<Utc>>,
}

impl Comment {
    /// New comment stamped with a server-assigned id and timestamp.
    pub fn new(post_id: PostId, author_id: UserId, content: String) -> Self {
        Self {
            id: CommentId::generate(),
            post_id,
            author_id,
            content,
            created_at: Utc::now(),
            edited_at: None,
        }
    }
}
