//! Likes and comments on posts.

use std::sync::Arc;

use chrono::Utc;

use crate::access::Requester;
use crate::error::{SocialError, SocialResult};
use crate::store::SocialStore;
use crate::types::{Comment, CommentId, LikeEdge, LikeToggle, PostId, UserId};
use crate::validation::validate_comment;

/// Engagement operations over a social store.
pub struct Engagement<S: SocialStore> {
    store: Arc<S>,
}

impl<S: SocialStore + 'static> Engagement<S> {
    /// Create engagement operations over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Toggle `user`'s membership in the like-set of `post`.
    pub async fn toggle_like(&self, user: &UserId, post: &PostId) -> SocialResult<LikeToggle> {
        let outcome = self
            .store
            .toggle_like(LikeEdge::new(*post, *user))
            .await
            .map_err(SocialError::from_store)?
            .ok_or(SocialError::NotFound("post"))?;

        tracing::debug!(
            user = %user,
            post = %post,
            liked = outcome.liked,
            like_count = outcome.like_count,
            "Like toggled"
        );
        Ok(outcome)
    }

    /// Append a comment to `post`.
    ///
    /// Content is trimmed before it is validated and stored.
    pub async fn add_comment(
        &self,
        post: &PostId,
        author: &UserId,
        content: &str,
    ) -> SocialResult<Comment> {
        let content = content.trim();
        validate_comment(content)?;
        self.require_post(post).await?;

        let comment = Comment::new(*post, *author, content.to_string());
        self.store
            .insert_comment(&comment)
            .await
            .map_err(SocialError::from_store)?;

        tracing::debug!(comment = %comment.id, post = %post, author = %author, "Comment added");
        Ok(comment)
    }

    /// Fetch a single comment.
    pub async fn get_comment(&self, id: &CommentId) -> SocialResult<Comment> {
        self.store
            .get_comment(id)
            .await
            .map_err(SocialError::from_store)?
            .ok_or(SocialError::NotFound("comment"))
    }

    /// Replace the content of a comment. Owner or privileged only.
    pub async fn edit_comment(
        &self,
        id: &CommentId,
        requester: &Requester,
        content: &str,
    ) -> SocialResult<Comment> {
        let mut comment = self.get_comment(id).await?;
        requester.assert_can_modify(&comment.author_id, "comment")?;

        let content = content.trim();
        validate_comment(content)?;
        comment.content = content.to_string();
        comment.edited_at = Some(Utc::now());

        if !self
            .store
            .update_comment(&comment)
            .await
            .map_err(SocialError::from_store)?
        {
            return Err(SocialError::NotFound("comment"));
        }
        Ok(comment)
    }

    /// Permanently remove a comment. Owner or privileged only; the comment is
    /// left untouched when the gate refuses.
    pub async fn delete_comment(&self, id: &CommentId, requester: &Requester) -> SocialResult<()> {
        let comment = self.get_comment(id).await?;
        if let Err(err) = requester.assert_can_modify(&comment.author_id, "comment") {
            tracing::warn!(comment = %id, requester = %requester.id, "Comment delete denied");
            return Err(err);
        }

        if !self
            .store
            .delete_comment(id)
            .await
            .map_err(SocialError::from_store)?
        {
            return Err(SocialError::NotFound("comment"));
        }
        tracing::debug!(comment = %id, requester = %requester.id, "Comment deleted");
        Ok(())
    }

    /// Comments of `post` in insertion order.
    pub async fn comments_for(&self, post: &PostId) -> SocialResult<Vec<Comment>> {
        self.require_post(post).await?;
        self.store
            .list_comments(post)
            .await
            .map_err(SocialError::from_store)
    }

    async fn require_post(&self, id: &PostId) -> SocialResult<()> {
        match self.store.get_post(id).await.map_err(SocialError::from_store)? {
            Some(_) => Ok(()),
            None => Err(SocialError::NotFound("post")),
        }
    }
}
