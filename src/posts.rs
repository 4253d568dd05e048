//! Post authoring and listing.

use std::sync::Arc;

use chrono::Utc;

use crate::access::Requester;
use crate::error::{SocialError, SocialResult};
use crate::store::SocialStore;
use crate::types::{
    NewPost, Post, PostChanges, PostFilter, PostId, PostQuery, PostWithStats, UserId,
};
use crate::validation::{normalize_reference, validate_description, validate_title};

/// Default number of posts per listing page.
pub const DEFAULT_POSTS_PER_PAGE: usize = 20;

/// Post operations over a social store.
pub struct Posts<S: SocialStore> {
    store: Arc<S>,
    per_page: usize,
}

impl<S: SocialStore + 'static> Posts<S> {
    /// Create post operations with the given page size (at least 1).
    pub fn new(store: Arc<S>, per_page: usize) -> Self {
        Self {
            store,
            per_page: per_page.max(1),
        }
    }

    /// Publish a post authored by `author`.
    pub async fn create(&self, author: &UserId, new: NewPost) -> SocialResult<PostWithStats> {
        let title = new.title.trim().to_string();
        let description = new.description.trim().to_string();
        validate_title(&title)?;
        validate_description(&description)?;
        let image = normalize_reference("image", new.image)?;

        let now = Utc::now();
        let post = Post {
            id: PostId::generate(),
            author_id: *author,
            title,
            description,
            image,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_post(&post).await.map_err(SocialError::from_store)?;

        tracing::info!(post = %post.id, author = %author, "Post created");
        Ok(PostWithStats { post, like_count: 0 })
    }

    /// Fetch a post with its like count.
    pub async fn get(&self, id: &PostId) -> SocialResult<PostWithStats> {
        let post = self.load(id).await?;
        let mut stats = self.with_stats(vec![post]).await?;
        stats.pop().ok_or(SocialError::NotFound("post"))
    }

    /// Apply a partial update. Owner or privileged only.
    pub async fn update(
        &self,
        id: &PostId,
        requester: &Requester,
        changes: PostChanges,
    ) -> SocialResult<PostWithStats> {
        let mut post = self.load(id).await?;
        requester.assert_can_modify(&post.author_id, "post")?;

        if changes.is_empty() {
            return self.get(id).await;
        }
        if let Some(title) = changes.title {
            let title = title.trim().to_string();
            validate_title(&title)?;
            post.title = title;
        }
        if let Some(description) = changes.description {
            let description = description.trim().to_string();
            validate_description(&description)?;
            post.description = description;
        }
        if changes.image.is_some() {
            post.image = normalize_reference("image", changes.image)?;
        }
        post.updated_at = Utc::now();

        if !self.store.update_post(&post).await.map_err(SocialError::from_store)? {
            return Err(SocialError::NotFound("post"));
        }
        tracing::info!(post = %id, requester = %requester.id, "Post updated");
        self.get(id).await
    }

    /// Delete a post together with its likes and comments. Owner or privileged only.
    pub async fn delete(&self, id: &PostId, requester: &Requester) -> SocialResult<()> {
        let post = self.load(id).await?;
        requester.assert_can_modify(&post.author_id, "post")?;

        if !self.store.delete_post(id).await.map_err(SocialError::from_store)? {
            return Err(SocialError::NotFound("post"));
        }
        tracing::info!(post = %id, requester = %requester.id, "Post deleted");
        Ok(())
    }

    /// One page of posts, newest first, optionally limited to one author.
    pub async fn list(
        &self,
        author: Option<UserId>,
        page: usize,
    ) -> SocialResult<Vec<PostWithStats>> {
        let filter = author.map_or(PostFilter::All, PostFilter::Author);
        self.query(PostQuery::page(filter, page, self.per_page)).await
    }

    /// One page of posts written by identities `viewer` follows, newest first.
    pub async fn feed(&self, viewer: &UserId, page: usize) -> SocialResult<Vec<PostWithStats>> {
        self.query(PostQuery::page(PostFilter::FollowedBy(*viewer), page, self.per_page))
            .await
    }

    async fn query(&self, query: PostQuery) -> SocialResult<Vec<PostWithStats>> {
        let posts = self.store.list_posts(&query).await.map_err(SocialError::from_store)?;
        self.with_stats(posts).await
    }

    async fn load(&self, id: &PostId) -> SocialResult<Post> {
        self.store
            .get_post(id)
            .await
            .map_err(SocialError::from_store)?
            .ok_or(SocialError::NotFound("post"))
    }

    async fn with_stats(&self, posts: Vec<Post>) -> SocialResult<Vec<PostWithStats>> {
        let ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();
        let counts = self.store.like_counts(&ids).await.map_err(SocialError::from_store)?;
        Ok(posts
            .into_iter()
            .map(|post| {
                let like_count = counts.get(&post.id).copied().unwrap_or(0);
                PostWithStats { post, like_count }
            })
            .collect())
    }
}
