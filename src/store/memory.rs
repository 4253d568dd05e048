//! In-memory social store for tests and single-process deployments.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::types::{
    Comment, CommentId, FollowEdge, FollowToggle, LikeEdge, LikeToggle, NewUser, Post, PostFilter,
    PostId, PostQuery, Profile, User, UserId, UserInsert,
};
use super::SocialStore;

/// Error type for in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// A row referenced an entity that does not exist.
    #[error("referenced {0} does not exist: {1}")]
    MissingReference(&'static str, String),
    /// Attempted to persist a follow edge from an identity to itself.
    #[error("self-follow edge rejected for {0}")]
    SelfEdge(UserId),
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    usernames: BTreeMap<String, UserId>,
    emails: BTreeMap<String, UserId>,
    profiles: BTreeMap<UserId, Profile>,
    /// Follower -> followed identities.
    following: BTreeMap<UserId, BTreeSet<UserId>>,
    /// Followed identity -> followers.
    followers: BTreeMap<UserId, BTreeSet<UserId>>,
    /// Posts with their insertion sequence number.
    posts: BTreeMap<PostId, (u64, Post)>,
    /// Post -> like-set.
    likes: BTreeMap<PostId, BTreeSet<UserId>>,
    /// Comments with their insertion sequence number.
    comments: BTreeMap<CommentId, (u64, Comment)>,
    next_seq: u64,
}

impl State {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn require_user(&self, id: &UserId) -> Result<(), InMemoryError> {
        if self.users.contains_key(id) {
            Ok(())
        } else {
            Err(InMemoryError::MissingReference("user", id.to_string()))
        }
    }

    fn require_post(&self, id: &PostId) -> Result<(), InMemoryError> {
        if self.posts.contains_key(id) {
            Ok(())
        } else {
            Err(InMemoryError::MissingReference("post", id.to_string()))
        }
    }

    fn follower_count(&self, user: &UserId) -> u64 {
        self.followers.get(user).map_or(0, |s| s.len() as u64)
    }

    fn like_count(&self, post: &PostId) -> u64 {
        self.likes.get(post).map_or(0, |s| s.len() as u64)
    }
}

/// In-memory social store.
///
/// A single `RwLock` guards all tables, so every operation (toggles included)
/// is atomic with respect to every other. Uses BTreeMap/BTreeSet for
/// deterministic iteration order.
#[derive(Debug, Default)]
pub struct InMemorySocialStore {
    state: RwLock<State>,
}

impl InMemorySocialStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All persisted follow edges, ordered by (follower, following).
    pub fn follow_edges(&self) -> Vec<FollowEdge> {
        let state = self.state.read();
        state
            .following
            .iter()
            .flat_map(|(follower, targets)| {
                targets.iter().map(move |t| FollowEdge::new(*follower, *t))
            })
            .collect()
    }

    /// All persisted like edges, ordered by (post, user).
    pub fn like_edges(&self) -> Vec<LikeEdge> {
        let state = self.state.read();
        state
            .likes
            .iter()
            .flat_map(|(post, users)| users.iter().map(move |u| LikeEdge::new(*post, *u)))
            .collect()
    }

    /// Get number of users.
    pub fn num_users(&self) -> usize {
        self.state.read().users.len()
    }
}

#[async_trait]
impl SocialStore for InMemorySocialStore {
    type Error = InMemoryError;

    async fn is_healthy(&self) -> bool {
        true
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserInsert, Self::Error> {
        let mut state = self.state.write();
        if state.usernames.contains_key(&user.username) {
            return Ok(UserInsert::UsernameTaken);
        }
        if state.emails.contains_key(&user.email) {
            return Ok(UserInsert::EmailTaken);
        }

        let created = User {
            id: UserId::generate(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_staff: user.is_staff,
            created_at: Utc::now(),
        };
        state.usernames.insert(created.username.clone(), created.id);
        state.emails.insert(created.email.clone(), created.id);
        state.users.insert(created.id, created.clone());
        Ok(UserInsert::Created(created))
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, Self::Error> {
        Ok(self.state.read().users.get(id).cloned())
    }

    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, Self::Error> {
        let wanted: BTreeSet<_> = ids.iter().copied().collect();
        let state = self.state.read();
        Ok(wanted
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Self::Error> {
        let state = self.state.read();
        Ok(state
            .usernames
            .get(username)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn set_staff(&self, id: &UserId, is_staff: bool) -> Result<bool, Self::Error> {
        let mut state = self.state.write();
        Ok(match state.users.get_mut(id) {
            Some(user) => {
                user.is_staff = is_staff;
                true
            }
            None => false,
        })
    }

    async fn get_or_create_profile(&self, user: &UserId) -> Result<Profile, Self::Error> {
        let mut state = self.state.write();
        state.require_user(user)?;
        Ok(state
            .profiles
            .entry(*user)
            .or_insert_with(|| Profile::empty(*user))
            .clone())
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), Self::Error> {
        let mut state = self.state.write();
        state.require_user(&profile.user_id)?;
        state.profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn toggle_follow(&self, edge: FollowEdge) -> Result<FollowToggle, Self::Error> {
        if edge.is_self_edge() {
            return Err(InMemoryError::SelfEdge(edge.follower));
        }

        let mut state = self.state.write();
        state.require_user(&edge.follower)?;
        state.require_user(&edge.following)?;

        let exists = state
            .followers
            .get(&edge.following)
            .is_some_and(|s| s.contains(&edge.follower));

        if exists {
            if let Some(set) = state.followers.get_mut(&edge.following) {
                set.remove(&edge.follower);
            }
            if let Some(set) = state.following.get_mut(&edge.follower) {
                set.remove(&edge.following);
            }
        } else {
            state.followers.entry(edge.following).or_default().insert(edge.follower);
            state.following.entry(edge.follower).or_default().insert(edge.following);
        }

        Ok(FollowToggle {
            following: !exists,
            follower_count: state.follower_count(&edge.following),
        })
    }

    async fn is_following(&self, edge: FollowEdge) -> Result<bool, Self::Error> {
        Ok(self
            .state
            .read()
            .following
            .get(&edge.follower)
            .is_some_and(|s| s.contains(&edge.following)))
    }

    async fn follower_count(&self, user: &UserId) -> Result<u64, Self::Error> {
        Ok(self.state.read().follower_count(user))
    }

    async fn following_count(&self, user: &UserId) -> Result<u64, Self::Error> {
        Ok(self.state.read().following.get(user).map_or(0, |s| s.len() as u64))
    }

    async fn followers(&self, user: &UserId) -> Result<Vec<UserId>, Self::Error> {
        Ok(self
            .state
            .read()
            .followers
            .get(user)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn following(&self, user: &UserId) -> Result<Vec<UserId>, Self::Error> {
        Ok(self
            .state
            .read()
            .following
            .get(user)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn insert_post(&self, post: &Post) -> Result<(), Self::Error> {
        let mut state = self.state.write();
        state.require_user(&post.author_id)?;
        let seq = state.seq();
        state.posts.insert(post.id, (seq, post.clone()));
        Ok(())
    }

    async fn get_post(&self, id: &PostId) -> Result<Option<Post>, Self::Error> {
        Ok(self.state.read().posts.get(id).map(|(_, p)| p.clone()))
    }

    async fn update_post(&self, post: &Post) -> Result<bool, Self::Error> {
        let mut state = self.state.write();
        Ok(match state.posts.get_mut(&post.id) {
            Some((_, stored)) => {
                *stored = post.clone();
                true
            }
            None => false,
        })
    }

    async fn delete_post(&self, id: &PostId) -> Result<bool, Self::Error> {
        let mut state = self.state.write();
        if state.posts.remove(id).is_none() {
            return Ok(false);
        }
        state.likes.remove(id);
        state.comments.retain(|_, (_, c)| c.post_id != *id);
        Ok(true)
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>, Self::Error> {
        let state = self.state.read();
        let followed = match query.filter {
            PostFilter::FollowedBy(user) => state.following.get(&user).cloned().unwrap_or_default(),
            _ => BTreeSet::new(),
        };

        let mut matching: Vec<&(u64, Post)> = state
            .posts
            .values()
            .filter(|(_, p)| match query.filter {
                PostFilter::All => true,
                PostFilter::Author(author) => p.author_id == author,
                PostFilter::FollowedBy(_) => followed.contains(&p.author_id),
            })
            .collect();

        // Newest first
        matching.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn toggle_like(&self, edge: LikeEdge) -> Result<Option<LikeToggle>, Self::Error> {
        let mut state = self.state.write();
        if !state.posts.contains_key(&edge.post) {
            return Ok(None);
        }
        state.require_user(&edge.user)?;

        let set = state.likes.entry(edge.post).or_default();
        let liked = if set.remove(&edge.user) {
            false
        } else {
            set.insert(edge.user);
            true
        };

        Ok(Some(LikeToggle {
            liked,
            like_count: state.like_count(&edge.post),
        }))
    }

    async fn like_counts(&self, posts: &[PostId]) -> Result<BTreeMap<PostId, u64>, Self::Error> {
        let state = self.state.read();
        Ok(posts.iter().map(|id| (*id, state.like_count(id))).collect())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), Self::Error> {
        let mut state = self.state.write();
        state.require_post(&comment.post_id)?;
        state.require_user(&comment.author_id)?;
        let seq = state.seq();
        state.comments.insert(comment.id, (seq, comment.clone()));
        Ok(())
    }

    async fn get_comment(&self, id: &CommentId) -> Result<Option<Comment>, Self::Error> {
        Ok(self.state.read().comments.get(id).map(|(_, c)| c.clone()))
    }

    async fn update_comment(&self, comment: &Comment) -> Result<bool, Self::Error> {
        let mut state = self.state.write();
        Ok(match state.comments.get_mut(&comment.id) {
            Some((_, stored)) => {
                stored.content = comment.content.clone();
                stored.edited_at = comment.edited_at;
                true
            }
            None => false,
        })
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<bool, Self::Error> {
        Ok(self.state.write().comments.remove(id).is_some())
    }

    async fn list_comments(&self, post: &PostId) -> Result<Vec<Comment>, Self::Error> {
        let state = self.state.read();
        let mut comments: Vec<&(u64, Comment)> = state
            .comments
            .values()
            .filter(|(_, c)| c.post_id == *post)
            .collect();
        comments.sort_by_key(|(seq, _)| *seq);
        Ok(comments.into_iter().map(|(_, c)| c.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn add_user(store: &InMemorySocialStore, name: &str) -> User {
        let insert = store
            .insert_user(NewUser {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password_hash: "hash".to_string(),
                is_staff: false,
            })
            .await
            .unwrap();
        match insert {
            UserInsert::Created(user) => user,
            other => panic!("unexpected insert outcome: {other:?}"),
        }
    }

    fn make_post(author: UserId, title: &str) -> Post {
        let now = Utc::now();
        Post {
            id: PostId::generate(),
            author_id: author,
            title: title.to_string(),
            description: "desc".to_string(),
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let store = InMemorySocialStore::new();
        add_user(&store, "alice").await;

        let dup_name = store
            .insert_user(NewUser {
                username: "alice".into(),
                email: "other@example.com".into(),
                password_hash: "h".into(),
                is_staff: false,
            })
            .await
            .unwrap();
        assert!(matches!(dup_name, UserInsert::UsernameTaken));

        let dup_email = store
            .insert_user(NewUser {
                username: "alice2".into(),
                email: "alice@example.com".into(),
                password_hash: "h".into(),
                is_staff: false,
            })
            .await
            .unwrap();
        assert!(matches!(dup_email, UserInsert::EmailTaken));
        assert_eq!(store.num_users(), 1);
    }

    #[tokio::test]
    async fn test_toggle_follow_maintains_both_indexes() {
        let store = InMemorySocialStore::new();
        let a = add_user(&store, "a").await;
        let b = add_user(&store, "b").await;

        let on = store.toggle_follow(FollowEdge::new(a.id, b.id)).await.unwrap();
        assert_eq!(on, FollowToggle { following: true, follower_count: 1 });
        assert_eq!(store.followers(&b.id).await.unwrap(), vec![a.id]);
        assert_eq!(store.following(&a.id).await.unwrap(), vec![b.id]);

        let off = store.toggle_follow(FollowEdge::new(a.id, b.id)).await.unwrap();
        assert_eq!(off, FollowToggle { following: false, follower_count: 0 });
        assert!(store.followers(&b.id).await.unwrap().is_empty());
        assert!(store.following(&a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_edge_rejected() {
        let store = InMemorySocialStore::new();
        let a = add_user(&store, "a").await;
        let err = store.toggle_follow(FollowEdge::new(a.id, a.id)).await.unwrap_err();
        assert!(matches!(err, InMemoryError::SelfEdge(_)));
        assert!(store.follow_edges().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_like_missing_post() {
        let store = InMemorySocialStore::new();
        let a = add_user(&store, "a").await;
        let result = store.toggle_like(LikeEdge::new(PostId::generate(), a.id)).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_list_posts_newest_first_and_feed() {
        let store = InMemorySocialStore::new();
        let a = add_user(&store, "a").await;
        let b = add_user(&store, "b").await;
        let c = add_user(&store, "c").await;

        let p1 = make_post(b.id, "first");
        let p2 = make_post(c.id, "second");
        let p3 = make_post(b.id, "third");
        for p in [&p1, &p2, &p3] {
            store.insert_post(p).await.unwrap();
        }

        let all = store
            .list_posts(&PostQuery::page(PostFilter::All, 1, 10))
            .await
            .unwrap();
        let titles: Vec<_> = all.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);

        store.toggle_follow(FollowEdge::new(a.id, b.id)).await.unwrap();
        let feed = store
            .list_posts(&PostQuery::page(PostFilter::FollowedBy(a.id), 1, 10))
            .await
            .unwrap();
        let titles: Vec<_> = feed.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "first"]);

        let page2 = store
            .list_posts(&PostQuery::page(PostFilter::Author(b.id), 2, 1))
            .await
            .unwrap();
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].title, "first");
    }

    #[tokio::test]
    async fn test_delete_post_cascades() {
        let store = InMemorySocialStore::new();
        let a = add_user(&store, "a").await;
        let post = make_post(a.id, "p");
        store.insert_post(&post).await.unwrap();
        store.toggle_like(LikeEdge::new(post.id, a.id)).await.unwrap();
        let comment = Comment::new(post.id, a.id, "hi".into());
        store.insert_comment(&comment).await.unwrap();

        assert!(store.delete_post(&post.id).await.unwrap());
        assert!(store.like_edges().is_empty());
        assert!(store.get_comment(&comment.id).await.unwrap().is_none());
        assert!(!store.delete_post(&post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_comment_requires_post() {
        let store = InMemorySocialStore::new();
        let a = add_user(&store, "a").await;
        let orphan = Comment::new(PostId::generate(), a.id, "hi".into());
        let err = store.insert_comment(&orphan).await.unwrap_err();
        assert!(matches!(err, InMemoryError::MissingReference("post", _)));
    }

    #[tokio::test]
    async fn test_profile_created_lazily_once() {
        let store = InMemorySocialStore::new();
        let a = add_user(&store, "a").await;
        let mut profile = store.get_or_create_profile(&a.id).await.unwrap();
        profile.bio = Some("hello".into());
        store.save_profile(&profile).await.unwrap();

        let again = store.get_or_create_profile(&a.id).await.unwrap();
        assert_eq!(again.bio.as_deref(), Some("hello"));
    }
}
