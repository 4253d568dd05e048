//! Social graph operations.
//!
//! Follow is a toggle relation between two identities. The toggle itself runs
//! as one atomic unit in the store; this layer owns the domain checks.

use std::sync::Arc;

use crate::error::{SocialError, SocialResult};
use crate::store::SocialStore;
use crate::types::{FollowEdge, FollowStats, FollowToggle, UserId, UserSummary};

/// Follow graph over a social store.
pub struct SocialGraph<S: SocialStore> {
    store: Arc<S>,
}

impl<S: SocialStore + 'static> SocialGraph<S> {
    /// Create a graph view over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Toggle whether `follower` follows `target`.
    ///
    /// Self-follow is rejected before the store is consulted.
    pub async fn toggle_follow(
        &self,
        follower: &UserId,
        target: &UserId,
    ) -> SocialResult<FollowToggle> {
        if follower == target {
            return Err(SocialError::validation("you cannot follow yourself"));
        }
        self.require_user(target).await?;

        let outcome = self
            .store
            .toggle_follow(FollowEdge::new(*follower, *target))
            .await
            .map_err(SocialError::from_store)?;

        tracing::debug!(
            follower = %follower,
            target = %target,
            following = outcome.following,
            follower_count = outcome.follower_count,
            "Follow toggled"
        );
        Ok(outcome)
    }

    /// Identities following `user`.
    pub async fn followers(&self, user: &UserId) -> SocialResult<Vec<UserSummary>> {
        self.require_user(user).await?;
        let ids = self.store.followers(user).await.map_err(SocialError::from_store)?;
        self.summaries(&ids).await
    }

    /// Identities `user` follows.
    pub async fn following(&self, user: &UserId) -> SocialResult<Vec<UserSummary>> {
        self.require_user(user).await?;
        let ids = self.store.following(user).await.map_err(SocialError::from_store)?;
        self.summaries(&ids).await
    }

    /// Follow relationship between `viewer` and `user`.
    pub async fn stats(&self, viewer: &UserId, user: &UserId) -> SocialResult<FollowStats> {
        self.require_user(user).await?;
        let store = &self.store;

        let followers_count = store.follower_count(user).await.map_err(SocialError::from_store)?;
        let following_count = store.following_count(user).await.map_err(SocialError::from_store)?;
        let (is_following, is_followed_by) = if viewer == user {
            (false, false)
        } else {
            (
                store
                    .is_following(FollowEdge::new(*viewer, *user))
                    .await
                    .map_err(SocialError::from_store)?,
                store
                    .is_following(FollowEdge::new(*user, *viewer))
                    .await
                    .map_err(SocialError::from_store)?,
            )
        };

        Ok(FollowStats {
            followers_count,
            following_count,
            is_following,
            is_followed_by,
        })
    }

    async fn require_user(&self, id: &UserId) -> SocialResult<()> {
        match self.store.get_user(id).await.map_err(SocialError::from_store)? {
            Some(_) => Ok(()),
            None => Err(SocialError::NotFound("user")),
        }
    }

    async fn summaries(&self, ids: &[UserId]) -> SocialResult<Vec<UserSummary>> {
        let users = self.store.get_users(ids).await.map_err(SocialError::from_store)?;
        Ok(users.iter().map(|u| u.summary()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySocialStore;
    use crate::types::{NewUser, UserInsert};

    async fn user(store: &InMemorySocialStore, name: &str) -> UserId {
        match store
            .insert_user(NewUser {
                username: name.into(),
                email: format!("{name}@example.com"),
                password_hash: "x".into(),
                is_staff: false,
            })
            .await
            .unwrap()
        {
            UserInsert::Created(u) => u.id,
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_follow_then_unfollow() {
        let store = Arc::new(InMemorySocialStore::new());
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        let graph = SocialGraph::new(store);

        let first = graph.toggle_follow(&a, &b).await.unwrap();
        assert!(first.following);
        assert_eq!(first.follower_count, 1);

        let second = graph.toggle_follow(&a, &b).await.unwrap();
        assert!(!second.following);
        assert_eq!(second.follower_count, 0);
    }

    #[tokio::test]
    async fn test_self_follow_is_validation_error() {
        let store = Arc::new(InMemorySocialStore::new());
        let a = user(&store, "a").await;
        let graph = SocialGraph::new(store.clone());

        let err = graph.toggle_follow(&a, &a).await.unwrap_err();
        assert!(matches!(err, SocialError::Validation(_)));
        assert_eq!(err.to_string(), "you cannot follow yourself");
        assert!(store.follow_edges().is_empty());
    }

    #[tokio::test]
    async fn test_self_follow_rejected_even_for_unknown_id() {
        let graph = SocialGraph::new(Arc::new(InMemorySocialStore::new()));
        let ghost = UserId::generate();
        let err = graph.toggle_follow(&ghost, &ghost).await.unwrap_err();
        assert!(matches!(err, SocialError::Validation(_)));
    }

    #[tokio::test]
    async fn test_follow_missing_target() {
        let store = Arc::new(InMemorySocialStore::new());
        let a = user(&store, "a").await;
        let graph = SocialGraph::new(store);
        let err = graph.toggle_follow(&a, &UserId::generate()).await.unwrap_err();
        assert!(matches!(err, SocialError::NotFound("user")));
    }

    #[tokio::test]
    async fn test_listings_and_stats() {
        let store = Arc::new(InMemorySocialStore::new());
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        let c = user(&store, "c").await;
        let graph = SocialGraph::new(store);

        graph.toggle_follow(&a, &c).await.unwrap();
        graph.toggle_follow(&b, &c).await.unwrap();
        graph.toggle_follow(&c, &a).await.unwrap();

        let mut names: Vec<_> = graph
            .followers(&c)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.username)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);

        let following = graph.following(&c).await.unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].username, "a");

        let stats = graph.stats(&a, &c).await.unwrap();
        assert_eq!(stats.followers_count, 2);
        assert_eq!(stats.following_count, 1);
        assert!(stats.is_following);
        assert!(stats.is_followed_by);
    }
}
