//! Profile viewing and editing.

use std::sync::Arc;

use chrono::Utc;

use crate::access::Requester;
use crate::error::{SocialError, SocialResult};
use crate::store::SocialStore;
use crate::types::{FollowEdge, ProfileChanges, ProfileView, User, UserId};
use crate::validation::{normalize_reference, validate_bio};

/// Profile operations over a social store.
pub struct Profiles<S: SocialStore> {
    store: Arc<S>,
}

impl<S: SocialStore + 'static> Profiles<S> {
    /// Create profile operations over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Profile of `user` as seen by `viewer`. A blank profile is created on
    /// first access.
    pub async fn view(&self, viewer: &UserId, user: &UserId) -> SocialResult<ProfileView> {
        let owner = self.load_user(user).await?;
        let store = &self.store;

        let profile = store
            .get_or_create_profile(user)
            .await
            .map_err(SocialError::from_store)?;
        let followers_count = store.follower_count(user).await.map_err(SocialError::from_store)?;
        let following_count = store.following_count(user).await.map_err(SocialError::from_store)?;
        let is_following = viewer != user
            && store
                .is_following(FollowEdge::new(*viewer, *user))
                .await
                .map_err(SocialError::from_store)?;

        Ok(ProfileView {
            user_id: owner.id,
            username: owner.username,
            avatar: profile.avatar,
            bio: profile.bio,
            followers_count,
            following_count,
            is_following,
        })
    }

    /// Edit the profile of `user`. Owner or privileged only.
    ///
    /// A blank bio or avatar clears the field.
    pub async fn update(
        &self,
        requester: &Requester,
        user: &UserId,
        changes: ProfileChanges,
    ) -> SocialResult<ProfileView> {
        self.load_user(user).await?;
        requester.assert_can_modify(user, "profile")?;

        let mut profile = self
            .store
            .get_or_create_profile(user)
            .await
            .map_err(SocialError::from_store)?;

        if let Some(bio) = changes.bio {
            let bio = bio.trim();
            validate_bio(bio)?;
            profile.bio = (!bio.is_empty()).then(|| bio.to_string());
        }
        if changes.avatar.is_some() {
            profile.avatar = normalize_reference("avatar", changes.avatar)?;
        }
        profile.updated_at = Utc::now();

        self.store
            .save_profile(&profile)
            .await
            .map_err(SocialError::from_store)?;
        tracing::info!(user = %user, requester = %requester.id, "Profile updated");

        self.view(&requester.id, user).await
    }

    async fn load_user(&self, id: &UserId) -> SocialResult<User> {
        self.store
            .get_user(id)
            .await
            .map_err(SocialError::from_store)?
            .ok_or(SocialError::NotFound("user"))
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
    async fn test_view_creates_blank_profile() {
        let store = Arc::new(InMemorySocialStore::new());
        let a = user(&store, "a").await;
        let profiles = Profiles::new(store);

        let view = profiles.view(&a, &a).await.unwrap();
        assert_eq!(view.username, "a");
        assert!(view.bio.is_none());
        assert_eq!(view.followers_count, 0);
        assert!(!view.is_following);
    }

    #[tokio::test]
    async fn test_view_reports_follow_state() {
        let store = Arc::new(InMemorySocialStore::new());
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        store.toggle_follow(FollowEdge::new(a, b)).await.unwrap();
        let profiles = Profiles::new(store);

        let view = profiles.view(&a, &b).await.unwrap();
        assert!(view.is_following);
        assert_eq!(view.followers_count, 1);
        assert_eq!(profiles.view(&b, &a).await.unwrap().following_count, 1);
    }

    #[tokio::test]
    async fn test_update_gate_and_bio_limit() {
        let store = Arc::new(InMemorySocialStore::new());
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        let profiles = Profiles::new(store);

        let changes = ProfileChanges {
            bio: Some("hi there".into()),
            avatar: None,
        };
        let denied = profiles.update(&Requester::member(b), &a, changes.clone()).await;
        assert!(matches!(denied, Err(SocialError::PermissionDenied(_))));

        let updated = profiles.update(&Requester::member(a), &a, changes).await.unwrap();
        assert_eq!(updated.bio.as_deref(), Some("hi there"));

        let too_long = ProfileChanges {
            bio: Some("b".repeat(301)),
            avatar: None,
        };
        assert!(matches!(
            profiles.update(&Requester::member(a), &a, too_long).await,
            Err(SocialError::Validation(_))
        ));

        let cleared = profiles
            .update(
                &Requester::staff(b),
                &a,
                ProfileChanges {
                    bio: Some("  ".into()),
                    avatar: Some("avatars/a.png".into()),
                },
            )
            .await
            .unwrap();
        assert!(cleared.bio.is_none());
        assert_eq!(cleared.avatar.as_deref(), Some("avatars/a.png"));
    }

    #[tokio::test]
    async fn test_missing_user() {
        let profiles = Profiles::new(Arc::new(InMemorySocialStore::new()));
        let ghost = UserId::generate();
        assert!(matches!(
            profiles.view(&ghost, &ghost).await,
            Err(SocialError::NotFound("user"))
        ));
    }
}
