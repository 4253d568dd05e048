//! Domain scenarios for follows, likes and comments.
//!
//! Runs against the in-memory store: toggle laws, ownership gates and
//! concurrent toggles on the same pair.

use std::sync::Arc;

use proptest::prelude::*;
use social_blog::store::InMemorySocialStore;
use social_blog::{
    Engagement, NewPost, NewUser, PostId, Posts, Requester, SocialError, SocialGraph,
    SocialStore, UserId, UserInsert,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

async fn add_user(store: &InMemorySocialStore, name: &str) -> UserId {
    let insert = store
        .insert_user(NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            is_staff: false,
        })
        .await
        .unwrap();
    match insert {
        UserInsert::Created(user) => user.id,
        other => panic!("could not create {name}: {other:?}"),
    }
}

async fn add_users(store: &InMemorySocialStore, n: usize) -> Vec<UserId> {
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        ids.push(add_user(store, &format!("user{i}")).await);
    }
    ids
}

async fn add_post(store: &Arc<InMemorySocialStore>, author: &UserId) -> PostId {
    Posts::new(Arc::clone(store), 20)
        .create(
            author,
            NewPost {
                title: "A post".into(),
                description: "Something to like".into(),
                image: None,
            },
        )
        .await
        .unwrap()
        .post
        .id
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn follow_scenario_zero_one_zero() {
    let store = Arc::new(InMemorySocialStore::new());
    let a = add_user(&store, "a").await;
    let b = add_user(&store, "b").await;
    let graph = SocialGraph::new(Arc::clone(&store));

    assert_eq!(store.follower_count(&b).await.unwrap(), 0);

    let on = graph.toggle_follow(&a, &b).await.unwrap();
    assert!(on.following);
    assert_eq!(on.follower_count, 1);

    let off = graph.toggle_follow(&a, &b).await.unwrap();
    assert!(!off.following);
    assert_eq!(off.follower_count, 0);
    assert!(store.follow_edges().is_empty());
}

#[tokio::test]
async fn like_scenario_zero_one_zero() {
    let store = Arc::new(InMemorySocialStore::new());
    let author = add_user(&store, "author").await;
    let fan = add_user(&store, "fan").await;
    let post = add_post(&store, &author).await;
    let engagement = Engagement::new(Arc::clone(&store));

    let on = engagement.toggle_like(&fan, &post).await.unwrap();
    assert!(on.liked);
    assert_eq!(on.like_count, 1);

    let off = engagement.toggle_like(&fan, &post).await.unwrap();
    assert!(!off.liked);
    assert_eq!(off.like_count, 0);
}

#[tokio::test]
async fn self_follow_always_fails() {
    let store = Arc::new(InMemorySocialStore::new());
    let a = add_user(&store, "a").await;
    let b = add_user(&store, "b").await;
    let graph = SocialGraph::new(Arc::clone(&store));

    graph.toggle_follow(&b, &a).await.unwrap();
    for _ in 0..3 {
        let err = graph.toggle_follow(&a, &a).await.unwrap_err();
        assert!(matches!(err, SocialError::Validation(_)));
    }
    assert_eq!(store.follower_count(&a).await.unwrap(), 1);
}

#[tokio::test]
async fn comment_length_boundaries() {
    let store = Arc::new(InMemorySocialStore::new());
    let author = add_user(&store, "author").await;
    let post = add_post(&store, &author).await;
    let engagement = Engagement::new(Arc::clone(&store));

    for bad in ["", "   ", "\n\t"] {
        let err = engagement.add_comment(&post, &author, bad).await.unwrap_err();
        assert_eq!(err.to_string(), "comment cannot be empty");
    }
    assert!(engagement.add_comment(&post, &author, &"c".repeat(500)).await.is_ok());
    let err = engagement
        .add_comment(&post, &author, &"c".repeat(501))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "comment cannot exceed 500 characters");
}

#[tokio::test]
async fn foreign_delete_leaves_comment_intact() {
    let store = Arc::new(InMemorySocialStore::new());
    let author = add_user(&store, "author").await;
    let stranger = add_user(&store, "stranger").await;
    let post = add_post(&store, &author).await;
    let engagement = Engagement::new(Arc::clone(&store));

    let comment = engagement.add_comment(&post, &author, "keep me").await.unwrap();
    let err = engagement
        .delete_comment(&comment.id, &Requester::member(stranger))
        .await
        .unwrap_err();
    assert!(matches!(err, SocialError::PermissionDenied(_)));

    let listed = engagement.comments_for(&post).await.unwrap();
    assert_eq!(listed, vec![comment]);
}

#[tokio::test]
async fn deleting_post_drops_likes_and_comments() {
    let store = Arc::new(InMemorySocialStore::new());
    let author = add_user(&store, "author").await;
    let fan = add_user(&store, "fan").await;
    let post = add_post(&store, &author).await;
    let engagement = Engagement::new(Arc::clone(&store));

    engagement.toggle_like(&fan, &post).await.unwrap();
    let comment = engagement.add_comment(&post, &fan, "nice").await.unwrap();

    Posts::new(Arc::clone(&store), 20)
        .delete(&post, &Requester::member(author))
        .await
        .unwrap();

    assert!(store.like_edges().is_empty());
    assert!(matches!(
        engagement.get_comment(&comment.id).await,
        Err(SocialError::NotFound("comment"))
    ));
    assert!(matches!(
        engagement.toggle_like(&fan, &post).await,
        Err(SocialError::NotFound("post"))
    ));
}

// ─────────────────────────────────────────────────────────────────────────────
// Concurrency
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_follow_toggles_never_duplicate() {
    let store = Arc::new(InMemorySocialStore::new());
    let a = add_user(&store, "a").await;
    let b = add_user(&store, "b").await;

    for tasks in [2usize, 7, 16] {
        let handles: Vec<_> = (0..tasks)
            .map(|_| {
                let graph = SocialGraph::new(Arc::clone(&store));
                tokio::spawn(async move { graph.toggle_follow(&a, &b).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let edges = store.follow_edges();
        assert!(edges.len() <= 1, "duplicate follow edge after {tasks} toggles");
        let count = store.follower_count(&b).await.unwrap();
        assert_eq!(count as usize, edges.len());
    }

    // 2 + 7 + 16 toggles is odd: exactly one edge remains
    assert_eq!(store.follow_edges().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_like_toggles_keep_count_exact() {
    let store = Arc::new(InMemorySocialStore::new());
    let users = add_users(&store, 8).await;
    let post = add_post(&store, &users[0]).await;

    // Every user toggles three times, concurrently with everyone else.
    let handles: Vec<_> = users
        .iter()
        .flat_map(|u| std::iter::repeat(*u).take(3))
        .map(|user| {
            let engagement = Engagement::new(Arc::clone(&store));
            tokio::spawn(async move { engagement.toggle_like(&user, &post).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let counts = store.like_counts(&[post]).await.unwrap();
    assert_eq!(counts[&post], users.len() as u64);
    assert_eq!(store.like_edges().len(), users.len());
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn like_count_matches_odd_toggle_parity(toggles in prop::collection::vec(0usize..5, 0..40)) {
        runtime().block_on(async {
            let store = Arc::new(InMemorySocialStore::new());
            let users = add_users(&store, 5).await;
            let post = add_post(&store, &users[0]).await;
            let engagement = Engagement::new(Arc::clone(&store));

            let mut parity = [false; 5];
            let mut last = None;
            for &i in &toggles {
                let outcome = engagement.toggle_like(&users[i], &post).await.unwrap();
                parity[i] = !parity[i];
                prop_assert_eq!(outcome.liked, parity[i]);
                last = Some(outcome.like_count);
            }

            let expected = parity.iter().filter(|p| **p).count() as u64;
            prop_assert_eq!(last.unwrap_or(0), expected);
            prop_assert_eq!(store.like_counts(&[post]).await.unwrap()[&post], expected);
            Ok(())
        })?;
    }

    #[test]
    fn follow_toggle_twice_is_identity(
        setup in prop::collection::vec((0usize..4, 0usize..4), 0..20),
        pair in (0usize..4, 0usize..4),
    ) {
        prop_assume!(pair.0 != pair.1);
        runtime().block_on(async {
            let store = Arc::new(InMemorySocialStore::new());
            let users = add_users(&store, 4).await;
            let graph = SocialGraph::new(Arc::clone(&store));

            for (f, t) in setup.into_iter().filter(|(f, t)| f != t) {
                graph.toggle_follow(&users[f], &users[t]).await.unwrap();
            }

            let (f, t) = (users[pair.0], users[pair.1]);
            let edges_before = store.follow_edges();
            let count_before = store.follower_count(&t).await.unwrap();

            let first = graph.toggle_follow(&f, &t).await.unwrap();
            let second = graph.toggle_follow(&f, &t).await.unwrap();

            prop_assert_eq!(first.following, !second.following);
            prop_assert_eq!(second.follower_count, count_before);
            prop_assert_eq!(store.follow_edges(), edges_before);
            Ok(())
        })?;
    }
}
