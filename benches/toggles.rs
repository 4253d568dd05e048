//! Performance benchmarks for toggles and bearer tokens.
//!
//! Run with: `cargo bench --bench toggles`
//!
//! All toggles run against the in-memory store, so the numbers measure the
//! domain layer plus lock contention, not a database round trip.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use chrono::{Duration, Utc};
use social_blog::store::InMemorySocialStore;
use social_blog::{
    AuthToken, Engagement, NewUser, Post, PostId, SocialGraph, SocialStore, UserId, UserInsert,
};
use uuid::Uuid;

const SECRET: &[u8] = b"bench_secret_32_bytes_long_value";

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

async fn seed_users(store: &InMemorySocialStore, n: usize) -> Vec<UserId> {
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let insert = store
            .insert_user(NewUser {
                username: format!("bench{i}"),
                email: format!("bench{i}@example.com"),
                password_hash: "x".into(),
                is_staff: false,
            })
            .await
            .expect("insert user");
        if let UserInsert::Created(user) = insert {
            ids.push(user.id);
        }
    }
    ids
}

/// Benchmark follow toggles on graphs of increasing size.
fn bench_follow_toggle(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("follow_toggle");
    group.throughput(Throughput::Elements(1));

    for size in [10usize, 100, 1000] {
        let store = Arc::new(InMemorySocialStore::new());
        let users = rt.block_on(seed_users(&store, size));
        let graph = SocialGraph::new(Arc::clone(&store));

        // Everyone follows user 0 first so the target has a large follower set.
        rt.block_on(async {
            for u in &users[1..] {
                graph.toggle_follow(u, &users[0]).await.expect("seed follow");
            }
        });

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                rt.block_on(graph.toggle_follow(black_box(&users[1]), black_box(&users[0])))
                    .expect("toggle")
            })
        });
    }
    group.finish();
}

/// Benchmark like toggles on a single post.
fn bench_like_toggle(c: &mut Criterion) {
    let rt = runtime();
    let store = Arc::new(InMemorySocialStore::new());
    let users = rt.block_on(seed_users(&store, 2));
    let now = Utc::now();
    let post = Post {
        id: PostId::generate(),
        author_id: users[0],
        title: "bench".into(),
        description: "bench".into(),
        image: None,
        created_at: now,
        updated_at: now,
    };
    rt.block_on(store.insert_post(&post)).expect("insert post");
    let engagement = Engagement::new(Arc::clone(&store));

    c.bench_function("like_toggle", |b| {
        b.iter(|| {
            rt.block_on(engagement.toggle_like(black_box(&users[1]), black_box(&post.id)))
                .expect("toggle")
        })
    });
}

/// Benchmark bearer token issue and verification.
fn bench_tokens(c: &mut Criterion) {
    let user = UserId::new(Uuid::from_u128(7));
    let now = Utc::now();
    let token = AuthToken::issue_hmac(SECRET, &user, now);

    c.bench_function("token_issue", |b| {
        b.iter(|| AuthToken::issue_hmac(black_box(SECRET), black_box(&user), now))
    });

    c.bench_function("token_verify", |b| {
        b.iter(|| {
            black_box(&token)
                .verify_hmac(SECRET, now, Duration::hours(24))
                .expect("valid token")
        })
    });
}

criterion_group!(benches, bench_follow_toggle, bench_like_toggle, bench_tokens);
criterion_main!(benches);
