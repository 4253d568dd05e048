//! PostgreSQL social store for production use.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 2)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)
//! - `DB_MAX_LIFETIME_SECS`: Max connection lifetime (default: 1800)
//!
//! ## Toggles
//!
//! Follow and like toggles run inside one transaction each: delete the edge,
//! insert it if nothing was deleted (`ON CONFLICT DO NOTHING`), then count.
//! The composite primary keys make a duplicate edge impossible even when two
//! identical toggles race.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::types::{
    Comment, CommentId, FollowEdge, FollowToggle, LikeEdge, LikeToggle, NewUser, Post, PostFilter,
    PostId, PostQuery, Profile, User, UserId, UserInsert,
};
use super::SocialStore;

const USERNAME_CONSTRAINT: &str = "users_username_unique";
const EMAIL_CONSTRAINT: &str = "users_email_unique";

/// Schema bootstrap, one statement per entry.
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        username      VARCHAR(150) NOT NULL,
        email         VARCHAR(254) NOT NULL,
        password_hash TEXT NOT NULL,
        is_staff      BOOLEAN NOT NULL DEFAULT FALSE,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT users_username_unique UNIQUE (username),
        CONSTRAINT users_email_unique UNIQUE (email)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        user_id    UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
        avatar     VARCHAR(255),
        bio        TEXT,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS follows (
        follower_id  UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        following_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (follower_id, following_id),
        CONSTRAINT follows_no_self CHECK (follower_id <> following_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS follows_following_idx ON follows (following_id)",
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id          UUID PRIMARY KEY,
        seq         BIGSERIAL NOT NULL,
        author_id   UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title       VARCHAR(25) NOT NULL,
        description VARCHAR(100) NOT NULL,
        image       VARCHAR(255),
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS posts_author_seq_idx ON posts (author_id, seq DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS post_likes (
        post_id    UUID NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        user_id    UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (post_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id         UUID PRIMARY KEY,
        seq        BIGSERIAL NOT NULL,
        post_id    UUID NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        author_id  UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        content    VARCHAR(500) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        edited_at  TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS comments_post_seq_idx ON comments (post_id, seq)",
];

/// Configuration for PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum connections in pool (default: 10).
    pub max_connections: u32,
    /// Minimum idle connections to keep warm (default: 2).
    pub min_connections: u32,
    /// Connection acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds (default: 300 = 5 min).
    pub idle_timeout_secs: u64,
    /// Maximum connection lifetime in seconds (default: 1800 = 30 min).
    pub max_lifetime_secs: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Load configuration from environment variables with production defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/social_blog".to_string()),
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: env_or("DB_MIN_CONNECTIONS", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 1800),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// PostgreSQL social store.
pub struct PostgresSocialStore {
    pool: PgPool,
}

impl PostgresSocialStore {
    /// Create a new store with the given configuration.
    pub async fn new(config: PostgresConfig) -> Result<Self, PostgresError> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            idle_timeout_secs = config.idle_timeout_secs,
            max_lifetime_secs = config.max_lifetime_secs,
            "Initializing PostgreSQL connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a store from environment variables.
    pub async fn from_env() -> Result<Self, PostgresError> {
        Self::new(PostgresConfig::from_env()).await
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), PostgresError> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        tracing::info!(statements = SCHEMA.len(), "Database schema ensured");
        Ok(())
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get pool statistics for monitoring.
    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max: self.pool.options().get_max_connections(),
        }
    }

    fn parse_user_row(row: &PgRow) -> Result<User, sqlx::Error> {
        Ok(User {
            id: UserId::new(row.try_get("id")?),
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            is_staff: row.try_get("is_staff")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn parse_profile_row(row: &PgRow) -> Result<Profile, sqlx::Error> {
        Ok(Profile {
            user_id: UserId::new(row.try_get("user_id")?),
            avatar: row.try_get("avatar")?,
            bio: row.try_get("bio")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn parse_post_row(row: &PgRow) -> Result<Post, sqlx::Error> {
        Ok(Post {
            id: PostId::new(row.try_get("id")?),
            author_id: UserId::new(row.try_get("author_id")?),
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            image: row.try_get("image")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn parse_comment_row(row: &PgRow) -> Result<Comment, sqlx::Error> {
        let edited_at: Option<DateTime<Utc>> = row.try_get("edited_at")?;
        Ok(Comment {
            id: CommentId::new(row.try_get("id")?),
            post_id: PostId::new(row.try_get("post_id")?),
            author_id: UserId::new(row.try_get("author_id")?),
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            edited_at,
        })
    }

    fn parse_ids(rows: &[PgRow], column: &str) -> Result<Vec<UserId>, sqlx::Error> {
        rows.iter()
            .map(|row| row.try_get::<Uuid, _>(column).map(UserId::new))
            .collect()
    }
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolStats {
    /// Current pool size.
    pub size: u32,
    /// Number of idle connections.
    pub idle: usize,
    /// Maximum pool size.
    pub max: u32,
}

/// Error type for PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Attempted to persist a follow edge from an identity to itself.
    #[error("self-follow edge rejected for {0}")]
    SelfEdge(UserId),
}

fn count(n: i64) -> u64 {
    n.max(0) as u64
}

#[async_trait]
impl SocialStore for PostgresSocialStore {
    type Error = PostgresError;

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserInsert, Self::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, is_staff, created_at)
            VALUES ($1, $2, $3, $4, $5, now())
            RETURNING id, username, email, password_hash, is_staff, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(UserInsert::Created(Self::parse_user_row(&row)?)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                match db.constraint() {
                    Some(USERNAME_CONSTRAINT) => Ok(UserInsert::UsernameTaken),
                    Some(EMAIL_CONSTRAINT) => Ok(UserInsert::EmailTaken),
                    _ => Err(PostgresError::Database(sqlx::Error::Database(db))),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, Self::Error> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, is_staff, created_at FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(Self::parse_user_row(r)?)),
            None => Ok(None),
        }
    }

    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>, Self::Error> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, is_staff, created_at
            FROM users
            WHERE id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(Self::parse_user_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PostgresError::from)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Self::Error> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, is_staff, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(Self::parse_user_row(r)?)),
            None => Ok(None),
        }
    }

    async fn set_staff(&self, id: &UserId, is_staff: bool) -> Result<bool, Self::Error> {
        let result = sqlx::query("UPDATE users SET is_staff = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(is_staff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_or_create_profile(&self, user: &UserId) -> Result<Profile, Self::Error> {
        sqlx::query(
            "INSERT INTO profiles (user_id, updated_at) VALUES ($1, now()) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user.as_uuid())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT user_id, avatar, bio, updated_at FROM profiles WHERE user_id = $1")
            .bind(user.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(Self::parse_profile_row(&row)?)
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), Self::Error> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, avatar, bio, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id)
            DO UPDATE SET avatar = EXCLUDED.avatar, bio = EXCLUDED.bio, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(profile.user_id.as_uuid())
        .bind(&profile.avatar)
        .bind(&profile.bio)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn toggle_follow(&self, edge: FollowEdge) -> Result<FollowToggle, Self::Error> {
        if edge.is_self_edge() {
            return Err(PostgresError::SelfEdge(edge.follower));
        }

        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
            .bind(edge.follower.as_uuid())
            .bind(edge.following.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            sqlx::query(
                r#"
                INSERT INTO follows (follower_id, following_id)
                VALUES ($1, $2)
                ON CONFLICT (follower_id, following_id) DO NOTHING
                "#,
            )
            .bind(edge.follower.as_uuid())
            .bind(edge.following.as_uuid())
            .execute(&mut *tx)
            .await?;
        }

        let followers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE following_id = $1")
            .bind(edge.following.as_uuid())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(FollowToggle {
            following: deleted == 0,
            follower_count: count(followers),
        })
    }

    async fn is_following(&self, edge: FollowEdge) -> Result<bool, Self::Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(edge.follower.as_uuid())
        .bind(edge.following.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn follower_count(&self, user: &UserId) -> Result<u64, Self::Error> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE following_id = $1")
            .bind(user.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(count(n))
    }

    async fn following_count(&self, user: &UserId) -> Result<u64, Self::Error> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
            .bind(user.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(count(n))
    }

    async fn followers(&self, user: &UserId) -> Result<Vec<UserId>, Self::Error> {
        let rows = sqlx::query(
            "SELECT follower_id FROM follows WHERE following_id = $1 ORDER BY follower_id",
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(Self::parse_ids(&rows, "follower_id")?)
    }

    async fn following(&self, user: &UserId) -> Result<Vec<UserId>, Self::Error> {
        let rows = sqlx::query(
            "SELECT following_id FROM follows WHERE follower_id = $1 ORDER BY following_id",
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(Self::parse_ids(&rows, "following_id")?)
    }

    async fn insert_post(&self, post: &Post) -> Result<(), Self::Error> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, title, description, image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(post.id.as_uuid())
        .bind(post.author_id.as_uuid())
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.image)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_post(&self, id: &PostId) -> Result<Option<Post>, Self::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, author_id, title, description, image, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(Self::parse_post_row(r)?)),
            None => Ok(None),
        }
    }

    async fn update_post(&self, post: &Post) -> Result<bool, Self::Error> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = $2, description = $3, image = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(post.id.as_uuid())
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.image)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, id: &PostId) -> Result<bool, Self::Error> {
        // likes and comments go with the post via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>, Self::Error> {
        const COLUMNS: &str =
            "SELECT p.id, p.author_id, p.title, p.description, p.image, p.created_at, p.updated_at FROM posts p";

        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);

        let rows = match query.filter {
            PostFilter::All => {
                let sql = format!("{COLUMNS} ORDER BY p.seq DESC LIMIT $1 OFFSET $2");
                sqlx::query(&sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
            PostFilter::Author(author) => {
                let sql = format!(
                    "{COLUMNS} WHERE p.author_id = $1 ORDER BY p.seq DESC LIMIT $2 OFFSET $3"
                );
                sqlx::query(&sql)
                .bind(author.as_uuid())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            PostFilter::FollowedBy(viewer) => {
                let sql = format!(
                    "{COLUMNS} JOIN follows f ON f.following_id = p.author_id \
                     WHERE f.follower_id = $1 ORDER BY p.seq DESC LIMIT $2 OFFSET $3"
                );
                sqlx::query(&sql)
                .bind(viewer.as_uuid())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter()
            .map(Self::parse_post_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PostgresError::from)
    }

    async fn toggle_like(&self, edge: LikeEdge) -> Result<Option<LikeToggle>, Self::Error> {
        let mut tx = self.pool.begin().await?;

        // Lock the post row so a concurrent delete cannot interleave.
        let post_exists = sqlx::query("SELECT 1 FROM posts WHERE id = $1 FOR SHARE")
            .bind(edge.post.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !post_exists {
            tx.rollback().await?;
            return Ok(None);
        }

        let deleted = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(edge.post.as_uuid())
            .bind(edge.user.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            sqlx::query(
                r#"
                INSERT INTO post_likes (post_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (post_id, user_id) DO NOTHING
                "#,
            )
            .bind(edge.post.as_uuid())
            .bind(edge.user.as_uuid())
            .execute(&mut *tx)
            .await?;
        }

        let likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
            .bind(edge.post.as_uuid())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(LikeToggle {
            liked: deleted == 0,
            like_count: count(likes),
        }))
    }

    async fn like_counts(&self, posts: &[PostId]) -> Result<BTreeMap<PostId, u64>, Self::Error> {
        let uuids: Vec<Uuid> = posts.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query(
            r#"
            SELECT post_id, COUNT(*) AS likes
            FROM post_likes
            WHERE post_id = ANY($1)
            GROUP BY post_id
            "#,
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await?;

        let mut counts: BTreeMap<PostId, u64> = posts.iter().map(|id| (*id, 0)).collect();
        for row in &rows {
            let post: Uuid = row.try_get("post_id")?;
            let likes: i64 = row.try_get("likes")?;
            counts.insert(PostId::new(post), count(likes));
        }
        Ok(counts)
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), Self::Error> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, post_id, author_id, content, created_at, edited_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(comment.id.as_uuid())
        .bind(comment.post_id.as_uuid())
        .bind(comment.author_id.as_uuid())
        .bind(&comment.content)
        .bind(comment.created_at)
        .bind(comment.edited_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_comment(&self, id: &CommentId) -> Result<Option<Comment>, Self::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, post_id, author_id, content, created_at, edited_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(Self::parse_comment_row(r)?)),
            None => Ok(None),
        }
    }

    async fn update_comment(&self, comment: &Comment) -> Result<bool, Self::Error> {
        let result = sqlx::query("UPDATE comments SET content = $2, edited_at = $3 WHERE id = $1")
            .bind(comment.id.as_uuid())
            .bind(&comment.content)
            .bind(comment.edited_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<bool, Self::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, post: &PostId) -> Result<Vec<Comment>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, author_id, content, created_at, edited_at
            FROM comments
            WHERE post_id = $1
            ORDER BY seq
            "#,
        )
        .bind(post.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(Self::parse_comment_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PostgresError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_are_idempotent() {
        for statement in SCHEMA {
            let s = statement.trim_start();
            assert!(
                s.starts_with("CREATE TABLE IF NOT EXISTS") || s.starts_with("CREATE INDEX IF NOT EXISTS"),
                "non-idempotent statement: {s}"
            );
        }
    }

    #[test]
    fn test_unique_constraints_are_named() {
        let users = SCHEMA[0];
        assert!(users.contains(USERNAME_CONSTRAINT));
        assert!(users.contains(EMAIL_CONSTRAINT));
    }

    #[test]
    fn test_count_clamps_negative() {
        assert_eq!(count(-1), 0);
        assert_eq!(count(7), 7);
    }
}
