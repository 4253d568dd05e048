//! Service configuration read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `8080` |
//! | `AUTH_TOKEN_SECRET` | development secret (logged warning) |
//! | `AUTH_TOKEN_TTL_HOURS` | `24` |
//! | `POSTS_PER_PAGE` | `20` |
//! | `STORE_BACKEND` | `postgres` if `DATABASE_URL` is set, else `memory` |
//! | `LOG_FORMAT` | `json` |
//! | `BOOTSTRAP_ADMIN_USERNAME` / `_EMAIL` / `_PASSWORD` | unset |
//!
//! Postgres pool settings are read separately by `PostgresConfig`.

use crate::accounts::DEFAULT_TOKEN_TTL_HOURS;
use crate::posts::DEFAULT_POSTS_PER_PAGE;

const DEVELOPMENT_SECRET: &[u8] = b"development_only_secret_not_for_production";

/// Upper bound for `AUTH_TOKEN_TTL_HOURS` (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Which storage backend the service runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL via `DATABASE_URL`.
    Postgres,
    /// Process-local in-memory store.
    Memory,
}

impl StoreBackend {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "memory" | "in-memory" | "inmemory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

/// Credentials for the privileged account created at startup.
#[derive(Clone)]
pub struct AdminBootstrap {
    /// Username.
    pub username: String,
    /// Email.
    pub email: String,
    /// Plain-text password, hashed before storage.
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Token signing key.
    pub token_secret: Vec<u8>,
    /// Token lifetime in hours.
    pub token_ttl_hours: i64,
    /// Page size for post listings.
    pub posts_per_page: usize,
    /// Storage backend.
    pub store_backend: StoreBackend,
    /// Log output format.
    pub log_format: LogFormat,
    /// Privileged account to ensure at startup.
    pub bootstrap_admin: Option<AdminBootstrap>,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let token_secret = env_nonempty("AUTH_TOKEN_SECRET")
            .map(String::into_bytes)
            .unwrap_or_else(|| {
                tracing::warn!(
                    "AUTH_TOKEN_SECRET not set, using development secret. \
                     Set this for production!"
                );
                DEVELOPMENT_SECRET.to_vec()
            });

        let store_backend = env_nonempty("STORE_BACKEND")
            .and_then(|s| {
                let parsed = StoreBackend::parse(&s);
                if parsed.is_none() {
                    tracing::warn!(value = %s, "Unknown STORE_BACKEND, falling back to default");
                }
                parsed
            })
            .unwrap_or(if env_nonempty("DATABASE_URL").is_some() {
                StoreBackend::Postgres
            } else {
                StoreBackend::Memory
            });

        let log_format = match env_nonempty("LOG_FORMAT").as_deref() {
            Some("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        };

        let bootstrap_admin = match (
            env_nonempty("BOOTSTRAP_ADMIN_USERNAME"),
            env_nonempty("BOOTSTRAP_ADMIN_EMAIL"),
            env_nonempty("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(email), Some(password)) => Some(AdminBootstrap {
                username,
                email,
                password,
            }),
            _ => None,
        };

        Self {
            host: env_nonempty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: env_parse("PORT", 8080),
            token_secret,
            token_ttl_hours: clamp_ttl_hours(env_parse(
                "AUTH_TOKEN_TTL_HOURS",
                DEFAULT_TOKEN_TTL_HOURS,
            )),
            posts_per_page: env_parse("POSTS_PER_PAGE", DEFAULT_POSTS_PER_PAGE).max(1),
            store_backend,
            log_format,
            bootstrap_admin,
        }
    }

    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn clamp_ttl_hours(hours: i64) -> i64 {
    if hours > MAX_TOKEN_TTL_HOURS {
        tracing::warn!(
            requested = hours,
            max = MAX_TOKEN_TTL_HOURS,
            "AUTH_TOKEN_TTL_HOURS too large, capping"
        );
    }
    hours.clamp(1, MAX_TOKEN_TTL_HOURS)
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            token_secret: DEVELOPMENT_SECRET.to_vec(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            posts_per_page: DEFAULT_POSTS_PER_PAGE,
            store_backend: StoreBackend::Memory,
            log_format: LogFormat::Json,
            bootstrap_admin: None,
        }
    }
}
