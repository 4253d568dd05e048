//! Registration, credential checks and bearer tokens.

use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use rand::rngs::OsRng;

use crate::access::Requester;
use crate::error::{SocialError, SocialResult};
use crate::store::SocialStore;
use crate::types::{AuthToken, NewUser, User, UserInsert};
use crate::validation::{normalize_email, validate_password, validate_username};

/// Default token lifetime in hours.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Hash a password into an argon2 PHC string with a random salt.
pub fn hash_password(password: &str) -> SocialResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SocialError::Store(format!("failed to hash password: {e}")))
}

/// Check `password` against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Account operations over a social store.
///
/// Holds the token signing secret; nothing outside this type needs it.
pub struct Accounts<S: SocialStore> {
    store: Arc<S>,
    secret: Arc<Vec<u8>>,
    ttl: Duration,
}

impl<S: SocialStore + 'static> Accounts<S> {
    /// Create account operations.
    ///
    /// # Arguments
    /// * `store` - The social store backend
    /// * `secret` - Token signing key (32+ bytes recommended)
    /// * `ttl` - Token lifetime
    pub fn new(store: Arc<S>, secret: Arc<Vec<u8>>, ttl: Duration) -> Self {
        Self { store, secret, ttl }
    }

    /// Create a regular identity.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> SocialResult<User> {
        self.create(username, email, password, false).await
    }

    /// Return the identity matching the credentials, if any.
    pub async fn authenticate(&self, username: &str, password: &str) -> SocialResult<Option<User>> {
        let user = self
            .store
            .find_user_by_username(username)
            .await
            .map_err(SocialError::from_store)?;

        Ok(user.filter(|u| verify_password(password, &u.password_hash)))
    }

    /// Sign a bearer token for `user`.
    pub fn issue_token(&self, user: &User) -> AuthToken {
        AuthToken::issue_hmac(&self.secret, &user.id, Utc::now())
    }

    /// Resolve a presented bearer token to the identity it names.
    ///
    /// The identity must still exist; its privileged flag is read fresh.
    pub async fn resolve_token(&self, raw: &str) -> SocialResult<Requester> {
        let user_id = AuthToken::from_string(raw.to_string())
            .verify_hmac(&self.secret, Utc::now(), self.ttl)
            .map_err(|e| {
                tracing::debug!(error = %e, "Bearer token rejected");
                SocialError::Unauthenticated
            })?;

        let user = self
            .store
            .get_user(&user_id)
            .await
            .map_err(SocialError::from_store)?
            .ok_or(SocialError::Unauthenticated)?;
        Ok(Requester::from(&user))
    }

    /// Make sure a privileged account named `username` exists.
    ///
    /// An existing account is promoted; its password is left alone.
    pub async fn ensure_staff_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> SocialResult<User> {
        let existing = self
            .store
            .find_user_by_username(username)
            .await
            .map_err(SocialError::from_store)?;

        match existing {
            Some(mut user) => {
                if !user.is_staff {
                    self.store
                        .set_staff(&user.id, true)
                        .await
                        .map_err(SocialError::from_store)?;
                    user.is_staff = true;
                    tracing::info!(user = %user.id, username = %user.username, "Promoted existing account to staff");
                }
                Ok(user)
            }
            None => {
                let user = self.create(username, email, password, true).await?;
                tracing::info!(user = %user.id, username = %user.username, "Created staff account");
                Ok(user)
            }
        }
    }

    async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_staff: bool,
    ) -> SocialResult<User> {
        let username = username.trim();
        validate_username(username)?;
        let email = normalize_email(email)?;
        validate_password(password)?;

        let insert = self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                email,
                password_hash: hash_password(password)?,
                is_staff,
            })
            .await
            .map_err(SocialError::from_store)?;

        match insert {
            UserInsert::Created(user) => {
                tracing::info!(user = %user.id, username = %user.username, "Account registered");
                Ok(user)
            }
            UserInsert::UsernameTaken => Err(SocialError::Conflict(
                "a user with that username already exists".to_string(),
            )),
            UserInsert::EmailTaken => Err(SocialError::Conflict(
                "a user with that email already exists".to_string(),
            )),
        }
    }
}
