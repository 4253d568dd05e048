//! Shared service state.

use std::sync::Arc;

use chrono::Duration;

use crate::accounts::{Accounts, DEFAULT_TOKEN_TTL_HOURS};
use crate::config::ServiceConfig;
use crate::engagement::Engagement;
use crate::graph::SocialGraph;
use crate::posts::{Posts, DEFAULT_POSTS_PER_PAGE};
use crate::profiles::Profiles;
use crate::store::SocialStore;

/// Shared service state.
///
/// Holds the store and the token settings; domain operation sets are built on
/// demand since they only clone an `Arc`.
pub struct ServiceState<S: SocialStore + 'static> {
    /// The social store backend.
    pub store: Arc<S>,
    /// HMAC secret for signing bearer tokens.
    token_secret: Arc<Vec<u8>>,
    token_ttl: Duration,
    posts_per_page: usize,
}

impl<S: SocialStore + 'static> ServiceState<S> {
    /// Create service state with default token lifetime and page size.
    ///
    /// # Arguments
    /// * `store` - The social store backend
    /// * `token_secret` - Secret key for signing bearer tokens (32+ bytes recommended)
    pub fn new(store: S, token_secret: Vec<u8>) -> Self {
        Self {
            store: Arc::new(store),
            token_secret: Arc::new(token_secret),
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            posts_per_page: DEFAULT_POSTS_PER_PAGE,
        }
    }

    /// Create service state from loaded configuration.
    pub fn from_config(store: S, config: &ServiceConfig) -> Self {
        Self {
            store: Arc::new(store),
            token_secret: Arc::new(config.token_secret.clone()),
            token_ttl: Duration::try_hours(config.token_ttl_hours)
                .unwrap_or_else(|| Duration::hours(DEFAULT_TOKEN_TTL_HOURS)),
            posts_per_page: config.posts_per_page,
        }
    }

    /// Override the page size for post listings.
    pub fn with_posts_per_page(mut self, per_page: usize) -> Self {
        self.posts_per_page = per_page.max(1);
        self
    }

    /// Follow graph operations.
    pub fn graph(&self) -> SocialGraph<S> {
        SocialGraph::new(Arc::clone(&self.store))
    }

    /// Like and comment operations.
    pub fn engagement(&self) -> Engagement<S> {
        Engagement::new(Arc::clone(&self.store))
    }

    /// Post operations.
    pub fn posts(&self) -> Posts<S> {
        Posts::new(Arc::clone(&self.store), self.posts_per_page)
    }

    /// Profile operations.
    pub fn profiles(&self) -> Profiles<S> {
        Profiles::new(Arc::clone(&self.store))
    }

    /// Account and token operations.
    pub fn accounts(&self) -> Accounts<S> {
        Accounts::new(
            Arc::clone(&self.store),
            Arc::clone(&self.token_secret),
            self.token_ttl,
        )
    }
}

impl<S: SocialStore + 'static> Clone for ServiceState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            token_secret: Arc::clone(&self.token_secret),
            token_ttl: self.token_ttl,
            posts_per_page: self.posts_per_page,
        }
    }
}
