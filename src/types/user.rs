//! Identity and profile types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// A registered identity.
///
/// The password hash never leaves the crate boundary in serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity id.
    pub id: UserId,
    /// Unique username.
    pub username: String,
    /// Unique email, stored lowercased.
    pub email: String,
    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Privileged role: bypasses per-resource ownership checks.
    pub is_staff: bool,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Public summary of this identity.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Identity fields needed to create a user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Username (already validated).
    pub username: String,
    /// Email (already validated and lowercased).
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Privileged role.
    pub is_staff: bool,
}

/// Outcome of inserting a user; uniqueness clashes are not store failures.
#[derive(Debug, Clone)]
pub enum UserInsert {
    /// Row created.
    Created(User),
    /// Another identity already owns this username.
    UsernameTaken,
    /// Another identity already owns this email.
    EmailTaken,
}

/// Minimal public view of an identity, used in graph listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// Identity id.
    pub id: UserId,
    /// Username.
    pub username: String,
}

/// One-to-one extension of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Owning identity.
    pub user_id: UserId,
    /// Reference to an avatar held by the file store.
    pub avatar: Option<String>,
    /// Free-text bio.
    pub bio: Option<String>,
    /// Last modification.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Blank profile, as created on first access.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            avatar: None,
            bio: None,
            updated_at: Utc::now(),
        }
    }
}

/// Requested profile changes. `Some("")` clears a field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChanges {
    /// New avatar reference.
    pub avatar: Option<String>,
    /// New bio.
    pub bio: Option<String>,
}

/// Profile as seen by a particular viewer, with live graph counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    /// Identity id.
    pub user_id: UserId,
    /// Username.
    pub username: String,
    /// Avatar reference.
    pub avatar: Option<String>,
    /// Bio.
    pub bio: Option<String>,
    /// Live number of followers.
    pub followers_count: u64,
    /// Live number of followed identities.
    pub following_count: u64,
    /// Whether the viewer follows this identity.
    pub is_following: bool,
}
