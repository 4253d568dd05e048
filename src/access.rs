//! Authenticated requesters and the shared ownership gate.
//!
//! Posts, comments and profiles all use the same rule for mutation: the
//! requester must own the resource or hold the privileged role.

use crate::error::{SocialError, SocialResult};
use crate::types::{User, UserId};

/// The authenticated identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    /// Identity id.
    pub id: UserId,
    /// Holds the privileged (moderation) role.
    pub is_staff: bool,
}

impl Requester {
    /// Regular, unprivileged requester.
    pub fn member(id: UserId) -> Self {
        Self { id, is_staff: false }
    }

    /// Privileged requester.
    pub fn staff(id: UserId) -> Self {
        Self { id, is_staff: true }
    }

    /// Apply the ownership gate for a resource owned by `owner`.
    pub fn assert_can_modify(&self, owner: &UserId, resource: &str) -> SocialResult<()> {
        assert_owner_or_privileged(owner, &self.id, self.is_staff).map_err(|_| {
            SocialError::denied(format!("you do not have permission to modify this {resource}"))
        })
    }
}

impl From<&User> for Requester {
    fn from(user: &User) -> Self {
        Self { id: user.id, is_staff: user.is_staff }
    }
}

/// Allow when `requester` owns the resource or is privileged.
pub fn assert_owner_or_privileged(
    resource_owner: &UserId,
    requester: &UserId,
    requester_is_privileged: bool,
) -> SocialResult<()> {
    if resource_owner == requester || requester_is_privileged {
        Ok(())
    } else {
        Err(SocialError::denied("permission denied"))
    }
}
