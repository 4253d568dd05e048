//! Signed bearer tokens.
//!
//! ## Format
//!
//! `<user-uuid>.<issued-at-unix-seconds>.<mac>` where `mac` is the hex encoding of
//! the first 16 bytes of `HMAC-SHA256(secret, canonical_fields)`.
//!
//! Tokens are stateless: the service never stores them, so verification is a
//! MAC recomputation plus an expiry check. Without the service secret a token
//! cannot be forged or re-targeted at another identity.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::ids::UserId;

/// Why a presented token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Not three dot-separated parts, bad uuid or bad timestamp.
    #[error("malformed token")]
    Malformed,
    /// MAC does not match.
    #[error("token signature mismatch")]
    BadSignature,
    /// Older than the configured lifetime.
    #[error("token expired")]
    Expired,
}

/// HMAC-signed bearer token naming one identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    /// Token version marker for canonical representation.
    const TOKEN_VERSION: &'static str = "auth_token_v1_hmac";

    /// Bytes of MAC kept in the token.
    const MAC_LEN: usize = 16;

    fn canonical_string(user_id: &UserId, issued_at: i64) -> String {
        format!("{}|{}|{}", user_id.as_uuid(), issued_at, Self::TOKEN_VERSION)
    }

    fn mac(secret: &[u8], user_id: &UserId, issued_at: i64) -> Hmac<Sha256> {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret)
            .expect("HMAC accepts any key size");
        mac.update(Self::canonical_string(user_id, issued_at).as_bytes());
        mac
    }

    /// Issue a token for `user_id`, stamped with `issued_at`.
    pub fn issue_hmac(secret: &[u8], user_id: &UserId, issued_at: DateTime<Utc>) -> Self {
        let ts = issued_at.timestamp();
        let digest = Self::mac(secret, user_id, ts).finalize().into_bytes();
        Self(format!(
            "{}.{}.{}",
            user_id.as_uuid(),
            ts,
            hex::encode(&digest[..Self::MAC_LEN])
        ))
    }

    /// Verify the signature and age, returning the identity it names.
    ///
    /// Uses constant-time comparison to prevent timing attacks.
    pub fn verify_hmac(
        &self,
        secret: &[u8],
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<UserId, TokenError> {
        let mut parts = self.0.splitn(3, '.');
        let (user, ts, sig) = match (parts.next(), parts.next(), parts.next()) {
            (Some(u), Some(t), Some(s)) => (u, t, s),
            _ => return Err(TokenError::Malformed),
        };
        let user_id = UserId::parse(user).map_err(|_| TokenError::Malformed)?;
        let issued_at: i64 = ts.parse().map_err(|_| TokenError::Malformed)?;

        let provided = match hex::decode(sig) {
            Ok(bytes) if bytes.len() == Self::MAC_LEN => bytes,
            _ => return Err(TokenError::Malformed),
        };
        let expected = Self::mac(secret, &user_id, issued_at).finalize().into_bytes();
        let matches = provided
            .iter()
            .zip(expected[..Self::MAC_LEN].iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0;
        if !matches {
            return Err(TokenError::BadSignature);
        }

        if now.timestamp().saturating_sub(issued_at) > ttl.num_seconds() {
            return Err(TokenError::Expired);
        }
        Ok(user_id)
    }

    /// Get the token as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a presented token string (for verification).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SECRET: &[u8] = b"test_service_secret_32_bytes_min";

    fn user() -> UserId {
        UserId::new(Uuid::from_u128(42))
    }

    #[test]
    fn test_token_verifies_with_same_secret() {
        let now = Utc::now();
        let token = AuthToken::issue_hmac(SECRET, &user(), now);
        assert_eq!(token.verify_hmac(SECRET, now, Duration::hours(24)), Ok(user()));
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let now = Utc::now();
        let token = AuthToken::issue_hmac(SECRET, &user(), now);
        assert_eq!(
            token.verify_hmac(b"some_other_secret_entirely_here!", now, Duration::hours(24)),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_retargeted_token_is_rejected() {
        let now = Utc::now();
        let token = AuthToken::issue_hmac(SECRET, &user(), now);
        let other = UserId::new(Uuid::from_u128(43));
        let forged = token.as_str().replacen(&user().to_string(), &other.to_string(), 1);
        assert_eq!(
            AuthToken::from_string(forged).verify_hmac(SECRET, now, Duration::hours(24)),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_token_expires() {
        let issued = Utc::now() - Duration::hours(25);
        let token = AuthToken::issue_hmac(SECRET, &user(), issued);
        assert_eq!(
            token.verify_hmac(SECRET, Utc::now(), Duration::hours(24)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let now = Utc::now();
        for raw in ["", "abc", "a.b.c", "00000000-0000-0000-0000-00000000002a.xx.00"] {
            assert_eq!(
                AuthToken::from_string(raw.to_string()).verify_hmac(SECRET, now, Duration::hours(1)),
                Err(TokenError::Malformed),
                "{raw:?} should be malformed"
            );
        }
    }
}
