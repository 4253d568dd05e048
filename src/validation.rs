//! Input validation rules.
//!
//! Lengths are counted in Unicode scalar values, not bytes.

use std::sync::OnceLock;

use email_address::EmailAddress;
use regex_lite::Regex;

use crate::error::{SocialError, SocialResult};

/// Maximum post title length.
pub const MAX_TITLE_LENGTH: usize = 25;
/// Maximum post subheading length.
pub const MAX_DESCRIPTION_LENGTH: usize = 100;
/// Maximum comment length.
pub const MAX_COMMENT_LENGTH: usize = 500;
/// Maximum profile bio length.
pub const MAX_BIO_LENGTH: usize = 300;
/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 150;
/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum length of an image or avatar reference.
pub const MAX_REFERENCE_LENGTH: usize = 255;

fn username_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("username regex should compile"))
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Comment content: non-blank after trimming, at most 500 characters.
pub fn validate_comment(content: &str) -> SocialResult<()> {
    if content.trim().is_empty() {
        return Err(SocialError::validation("comment cannot be empty"));
    }
    if char_len(content) > MAX_COMMENT_LENGTH {
        return Err(SocialError::validation(format!(
            "comment cannot exceed {MAX_COMMENT_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Required single-line text field with an upper bound.
fn validate_required(field: &str, value: &str, max: usize) -> SocialResult<()> {
    if value.trim().is_empty() {
        return Err(SocialError::validation(format!("{field} is required")));
    }
    if char_len(value) > max {
        return Err(SocialError::validation(format!(
            "{field} cannot exceed {max} characters"
        )));
    }
    Ok(())
}

/// Post title.
pub fn validate_title(title: &str) -> SocialResult<()> {
    validate_required("title", title, MAX_TITLE_LENGTH)
}

/// Post subheading.
pub fn validate_description(description: &str) -> SocialResult<()> {
    validate_required("description", description, MAX_DESCRIPTION_LENGTH)
}

/// Profile bio.
pub fn validate_bio(bio: &str) -> SocialResult<()> {
    if char_len(bio) > MAX_BIO_LENGTH {
        return Err(SocialError::validation(format!(
            "bio cannot exceed {MAX_BIO_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Normalise an optional file reference: blank clears it.
pub fn normalize_reference(field: &str, value: Option<String>) -> SocialResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) if char_len(&v) > MAX_REFERENCE_LENGTH => Err(SocialError::validation(format!(
            "{field} reference cannot exceed {MAX_REFERENCE_LENGTH} characters"
        ))),
        Some(v) => Ok(Some(v.trim().to_string())),
    }
}

/// Username: letters, digits and `@.+-_`, at most 150 characters.
pub fn validate_username(username: &str) -> SocialResult<()> {
    if username.is_empty() {
        return Err(SocialError::validation("username is required"));
    }
    if char_len(username) > MAX_USERNAME_LENGTH {
        return Err(SocialError::validation(format!(
            "username cannot exceed {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !username_regex().is_match(username) {
        return Err(SocialError::validation(
            "username may only contain letters, digits and @/./+/-/_",
        ));
    }
    Ok(())
}

/// Email address; returns the lowercased form used for uniqueness.
pub fn normalize_email(email: &str) -> SocialResult<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(SocialError::validation("email is required"));
    }
    if !EmailAddress::is_valid(email) {
        return Err(SocialError::validation("email address is not valid"));
    }
    Ok(email.to_lowercase())
}

/// Password strength floor.
pub fn validate_password(password: &str) -> SocialResult<()> {
    if char_len(password) < MIN_PASSWORD_LENGTH {
        return Err(SocialError::validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(r: SocialResult<()>) -> String {
        r.unwrap_err().to_string()
    }

    #[test]
    fn test_comment_blank_vs_too_long() {
        assert_eq!(message(validate_comment("")), "comment cannot be empty");
        assert_eq!(message(validate_comment(" \n\t ")), "comment cannot be empty");
        assert_eq!(
            message(validate_comment(&"a".repeat(501))),
            "comment cannot exceed 500 characters"
        );
    }

    #[test]
    fn test_comment_boundary() {
        assert!(validate_comment(&"a".repeat(500)).is_ok());
        // multi-byte characters count once each
        assert!(validate_comment(&"é".repeat(500)).is_ok());
    }

    #[test]
    fn test_title_and_description_limits() {
        assert!(validate_title(&"t".repeat(25)).is_ok());
        assert!(validate_title(&"t".repeat(26)).is_err());
        assert!(validate_title("  ").is_err());
        assert!(validate_description(&"d".repeat(100)).is_ok());
        assert!(validate_description(&"d".repeat(101)).is_err());
    }

    #[test]
    fn test_bio_limit() {
        assert!(validate_bio(&"b".repeat(300)).is_ok());
        assert!(validate_bio(&"b".repeat(301)).is_err());
    }

    #[test]
    fn test_reference_normalisation() {
        assert_eq!(normalize_reference("image", Some("  ".into())).unwrap(), None);
        assert_eq!(
            normalize_reference("image", Some(" img/a.png ".into())).unwrap(),
            Some("img/a.png".to_string())
        );
        assert!(normalize_reference("image", Some("x".repeat(256))).is_err());
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice.b+c@d-e_f").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"u".repeat(151)).is_err());
    }

    #[test]
    fn test_email_normalised() {
        assert_eq!(normalize_email(" Alice@Example.COM ").unwrap(), "alice@example.com");
        assert!(normalize_email("not-an-email").is_err());
    }

    #[test]
    fn test_password_floor() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }
}
