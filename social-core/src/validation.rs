//! Field validation rules
//!
//! Messages are user-facing and reported per field so a client can render
//! them next to the offending input.

use crate::error::FieldErrors;

/// Maximum tweet length in characters
pub const MAX_TWEET_CHARS: usize = 140;

/// Maximum username length in characters
pub const MAX_USERNAME_CHARS: usize = 150;

/// Minimum password length in characters
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Passwords at least this similar to the username are rejected
pub const MAX_USERNAME_SIMILARITY: f64 = 0.7;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const DUPLICATE_USERNAME: &str = "A user with that username already exists.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const PASSWORD_NUMERIC: &str = "This password is entirely numeric.";
pub const PASSWORD_SIMILAR: &str = "The password is too similar to the username.";

/// Check tweet content; whitespace-only content counts as empty
pub fn validate_tweet_content(content: &str) -> Result<(), FieldErrors> {
    if content.trim().is_empty() {
        return Err(FieldErrors::single("content", REQUIRED));
    }

    let length = content.chars().count();
    if length > MAX_TWEET_CHARS {
        return Err(FieldErrors::single(
            "content",
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                MAX_TWEET_CHARS, length
            ),
        ));
    }

    Ok(())
}

/// Letters, digits and `@ . + - _` only
pub fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Password strength rules; returns every violated rule
pub fn password_problems(password: &str, username: &str) -> Vec<String> {
    let mut problems = Vec::new();

    if password.chars().count() < MIN_PASSWORD_CHARS {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_CHARS
        ));
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push(PASSWORD_NUMERIC.to_string());
    }

    if !username.is_empty() && similarity(password, username) >= MAX_USERNAME_SIMILARITY {
        problems.push(PASSWORD_SIMILAR.to_string());
    }

    problems
}

/// Case-insensitive bigram similarity in `[0, 1]`
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::sorensen_dice(&a.to_lowercase(), &b.to_lowercase())
}

/// Fold `validator` derive output into field errors, skipping fields that
/// already carry an error
pub fn merge_validator_errors(errors: &mut FieldErrors, result: Result<(), validator::ValidationErrors>) {
    let Err(validation_errors) = result else {
        return;
    };

    let mut fields: Vec<_> = validation_errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    for (field, field_errors) in fields {
        if errors.has(field) {
            continue;
        }
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({})", error.code));
            errors.add(field, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tweet_content_accepts_up_to_limit() {
        assert!(validate_tweet_content("hello").is_ok());
        assert!(validate_tweet_content(&"a".repeat(140)).is_ok());
    }

    #[test]
    fn test_tweet_content_rejects_empty_and_blank() {
        let errors = validate_tweet_content("").unwrap_err();
        assert_eq!(errors.get("content"), &[REQUIRED.to_string()]);
        assert!(validate_tweet_content("   \n").is_err());
    }

    #[test]
    fn test_tweet_content_rejects_141_chars() {
        let errors = validate_tweet_content(&"a".repeat(141)).unwrap_err();
        assert_eq!(
            errors.get("content"),
            &["Ensure this value has at most 140 characters (it has 141).".to_string()]
        );
    }

    #[test]
    fn test_tweet_content_counts_characters_not_bytes() {
        // 140 multi-byte characters
        let content = "あ".repeat(140);
        assert!(content.len() > 140);
        assert!(validate_tweet_content(&content).is_ok());
    }

    #[test]
    fn test_username_charset() {
        assert!(is_valid_username("alice.b+tag@x_y-z"));
        assert!(!is_valid_username("alice bob"));
        assert!(!is_valid_username("alice/bob"));
    }

    #[test]
    fn test_password_rules() {
        assert!(password_problems("correct horse battery", "alice").is_empty());

        let short = password_problems("testp", "testuser");
        assert!(short[0].starts_with("This password is too short."));

        assert_eq!(password_problems("13243588", "testuser"), vec![PASSWORD_NUMERIC.to_string()]);
        assert_eq!(
            password_problems("testusertest", "testuser"),
            vec![PASSWORD_SIMILAR.to_string()]
        );
    }

    #[test]
    fn test_similarity_ignores_case() {
        assert!(similarity("TESTUSER", "testuser") > 0.99);
        assert!(similarity("zq9!kw", "testuser") < MAX_USERNAME_SIMILARITY);
    }
}
