//! Error types for the social graph

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result type for social graph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Key used for errors that belong to the form as a whole
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Field name → messages, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-message error for one field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for `field`
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Social graph errors
#[derive(Error, Debug)]
pub enum Error {
    /// Bad input; nothing was applied
    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    /// A user tried to follow or unfollow themselves
    #[error("Users cannot follow themselves")]
    SelfReference,

    /// Missing user or tweet
    #[error("{0} not found")]
    NotFound(String),

    /// Actor does not own the resource
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Unknown username or wrong password
    #[error("Please enter a correct username and password. Note that both fields may be case-sensitive.")]
    InvalidCredentials,

    /// Storage-level uniqueness violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Password hashing failure
    #[error("Credential error: {0}")]
    Credential(String),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn user_not_found(username: &str) -> Self {
        Error::NotFound(format!("User '{}'", username))
    }

    pub fn tweet_not_found(id: impl fmt::Display) -> Self {
        Error::NotFound(format!("Tweet {}", id))
    }

    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::SelfReference => "self_reference",
            Error::NotFound(_) => "not_found",
            Error::Permission(_) => "permission_denied",
            Error::InvalidCredentials => "invalid_credentials",
            Error::Conflict(_) => "duplicate_error",
            Error::Credential(_) => "credential_error",
            Error::Storage(_) => "storage_error",
        }
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(err: argon2::password_hash::Error) -> Self {
        Error::Credential(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_accumulate_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("password2", "too short");
        errors.add("password2", "entirely numeric");
        errors.add("email", "required");

        assert_eq!(errors.get("password2").len(), 2);
        assert!(errors.has("email"));
        assert!(errors.get("username").is_empty());
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["email", "password2"]);
    }

    #[test]
    fn test_empty_field_errors_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
        let err = FieldErrors::single("content", "required").into_result().unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn test_field_errors_serialize_as_map() {
        let errors = FieldErrors::single(NON_FIELD_ERRORS, "bad credentials");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["__all__"][0], "bad credentials");
    }
}
