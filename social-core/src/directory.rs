//! User directory: signup, credential checks and lookups

use crate::error::{Error, FieldErrors, Result, NON_FIELD_ERRORS};
use crate::store::SocialStore;
use crate::types::{NewUser, User, UserId};
use crate::validation::{self, DUPLICATE_USERNAME, INVALID_USERNAME, PASSWORD_MISMATCH, REQUIRED};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// Signup form as submitted by a client
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(length(
        max = 150,
        message = "Ensure this value has at most 150 characters."
    ))]
    pub username: String,

    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[serde(default)]
    pub password1: String,

    #[serde(default)]
    pub password2: String,
}

impl SignupForm {
    /// Field-level validation, uniqueness excluded
    pub fn check(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        for (field, value) in [
            ("username", &self.username),
            ("email", &self.email),
            ("password1", &self.password1),
            ("password2", &self.password2),
        ] {
            if value.trim().is_empty() {
                errors.add(field, REQUIRED);
            }
        }

        validation::merge_validator_errors(&mut errors, self.validate());

        if !errors.has("username") && !validation::is_valid_username(&self.username) {
            errors.add("username", INVALID_USERNAME);
        }

        if !errors.has("password1") && !errors.has("password2") {
            if self.password1 != self.password2 {
                errors.add("password2", PASSWORD_MISMATCH);
            } else {
                for problem in validation::password_problems(&self.password2, &self.username) {
                    errors.add("password2", problem);
                }
            }
        }

        errors
    }
}

/// Owns user identity records
pub struct UserDirectory {
    store: Arc<dyn SocialStore>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    /// Validate the form, hash the password and persist the user
    pub async fn register(&self, form: SignupForm) -> Result<User> {
        let mut errors = form.check();

        if !errors.has("username") && self.store.user_by_username(&form.username).await?.is_some() {
            errors.add("username", DUPLICATE_USERNAME);
        }
        errors.into_result()?;

        let password_hash = hash_password(&form.password1)?;

        let user = self
            .store
            .insert_user(NewUser {
                username: form.username,
                email: form.email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent signup
                Error::Conflict(_) => Error::Validation(FieldErrors::single("username", DUPLICATE_USERNAME)),
                other => other,
            })?;

        info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Check a username/password pair
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let mut errors = FieldErrors::new();
        if username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result()?;

        let Some(user) = self.store.user_by_username(username).await? else {
            warn!(username = %username, "Login attempt for unknown user");
            return Err(Error::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash) {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(Error::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn by_username(&self, username: &str) -> Result<User> {
        self.store
            .user_by_username(username)
            .await?
            .ok_or_else(|| Error::user_not_found(username))
    }

    pub async fn by_id(&self, id: UserId) -> Result<User> {
        self.store
            .user_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User {}", id)))
    }

    /// Delete a user together with their tweets and edges
    pub async fn remove(&self, id: UserId) -> Result<()> {
        if !self.store.delete_user(id).await? {
            return Err(Error::NotFound(format!("User {}", id)));
        }
        info!(user_id = %id, "Removed user");
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Form-level error for a failed login, keyed like other field errors
pub fn invalid_credentials_errors() -> FieldErrors {
    FieldErrors::single(NON_FIELD_ERRORS, Error::InvalidCredentials.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::validation::{INVALID_EMAIL, PASSWORD_NUMERIC, PASSWORD_SIMILAR};

    fn directory() -> UserDirectory {
        UserDirectory::new(Arc::new(MemoryStore::new()))
    }

    fn form(username: &str, email: &str, password1: &str, password2: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            email: email.to_string(),
            password1: password1.to_string(),
            password2: password2.to_string(),
        }
    }

    fn valid_form() -> SignupForm {
        form("testuser", "test@test.com", "testpassword", "testpassword")
    }

    fn field_errors(err: Error) -> FieldErrors {
        match err {
            Error::Validation(errors) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let directory = directory();
        let user = directory.register(valid_form()).await.unwrap();
        assert_eq!(user.username, "testuser");
        assert!(user.password_hash.starts_with("$argon2"));

        let logged_in = directory.authenticate("testuser", "testpassword").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_register_empty_form_reports_every_field() {
        let errors = field_errors(directory().register(form("", "", "", "")).await.unwrap_err());

        for field in ["username", "email", "password1", "password2"] {
            assert_eq!(errors.get(field), &[REQUIRED.to_string()], "field {}", field);
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let directory = directory();
        directory.register(valid_form()).await.unwrap();

        let errors = field_errors(
            directory
                .register(form("testuser", "test2@test.com", "testpassword", "testpassword"))
                .await
                .unwrap_err(),
        );
        assert_eq!(errors.get("username"), &[DUPLICATE_USERNAME.to_string()]);
    }

    #[tokio::test]
    async fn test_register_invalid_email() {
        let errors = field_errors(
            directory()
                .register(form("testuser", "testtest.com", "testpassword", "testpassword"))
                .await
                .unwrap_err(),
        );
        assert_eq!(errors.get("email"), &[INVALID_EMAIL.to_string()]);
    }

    #[tokio::test]
    async fn test_register_password_rules() {
        let directory = directory();

        let short = field_errors(
            directory
                .register(form("testuser", "test@test.com", "testp", "testp"))
                .await
                .unwrap_err(),
        );
        assert!(short.get("password2")[0].starts_with("This password is too short."));

        let similar = field_errors(
            directory
                .register(form("testuser", "abc@test.com", "testusertest", "testusertest"))
                .await
                .unwrap_err(),
        );
        assert!(similar.get("password2").contains(&PASSWORD_SIMILAR.to_string()));

        let numeric = field_errors(
            directory
                .register(form("testuser", "abc@test.com", "13243588", "13243588"))
                .await
                .unwrap_err(),
        );
        assert!(numeric.get("password2").contains(&PASSWORD_NUMERIC.to_string()));

        let mismatch = field_errors(
            directory
                .register(form("testuser", "abc@test.com", "password1", "password2"))
                .await
                .unwrap_err(),
        );
        assert_eq!(mismatch.get("password2"), &[PASSWORD_MISMATCH.to_string()]);

        assert!(directory.by_username("testuser").await.is_err());
    }

    #[tokio::test]
    async fn test_authenticate_failures() {
        let directory = directory();
        directory.register(valid_form()).await.unwrap();

        assert!(matches!(
            directory.authenticate("tester2", "testpassword").await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            directory.authenticate("testuser", "wrongpassword").await,
            Err(Error::InvalidCredentials)
        ));

        let errors = field_errors(directory.authenticate("testuser", "").await.unwrap_err());
        assert_eq!(errors.get("password"), &[REQUIRED.to_string()]);
    }

    #[tokio::test]
    async fn test_remove_unknown_user() {
        let err = directory().remove(UserId::new()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
