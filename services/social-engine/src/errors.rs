use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use social_core::directory::invalid_credentials_errors;
use social_core::Error as CoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SocialEngineError>;

#[derive(Error, Debug)]
pub enum SocialEngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl ResponseError for SocialEngineError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        let mut error = json!({
            "code": status_code.as_u16(),
            "message": self.to_string(),
            "type": self.error_type()
        });

        match self {
            SocialEngineError::Core(CoreError::Validation(fields)) => {
                error["fields"] = json!(fields);
            }
            SocialEngineError::Core(CoreError::InvalidCredentials) => {
                error["fields"] = json!(invalid_credentials_errors());
            }
            _ => {}
        }

        HttpResponse::build(status_code).json(json!({ "error": error }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            SocialEngineError::Core(err) => match err {
                CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                CoreError::SelfReference => StatusCode::BAD_REQUEST,
                CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                CoreError::Permission(_) => StatusCode::FORBIDDEN,
                CoreError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                CoreError::Conflict(_) => StatusCode::CONFLICT,
                CoreError::Credential(_) => StatusCode::INTERNAL_SERVER_ERROR,
                CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            SocialEngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SocialEngineError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SocialEngineError::BadRequest(_) => StatusCode::BAD_REQUEST,
            SocialEngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SocialEngineError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            SocialEngineError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl SocialEngineError {
    fn error_type(&self) -> &str {
        match self {
            SocialEngineError::Core(err) => err.kind(),
            SocialEngineError::Database(_) => "database_error",
            SocialEngineError::Migration(_) => "migration_error",
            SocialEngineError::BadRequest(_) => "bad_request",
            SocialEngineError::Unauthorized(_) => "unauthorized",
            SocialEngineError::RateLimitExceeded => "rate_limit",
            SocialEngineError::Token(_) => "token_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use social_core::FieldErrors;

    #[test]
    fn test_core_errors_map_to_status() {
        let cases = [
            (CoreError::SelfReference, StatusCode::BAD_REQUEST),
            (CoreError::user_not_found("bob"), StatusCode::NOT_FOUND),
            (CoreError::Permission("nope".into()), StatusCode::FORBIDDEN),
            (CoreError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (CoreError::Storage("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(SocialEngineError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_validation_body_carries_fields() {
        let err = SocialEngineError::from(CoreError::Validation(FieldErrors::single(
            "content",
            "This field is required.",
        )));

        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_type(), "validation_error");
    }
}
