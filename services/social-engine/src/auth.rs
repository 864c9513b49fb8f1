//! Bearer-token authentication
//!
//! Tokens are HS256 JWTs issued at signup and login. `JwtAuth` verifies them
//! on every non-public route and stores the decoded `Claims` in the request
//! extensions, where the `Actor` extractor picks them up.

use crate::errors::SocialEngineError;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use social_core::{User, UserId};
use std::future::{ready, Ready};
use std::rc::Rc;

/// Routes reachable without a token
pub const PUBLIC_PATHS: &[&str] = &["/health", "/metrics", "/accounts/signup", "/accounts/login"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn issue_token(user: &User, secret: &str, ttl_secs: u64) -> crate::errors::Result<String> {
    let now = Utc::now().timestamp().max(0) as usize;
    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        iat: now,
        exp: now.saturating_add(usize::try_from(ttl_secs).unwrap_or(usize::MAX)),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub struct JwtAuth {
    secret: String,
}

impl JwtAuth {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            secret: self.secret.clone(),
        }))
    }
}

pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    secret: String,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if PUBLIC_PATHS.contains(&req.path()) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await });
        }

        let token = match req.headers().get("Authorization") {
            Some(value) => {
                let auth_str = value.to_str().unwrap_or("");
                match auth_str.strip_prefix("Bearer ") {
                    Some(token) => token.to_string(),
                    None => {
                        return Box::pin(async {
                            Err(unauthorized("Invalid auth header format"))
                        });
                    }
                }
            }
            None => {
                return Box::pin(async {
                    Err(unauthorized("Missing Authorization header"))
                });
            }
        };

        match decode::<Claims>(
            &token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        ) {
            Ok(token_data) => {
                req.extensions_mut().insert(token_data.claims);

                let fut = self.service.call(req);
                Box::pin(async move { fut.await })
            }
            Err(err) => {
                tracing::warn!(path = %req.path(), "JWT validation failed: {:?}", err);
                Box::pin(async {
                    Err(unauthorized("Invalid or expired token"))
                })
            }
        }
    }
}

fn unauthorized(message: &str) -> Error {
    SocialEngineError::Unauthorized(message.to_string()).into()
}

/// The token subject behind a request; the service still checks the user exists
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: UserId,
}

impl FromRequest for Actor {
    type Error = SocialEngineError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let actor = match req.extensions().get::<Claims>() {
            Some(claims) => claims
                .sub
                .parse::<UserId>()
                .map(|id| Actor { id })
                .map_err(|_| SocialEngineError::Unauthorized("Malformed token subject".into())),
            None => Err(SocialEngineError::Unauthorized("Not authenticated".into())),
        };
        ready(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issued_token_decodes() {
        let user = user();
        let token = issue_token(&user, "secret", 60).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(data.claims.sub, user.id.to_string());
        assert_eq!(data.claims.username, "alice");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(&user(), "secret", 60).unwrap();

        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let token = issue_token(&user(), "secret", u64::MAX).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert!(data.claims.exp >= data.claims.iat);
    }
}
