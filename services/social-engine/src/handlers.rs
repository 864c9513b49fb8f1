use crate::auth::Actor;
use crate::errors::SocialEngineError;
use crate::metrics;
use crate::models::{CreateTweetRequest, LikeResponse, LoginRequest};
use crate::services::SocialService;
use actix_web::{http::header, web, HttpResponse};
use serde_json::json;
use social_core::{SignupForm, TweetId};
use std::sync::Arc;

/// Where state-changing form routes send the browser afterwards
pub const HOME: &str = "/tweets/home";

fn redirect_home() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, HOME))
        .finish()
}

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "social-engine",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus metrics endpoint
pub async fn metrics_endpoint() -> HttpResponse {
    match metrics::metrics_handler() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Failed to gather metrics",
            "details": e.to_string()
        })),
    }
}

pub async fn signup(
    service: web::Data<Arc<SocialService>>,
    form: web::Json<SignupForm>,
) -> Result<HttpResponse, SocialEngineError> {
    let response = service.signup(form.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

pub async fn login(
    service: web::Data<Arc<SocialService>>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, SocialEngineError> {
    let response = service.login(&request.username, &request.password).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn profile(
    service: web::Data<Arc<SocialService>>,
    actor: Actor,
    username: web::Path<String>,
) -> Result<HttpResponse, SocialEngineError> {
    let profile = service.profile(actor.id, &username).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn following(
    service: web::Data<Arc<SocialService>>,
    actor: Actor,
    username: web::Path<String>,
) -> Result<HttpResponse, SocialEngineError> {
    let list = service.following(actor.id, &username).await?;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn followers(
    service: web::Data<Arc<SocialService>>,
    actor: Actor,
    username: web::Path<String>,
) -> Result<HttpResponse, SocialEngineError> {
    let list = service.followers(actor.id, &username).await?;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn follow(
    service: web::Data<Arc<SocialService>>,
    actor: Actor,
    username: web::Path<String>,
) -> Result<HttpResponse, SocialEngineError> {
    service.follow(actor.id, &username).await?;
    Ok(redirect_home())
}

pub async fn unfollow(
    service: web::Data<Arc<SocialService>>,
    actor: Actor,
    username: web::Path<String>,
) -> Result<HttpResponse, SocialEngineError> {
    service.unfollow(actor.id, &username).await?;
    Ok(redirect_home())
}

pub async fn home(
    service: web::Data<Arc<SocialService>>,
    actor: Actor,
) -> Result<HttpResponse, SocialEngineError> {
    let feed = service.home(actor.id).await?;
    Ok(HttpResponse::Ok().json(feed))
}

pub async fn create_tweet(
    service: web::Data<Arc<SocialService>>,
    actor: Actor,
    request: web::Json<CreateTweetRequest>,
) -> Result<HttpResponse, SocialEngineError> {
    let view = service.create_tweet(actor.id, &request.content).await?;
    Ok(HttpResponse::Created().json(view))
}

pub async fn tweet_detail(
    service: web::Data<Arc<SocialService>>,
    actor: Actor,
    tweet_id: web::Path<TweetId>,
) -> Result<HttpResponse, SocialEngineError> {
    let view = service.tweet_detail(actor.id, *tweet_id).await?;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn like_tweet(
    service: web::Data<Arc<SocialService>>,
    actor: Actor,
    tweet_id: web::Path<TweetId>,
) -> Result<HttpResponse, SocialEngineError> {
    let like_count = service.like(actor.id, *tweet_id).await?;
    Ok(HttpResponse::Ok().json(LikeResponse { like_count }))
}

pub async fn unlike_tweet(
    service: web::Data<Arc<SocialService>>,
    actor: Actor,
    tweet_id: web::Path<TweetId>,
) -> Result<HttpResponse, SocialEngineError> {
    let like_count = service.unlike(actor.id, *tweet_id).await?;
    Ok(HttpResponse::Ok().json(LikeResponse { like_count }))
}

pub async fn delete_tweet(
    service: web::Data<Arc<SocialService>>,
    actor: Actor,
    tweet_id: web::Path<TweetId>,
) -> Result<HttpResponse, SocialEngineError> {
    service.delete_tweet(actor.id, *tweet_id).await?;
    Ok(redirect_home())
}

/// Malformed JSON bodies get the same error envelope as everything else
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| SocialEngineError::BadRequest(err.to_string()).into())
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::scope("/accounts")
                .route("/signup", web::post().to(signup))
                .route("/login", web::post().to(login))
                .route("/{username}", web::get().to(profile))
                .route("/{username}/following", web::get().to(following))
                .route("/{username}/followers", web::get().to(followers)),
        )
        // Static segments before `{id}`
        .service(
            web::scope("/tweets")
                .route("/home", web::get().to(home))
                .route("/create", web::post().to(create_tweet))
                .route("/{id}", web::get().to(tweet_detail))
                .route("/{id}/like", web::post().to(like_tweet))
                .route("/{id}/unlike", web::post().to(unlike_tweet))
                .route("/{id}/delete", web::post().to(delete_tweet)),
        )
        .route("/follow/{username}", web::post().to(follow))
        .route("/unfollow/{username}", web::post().to(unfollow))
        .route("/metrics", web::get().to(metrics_endpoint))
        .route("/health", web::get().to(health_check));
}
