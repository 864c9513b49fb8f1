use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use social_core::{MemoryStore, SocialStore};
use social_engine::{
    auth::JwtAuth,
    config::{Config, StorageBackend},
    database::PgStore,
    handlers,
    middleware::RateLimiter,
    services::SocialService,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().map_err(anyhow::Error::msg)?;

    info!("Starting Social Engine on port {}", config.server.port);

    let store: Arc<dyn SocialStore> = match config.database.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Postgres => {
            let pg = PgStore::connect(&config.database)
                .await
                .context("Failed to connect to database")?;
            pg.health_check().await.context("Database health check failed")?;

            if config.database.run_migrations {
                pg.migrate().await.context("Failed to run migrations")?;
            }
            info!("Database ready");
            Arc::new(pg)
        }
    };

    let service = Arc::new(SocialService::new(store, config.auth.clone()));
    let limiter = RateLimiter::new(config.server.requests_per_minute);
    let jwt_secret = config.auth.jwt_secret.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(service.clone()))
            .wrap(JwtAuth::new(jwt_secret.clone()))
            .wrap(limiter.clone())
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(handlers::configure_routes)
    })
    .workers(config.server.workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
