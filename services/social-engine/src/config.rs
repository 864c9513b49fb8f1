use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

/// Longest token lifetime `validate` accepts: one year
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub requests_per_minute: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8090)?
            .set_default("server.workers", 4)?
            .set_default("server.requests_per_minute", 600)?
            .set_default("database.backend", "postgres")?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.run_migrations", true)?
            .set_default("auth.jwt_secret", "")?
            .set_default("auth.token_ttl_secs", 86400)?;

        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        builder = builder.add_source(Environment::with_prefix("SOCIAL_ENGINE").separator("__"));

        if let Ok(db_url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", db_url)?;
        }

        if let Ok(secret) = env::var("JWT_SECRET") {
            builder = builder.set_override("auth.jwt_secret", secret)?;
        }

        if let Ok(port) = env::var("SOCIAL_ENGINE_PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.server.workers == 0 {
            return Err("At least one worker is required".to_string());
        }

        if self.server.requests_per_minute == 0 {
            return Err("requests_per_minute must be positive".to_string());
        }

        if self.database.backend == StorageBackend::Postgres && self.database.url.is_empty() {
            return Err("Database URL is required for the postgres backend".to_string());
        }

        if self.auth.jwt_secret.is_empty() {
            return Err("JWT secret is required".to_string());
        }

        if self.auth.token_ttl_secs == 0 {
            return Err("token_ttl_secs must be positive".to_string());
        }

        if self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err("token_ttl_secs must be at most one year".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8090,
                workers: 1,
                requests_per_minute: 60,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Memory,
                url: String::new(),
                max_connections: 10,
                min_connections: 2,
                run_migrations: false,
            },
            auth: AuthConfig {
                jwt_secret: "secret".to_string(),
                token_ttl_secs: 3600,
            },
        }
    }

    #[test]
    fn test_memory_backend_needs_no_url() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_postgres_backend_needs_url() {
        let mut config = config();
        config.database.backend = StorageBackend::Postgres;
        assert!(config.validate().is_err());

        config.database.url = "postgres://localhost/social".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_secret_rejected() {
        let mut config = config();
        config.auth.jwt_secret.clear();
        assert_eq!(config.validate(), Err("JWT secret is required".to_string()));
    }

    #[test]
    fn test_token_ttl_is_bounded() {
        let mut config = config();
        config.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS;
        assert!(config.validate().is_ok());

        config.auth.token_ttl_secs = u64::MAX;
        assert_eq!(
            config.validate(),
            Err("token_ttl_secs must be at most one year".to_string())
        );
    }
}
