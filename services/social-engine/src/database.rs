//! Postgres-backed `SocialStore`
//!
//! Edge uniqueness, the no-self-follow rule and cascades live in the schema
//! (see `migrations/`). Inserts use `ON CONFLICT DO NOTHING` so a duplicate
//! edge reports "unchanged" instead of failing.

use crate::config::DatabaseConfig;
use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use social_core::{
    Error as CoreError, NewUser, Result as CoreResult, SocialStore, Tweet, TweetId, User, UserId,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const USER_COLUMNS: &str = "u.id, u.username, u.email, u.password_hash, u.created_at";
const TWEET_SELECT: &str = r#"
    SELECT t.id, t.author_id, u.username AS author_username, t.content, t.created_at
    FROM tweets t
    JOIN users u ON u.id = t.author_id
"#;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TweetRow {
    id: Uuid,
    author_id: Uuid,
    author_username: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<TweetRow> for Tweet {
    fn from(row: TweetRow) -> Self {
        Tweet {
            id: TweetId(row.id),
            author_id: UserId(row.author_id),
            author_username: row.author_username,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Translate constraint violations into domain errors
fn storage_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some("23505") => return CoreError::Conflict(db.message().to_string()),
            Some("23503") => return CoreError::NotFound("Referenced user or tweet".to_string()),
            Some("23514") => return CoreError::SelfReference,
            _ => {}
        }
    }
    CoreError::Storage(err.to_string())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.url)
            .await?;

        Ok(PgStore { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn users_via_edges(&self, sql: &str, user: UserId) -> CoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(sql)
            .bind(user.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn count(&self, sql: &str, id: Uuid) -> CoreResult<u64> {
        let count: i64 = sqlx::query_scalar(sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl SocialStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> CoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(UserId::new().as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.into())
    }

    async fn user_by_id(&self, id: UserId) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users u WHERE u.id = $1",
            USER_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(User::from))
    }

    async fn user_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users u WHERE u.username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(User::from))
    }

    async fn delete_user(&self, id: UserId) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_tweet(&self, author: UserId, content: &str) -> CoreResult<Tweet> {
        let row = sqlx::query_as::<_, TweetRow>(
            r#"
            WITH inserted AS (
                INSERT INTO tweets (id, author_id, content, created_at)
                VALUES ($1, $2, $3, $4)
                RETURNING id, author_id, content, created_at
            )
            SELECT i.id, i.author_id, u.username AS author_username, i.content, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(TweetId::new().as_uuid())
        .bind(author.as_uuid())
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.into())
    }

    async fn tweet(&self, id: TweetId) -> CoreResult<Option<Tweet>> {
        let row = sqlx::query_as::<_, TweetRow>(&format!("{} WHERE t.id = $1", TWEET_SELECT))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(row.map(Tweet::from))
    }

    async fn delete_tweet(&self, id: TweetId) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM tweets WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn tweets(&self) -> CoreResult<Vec<Tweet>> {
        let rows = sqlx::query_as::<_, TweetRow>(&format!(
            "{} ORDER BY t.created_at DESC, t.id DESC",
            TWEET_SELECT
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Tweet::from).collect())
    }

    async fn tweets_by_author(&self, author: UserId) -> CoreResult<Vec<Tweet>> {
        let rows = sqlx::query_as::<_, TweetRow>(&format!(
            "{} WHERE t.author_id = $1 ORDER BY t.created_at DESC, t.id DESC",
            TWEET_SELECT
        ))
        .bind(author.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Tweet::from).collect())
    }

    async fn insert_follow(&self, follower: UserId, followee: UserId) -> CoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO follow_edges (follower_id, followee_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            "#,
        )
        .bind(follower.as_uuid())
        .bind(followee.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_follow(&self, follower: UserId, followee: UserId) -> CoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM follow_edges WHERE follower_id = $1 AND followee_id = $2",
        )
        .bind(follower.as_uuid())
        .bind(followee.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn follow_exists(&self, follower: UserId, followee: UserId) -> CoreResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follow_edges WHERE follower_id = $1 AND followee_id = $2)",
        )
        .bind(follower.as_uuid())
        .bind(followee.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)
    }

    async fn following(&self, user: UserId) -> CoreResult<Vec<User>> {
        self.users_via_edges(
            &format!(
                "SELECT {} FROM follow_edges f JOIN users u ON u.id = f.followee_id \
                 WHERE f.follower_id = $1 ORDER BY f.created_at DESC",
                USER_COLUMNS
            ),
            user,
        )
        .await
    }

    async fn followers(&self, user: UserId) -> CoreResult<Vec<User>> {
        self.users_via_edges(
            &format!(
                "SELECT {} FROM follow_edges f JOIN users u ON u.id = f.follower_id \
                 WHERE f.followee_id = $1 ORDER BY f.created_at DESC",
                USER_COLUMNS
            ),
            user,
        )
        .await
    }

    async fn count_following(&self, user: UserId) -> CoreResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM follow_edges WHERE follower_id = $1",
            user.as_uuid(),
        )
        .await
    }

    async fn count_followers(&self, user: UserId) -> CoreResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM follow_edges WHERE followee_id = $1",
            user.as_uuid(),
        )
        .await
    }

    async fn insert_like(&self, user: UserId, tweet: TweetId) -> CoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO like_edges (user_id, tweet_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, tweet_id) DO NOTHING
            "#,
        )
        .bind(user.as_uuid())
        .bind(tweet.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_like(&self, user: UserId, tweet: TweetId) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM like_edges WHERE user_id = $1 AND tweet_id = $2")
            .bind(user.as_uuid())
            .bind(tweet.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn like_exists(&self, user: UserId, tweet: TweetId) -> CoreResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM like_edges WHERE user_id = $1 AND tweet_id = $2)",
        )
        .bind(user.as_uuid())
        .bind(tweet.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)
    }

    async fn count_likes(&self, tweet: TweetId) -> CoreResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM like_edges WHERE tweet_id = $1",
            tweet.as_uuid(),
        )
        .await
    }
}
