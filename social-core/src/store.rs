//! Storage abstraction
//!
//! The store is the only place where uniqueness and referential integrity
//! are enforced. Implementations must make every mutating call atomic:
//!
//! - `insert_follow` / `insert_like` never create a second edge for the same
//!   pair, even under concurrent calls, and report whether they inserted
//! - edges referencing a missing user or tweet fail with `Error::NotFound`
//! - deleting a user or tweet removes every edge referencing it
//!
//! Listing calls return materialized vectors, newest first.

use crate::error::Result;
use crate::types::{NewUser, Tweet, TweetId, User, UserId};
use async_trait::async_trait;

#[async_trait]
pub trait SocialStore: Send + Sync {
    // Users

    /// Fails with `Error::Conflict` if the username is taken
    async fn insert_user(&self, user: NewUser) -> Result<User>;
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Returns false if no such user; cascades tweets and edges
    async fn delete_user(&self, id: UserId) -> Result<bool>;

    // Tweets

    /// Fails with `Error::NotFound` if the author does not exist
    async fn insert_tweet(&self, author: UserId, content: &str) -> Result<Tweet>;
    async fn tweet(&self, id: TweetId) -> Result<Option<Tweet>>;
    /// Returns false if no such tweet; cascades likes
    async fn delete_tweet(&self, id: TweetId) -> Result<bool>;
    async fn tweets(&self) -> Result<Vec<Tweet>>;
    async fn tweets_by_author(&self, author: UserId) -> Result<Vec<Tweet>>;

    // Follow edges

    /// Returns false if the edge already existed
    async fn insert_follow(&self, follower: UserId, followee: UserId) -> Result<bool>;
    /// Returns false if there was no edge
    async fn delete_follow(&self, follower: UserId, followee: UserId) -> Result<bool>;
    async fn follow_exists(&self, follower: UserId, followee: UserId) -> Result<bool>;
    /// Users `user` follows, newest edge first
    async fn following(&self, user: UserId) -> Result<Vec<User>>;
    /// Users following `user`, newest edge first
    async fn followers(&self, user: UserId) -> Result<Vec<User>>;
    async fn count_following(&self, user: UserId) -> Result<u64>;
    async fn count_followers(&self, user: UserId) -> Result<u64>;

    // Like edges

    /// Returns false if the edge already existed
    async fn insert_like(&self, user: UserId, tweet: TweetId) -> Result<bool>;
    /// Returns false if there was no edge
    async fn delete_like(&self, user: UserId, tweet: TweetId) -> Result<bool>;
    async fn like_exists(&self, user: UserId, tweet: TweetId) -> Result<bool>;
    async fn count_likes(&self, tweet: TweetId) -> Result<u64>;
}
