//! In-memory store
//!
//! Used by tests and by the service's `memory` backend. All state sits
//! behind one `RwLock`; every mutating call takes the write lock for its full
//! duration, which gives the same atomicity the Postgres constraints give.

use crate::error::{Error, Result};
use crate::store::SocialStore;
use crate::types::{FollowEdge, LikeEdge, NewUser, Tweet, TweetId, User, UserId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, User>,
    usernames: HashMap<String, UserId>,
    /// Insertion order, oldest first
    tweets: Vec<Tweet>,
    follows: Vec<FollowEdge>,
    likes: Vec<LikeEdge>,
}

impl Inner {
    fn require_user(&self, id: UserId) -> Result<&User> {
        self.users
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("User {}", id)))
    }

    fn require_tweet(&self, id: TweetId) -> Result<&Tweet> {
        self.tweets
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::tweet_not_found(id))
    }

    fn users_for(&self, ids: impl Iterator<Item = UserId>) -> Vec<User> {
        ids.filter_map(|id| self.users.get(&id).cloned()).collect()
    }
}

/// Process-local `SocialStore`
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SocialStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut inner = self.inner.write().await;

        if inner.usernames.contains_key(&user.username) {
            return Err(Error::Conflict(format!("username '{}' is taken", user.username)));
        }

        let record = User {
            id: UserId::new(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };

        inner.usernames.insert(record.username.clone(), record.id);
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .usernames
            .get(username)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let mut inner = self.inner.write().await;

        let Some(user) = inner.users.remove(&id) else {
            return Ok(false);
        };
        inner.usernames.remove(&user.username);

        let removed_tweets: Vec<TweetId> = inner
            .tweets
            .iter()
            .filter(|t| t.author_id == id)
            .map(|t| t.id)
            .collect();
        inner.tweets.retain(|t| t.author_id != id);
        inner.follows.retain(|e| e.follower != id && e.followee != id);
        inner
            .likes
            .retain(|e| e.user != id && !removed_tweets.contains(&e.tweet));

        debug!(user_id = %id, tweets = removed_tweets.len(), "Removed user and dependent rows");
        Ok(true)
    }

    async fn insert_tweet(&self, author: UserId, content: &str) -> Result<Tweet> {
        let mut inner = self.inner.write().await;
        let author_username = inner.require_user(author)?.username.clone();

        let tweet = Tweet {
            id: TweetId::new(),
            author_id: author,
            author_username,
            content: content.to_string(),
            created_at: Utc::now(),
        };

        inner.tweets.push(tweet.clone());
        Ok(tweet)
    }

    async fn tweet(&self, id: TweetId) -> Result<Option<Tweet>> {
        let inner = self.inner.read().await;
        Ok(inner.tweets.iter().find(|t| t.id == id).cloned())
    }

    async fn delete_tweet(&self, id: TweetId) -> Result<bool> {
        let mut inner = self.inner.write().await;

        let before = inner.tweets.len();
        inner.tweets.retain(|t| t.id != id);
        if inner.tweets.len() == before {
            return Ok(false);
        }

        inner.likes.retain(|e| e.tweet != id);
        Ok(true)
    }

    async fn tweets(&self) -> Result<Vec<Tweet>> {
        let inner = self.inner.read().await;
        Ok(inner.tweets.iter().rev().cloned().collect())
    }

    async fn tweets_by_author(&self, author: UserId) -> Result<Vec<Tweet>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tweets
            .iter()
            .rev()
            .filter(|t| t.author_id == author)
            .cloned()
            .collect())
    }

    async fn insert_follow(&self, follower: UserId, followee: UserId) -> Result<bool> {
        if follower == followee {
            return Err(Error::SelfReference);
        }

        let mut inner = self.inner.write().await;
        inner.require_user(follower)?;
        inner.require_user(followee)?;

        if inner
            .follows
            .iter()
            .any(|e| e.follower == follower && e.followee == followee)
        {
            return Ok(false);
        }

        inner.follows.push(FollowEdge {
            follower,
            followee,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn delete_follow(&self, follower: UserId, followee: UserId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.follows.len();
        inner
            .follows
            .retain(|e| !(e.follower == follower && e.followee == followee));
        Ok(inner.follows.len() < before)
    }

    async fn follow_exists(&self, follower: UserId, followee: UserId) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .follows
            .iter()
            .any(|e| e.follower == follower && e.followee == followee))
    }

    async fn following(&self, user: UserId) -> Result<Vec<User>> {
        let inner = self.inner.read().await;
        let ids = inner
            .follows
            .iter()
            .rev()
            .filter(|e| e.follower == user)
            .map(|e| e.followee);
        Ok(inner.users_for(ids))
    }

    async fn followers(&self, user: UserId) -> Result<Vec<User>> {
        let inner = self.inner.read().await;
        let ids = inner
            .follows
            .iter()
            .rev()
            .filter(|e| e.followee == user)
            .map(|e| e.follower);
        Ok(inner.users_for(ids))
    }

    async fn count_following(&self, user: UserId) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner.follows.iter().filter(|e| e.follower == user).count() as u64)
    }

    async fn count_followers(&self, user: UserId) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner.follows.iter().filter(|e| e.followee == user).count() as u64)
    }

    async fn insert_like(&self, user: UserId, tweet: TweetId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        inner.require_user(user)?;
        inner.require_tweet(tweet)?;

        if inner.likes.iter().any(|e| e.user == user && e.tweet == tweet) {
            return Ok(false);
        }

        inner.likes.push(LikeEdge {
            user,
            tweet,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn delete_like(&self, user: UserId, tweet: TweetId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.likes.len();
        inner.likes.retain(|e| !(e.user == user && e.tweet == tweet));
        Ok(inner.likes.len() < before)
    }

    async fn like_exists(&self, user: UserId, tweet: TweetId) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.likes.iter().any(|e| e.user == user && e.tweet == tweet))
    }

    async fn count_likes(&self, tweet: TweetId) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner.likes.iter().filter(|e| e.tweet == tweet).count() as u64)
    }
}
