//! Engagement ledger: like edges between users and tweets
//!
//! Like counts are never cached. Every count is a fresh scan of the edge set
//! taken after the mutation, so the edge set is the only source of truth.

use crate::error::{Error, Result};
use crate::store::SocialStore;
use crate::types::{Tweet, TweetId, TweetView, UserId};
use std::sync::Arc;
use tracing::{debug, info};

pub struct EngagementLedger {
    store: Arc<dyn SocialStore>,
}

impl EngagementLedger {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    /// Like `tweet`; returns the like count afterwards
    pub async fn like(&self, actor: UserId, tweet: TweetId) -> Result<u64> {
        self.require_tweet(tweet).await?;

        if self.store.insert_like(actor, tweet).await? {
            info!(user_id = %actor, tweet_id = %tweet, "Like edge created");
        } else {
            debug!(user_id = %actor, tweet_id = %tweet, "Already liked");
        }

        self.store.count_likes(tweet).await
    }

    /// Remove the like on `tweet`; returns the like count afterwards
    pub async fn unlike(&self, actor: UserId, tweet: TweetId) -> Result<u64> {
        self.require_tweet(tweet).await?;

        if self.store.delete_like(actor, tweet).await? {
            info!(user_id = %actor, tweet_id = %tweet, "Like edge removed");
        } else {
            debug!(user_id = %actor, tweet_id = %tweet, "Not liked, nothing to remove");
        }

        self.store.count_likes(tweet).await
    }

    pub async fn is_liked_by(&self, user: UserId, tweet: TweetId) -> Result<bool> {
        self.store.like_exists(user, tweet).await
    }

    pub async fn like_count(&self, tweet: TweetId) -> Result<u64> {
        self.store.count_likes(tweet).await
    }

    /// Attach like count and the viewer's liked flag, keeping input order
    pub async fn annotate(&self, tweets: Vec<Tweet>, viewer: UserId) -> Result<Vec<TweetView>> {
        let mut views = Vec::with_capacity(tweets.len());
        for tweet in tweets {
            let like_count = self.store.count_likes(tweet.id).await?;
            let liked = self.store.like_exists(viewer, tweet.id).await?;
            views.push(TweetView {
                tweet,
                like_count,
                liked,
            });
        }
        Ok(views)
    }

    async fn require_tweet(&self, tweet: TweetId) -> Result<()> {
        match self.store.tweet(tweet).await? {
            Some(_) => Ok(()),
            None => Err(Error::tweet_not_found(tweet)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::types::{NewUser, User};

    async fn user(store: &MemoryStore, name: &str) -> User {
        store
            .insert_user(NewUser {
                username: name.to_string(),
                email: format!("{}@example.com", name),
                password_hash: String::new(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_like_increments_once() {
        let store = Arc::new(MemoryStore::new());
        let alice = user(&store, "alice").await;
        let tweet = store.insert_tweet(alice.id, "hello").await.unwrap();
        let ledger = EngagementLedger::new(store.clone());

        assert_eq!(ledger.like_count(tweet.id).await.unwrap(), 0);
        assert_eq!(ledger.like(alice.id, tweet.id).await.unwrap(), 1);
        assert_eq!(ledger.like(alice.id, tweet.id).await.unwrap(), 1);
        assert!(ledger.is_liked_by(alice.id, tweet.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unlike_decrements_once() {
        let store = Arc::new(MemoryStore::new());
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let tweet = store.insert_tweet(alice.id, "hello").await.unwrap();
        let ledger = EngagementLedger::new(store.clone());

        ledger.like(alice.id, tweet.id).await.unwrap();
        ledger.like(bob.id, tweet.id).await.unwrap();

        assert_eq!(ledger.unlike(bob.id, tweet.id).await.unwrap(), 1);
        assert_eq!(ledger.unlike(bob.id, tweet.id).await.unwrap(), 1);
        assert!(!ledger.is_liked_by(bob.id, tweet.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_tweet_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let alice = user(&store, "alice").await;
        let ledger = EngagementLedger::new(store.clone());

        assert!(matches!(ledger.like(alice.id, TweetId::new()).await, Err(Error::NotFound(_))));
        assert!(matches!(ledger.unlike(alice.id, TweetId::new()).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_annotate_marks_viewer_likes() {
        let store = Arc::new(MemoryStore::new());
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let first = store.insert_tweet(alice.id, "first").await.unwrap();
        let second = store.insert_tweet(alice.id, "second").await.unwrap();
        let ledger = EngagementLedger::new(store.clone());

        ledger.like(bob.id, first.id).await.unwrap();
        ledger.like(alice.id, first.id).await.unwrap();

        let views = ledger
            .annotate(vec![second.clone(), first.clone()], bob.id)
            .await
            .unwrap();

        assert_eq!(views[0].tweet.id, second.id);
        assert_eq!(views[0].like_count, 0);
        assert!(!views[0].liked);
        assert_eq!(views[1].like_count, 2);
        assert!(views[1].liked);
    }
}
