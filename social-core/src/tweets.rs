//! Tweet store: create, read and author-only delete

use crate::error::{Error, Result};
use crate::store::SocialStore;
use crate::types::{Tweet, TweetId, UserId};
use crate::validation::validate_tweet_content;
use std::sync::Arc;
use tracing::{info, warn};

pub struct TweetStore {
    store: Arc<dyn SocialStore>,
}

impl TweetStore {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    /// Post a tweet; content is stored verbatim
    pub async fn create(&self, author: UserId, content: &str) -> Result<Tweet> {
        validate_tweet_content(content).map_err(Error::Validation)?;

        let tweet = self.store.insert_tweet(author, content).await?;
        info!(tweet_id = %tweet.id, author = %author, "Tweet created");
        Ok(tweet)
    }

    /// Delete `tweet` on behalf of `actor`, who must be its author
    pub async fn delete(&self, actor: UserId, tweet: TweetId) -> Result<()> {
        let existing = self.get(tweet).await?;

        if existing.author_id != actor {
            warn!(tweet_id = %tweet, actor = %actor, "Refused delete by non-author");
            return Err(Error::Permission(format!(
                "only the author may delete tweet {}",
                tweet
            )));
        }

        if !self.store.delete_tweet(tweet).await? {
            // Deleted concurrently
            return Err(Error::tweet_not_found(tweet));
        }

        info!(tweet_id = %tweet, "Tweet deleted");
        Ok(())
    }

    pub async fn get(&self, tweet: TweetId) -> Result<Tweet> {
        self.store
            .tweet(tweet)
            .await?
            .ok_or_else(|| Error::tweet_not_found(tweet))
    }

    /// Every tweet, newest first
    pub async fn list(&self) -> Result<Vec<Tweet>> {
        self.store.tweets().await
    }

    /// One user's tweets, newest first
    pub async fn list_by_author(&self, author: UserId) -> Result<Vec<Tweet>> {
        self.store.tweets_by_author(author).await
    }
}
