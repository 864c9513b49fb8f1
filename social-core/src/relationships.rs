//! Relationship ledger: directed follow edges between users
//!
//! Follow and unfollow are idempotent. Following an already-followed user and
//! unfollowing a user that is not followed both succeed with
//! `EdgeChange::Unchanged`. The only hard failures are self-reference and an
//! unknown target.

use crate::error::{Error, Result};
use crate::store::SocialStore;
use crate::types::{EdgeChange, User, UserId};
use std::sync::Arc;
use tracing::{debug, info};

pub struct RelationshipLedger {
    store: Arc<dyn SocialStore>,
}

impl RelationshipLedger {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    /// `actor` starts following `target`
    pub async fn follow(&self, actor: UserId, target: UserId) -> Result<EdgeChange> {
        if actor == target {
            return Err(Error::SelfReference);
        }

        if self.store.insert_follow(actor, target).await? {
            info!(follower = %actor, followee = %target, "Follow edge created");
            Ok(EdgeChange::Created)
        } else {
            debug!(follower = %actor, followee = %target, "Already following");
            Ok(EdgeChange::Unchanged)
        }
    }

    /// `actor` stops following `target`
    pub async fn unfollow(&self, actor: UserId, target: UserId) -> Result<EdgeChange> {
        if actor == target {
            return Err(Error::SelfReference);
        }

        if self.store.delete_follow(actor, target).await? {
            info!(follower = %actor, followee = %target, "Follow edge removed");
            Ok(EdgeChange::Removed)
        } else {
            debug!(follower = %actor, followee = %target, "Not following, nothing to remove");
            Ok(EdgeChange::Unchanged)
        }
    }

    pub async fn is_following(&self, actor: UserId, target: UserId) -> Result<bool> {
        self.store.follow_exists(actor, target).await
    }

    /// Users `user` follows, newest edge first
    pub async fn list_following(&self, user: UserId) -> Result<Vec<User>> {
        self.store.following(user).await
    }

    /// Users following `user`, newest edge first
    pub async fn list_followers(&self, user: UserId) -> Result<Vec<User>> {
        self.store.followers(user).await
    }

    pub async fn count_following(&self, user: UserId) -> Result<u64> {
        self.store.count_following(user).await
    }

    pub async fn count_followers(&self, user: UserId) -> Result<u64> {
        self.store.count_followers(user).await
    }
}
