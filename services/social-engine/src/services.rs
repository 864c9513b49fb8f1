use crate::auth::issue_token;
use crate::config::AuthConfig;
use crate::errors::{Result, SocialEngineError};
use crate::metrics;
use crate::models::{AuthResponse, FeedResponse, ProfileResponse, UserListResponse};
use social_core::{
    EdgeChange, EngagementLedger, Error as CoreError, RelationshipLedger, SignupForm, SocialStore,
    TweetId, TweetStore, TweetView, User, UserDirectory, UserId,
};
use std::sync::Arc;
use tracing::info;

/// Count a refused operation, then hand the error back
fn refused(err: CoreError) -> CoreError {
    metrics::REFUSED_OPERATIONS
        .with_label_values(&[err.kind()])
        .inc();
    err
}

pub struct SocialService {
    directory: UserDirectory,
    relationships: RelationshipLedger,
    engagement: EngagementLedger,
    tweets: TweetStore,
    auth: AuthConfig,
}

impl SocialService {
    pub fn new(store: Arc<dyn SocialStore>, auth: AuthConfig) -> Self {
        SocialService {
            directory: UserDirectory::new(store.clone()),
            relationships: RelationshipLedger::new(store.clone()),
            engagement: EngagementLedger::new(store.clone()),
            tweets: TweetStore::new(store),
            auth,
        }
    }

    /// A valid token whose user has since been removed is not a login
    async fn require_actor(&self, id: UserId) -> Result<User> {
        self.directory.by_id(id).await.map_err(|err| match err {
            CoreError::NotFound(_) => SocialEngineError::Unauthorized("Unknown user".to_string()),
            other => other.into(),
        })
    }

    fn authenticated(&self, user: User) -> Result<AuthResponse> {
        let token = issue_token(&user, &self.auth.jwt_secret, self.auth.token_ttl_secs)?;
        Ok(AuthResponse { user, token })
    }

    /// Register a user and log them in
    pub async fn signup(&self, form: SignupForm) -> Result<AuthResponse> {
        let user = self.directory.register(form).await.map_err(refused)?;
        metrics::SIGNUPS.inc();
        self.authenticated(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        let user = self
            .directory
            .authenticate(username, password)
            .await
            .map_err(refused)?;
        metrics::LOGINS.inc();
        info!(user_id = %user.id, "User logged in");
        self.authenticated(user)
    }

    /// Every tweet, newest first, annotated for `viewer`
    pub async fn home(&self, viewer: UserId) -> Result<FeedResponse> {
        self.require_actor(viewer).await?;
        let tweets = self.tweets.list().await?;
        let tweets = self.engagement.annotate(tweets, viewer).await?;
        Ok(FeedResponse {
            count: tweets.len(),
            tweets,
        })
    }

    pub async fn tweet_detail(&self, viewer: UserId, id: TweetId) -> Result<TweetView> {
        self.require_actor(viewer).await?;
        let tweet = self.tweets.get(id).await.map_err(refused)?;
        let mut views = self.engagement.annotate(vec![tweet], viewer).await?;
        views
            .pop()
            .ok_or_else(|| CoreError::tweet_not_found(id).into())
    }

    pub async fn create_tweet(&self, author: UserId, content: &str) -> Result<TweetView> {
        self.require_actor(author).await?;
        let tweet = self.tweets.create(author, content).await.map_err(refused)?;
        metrics::TWEETS_CREATED.inc();
        Ok(TweetView {
            tweet,
            like_count: 0,
            liked: false,
        })
    }

    pub async fn delete_tweet(&self, actor: UserId, id: TweetId) -> Result<()> {
        self.require_actor(actor).await?;
        self.tweets.delete(actor, id).await.map_err(refused)?;
        metrics::TWEETS_DELETED.inc();
        Ok(())
    }

    pub async fn like(&self, actor: UserId, id: TweetId) -> Result<u64> {
        self.require_actor(actor).await?;
        let count = self.engagement.like(actor, id).await.map_err(refused)?;
        metrics::LIKES.inc();
        Ok(count)
    }

    pub async fn unlike(&self, actor: UserId, id: TweetId) -> Result<u64> {
        self.require_actor(actor).await?;
        let count = self.engagement.unlike(actor, id).await.map_err(refused)?;
        metrics::UNLIKES.inc();
        Ok(count)
    }

    pub async fn follow(&self, actor: UserId, username: &str) -> Result<EdgeChange> {
        self.require_actor(actor).await?;
        let target = self.directory.by_username(username).await.map_err(refused)?;
        let change = self
            .relationships
            .follow(actor, target.id)
            .await
            .map_err(refused)?;
        if change == EdgeChange::Created {
            metrics::FOLLOWS.inc();
        }
        Ok(change)
    }

    pub async fn unfollow(&self, actor: UserId, username: &str) -> Result<EdgeChange> {
        self.require_actor(actor).await?;
        let target = self.directory.by_username(username).await.map_err(refused)?;
        let change = self
            .relationships
            .unfollow(actor, target.id)
            .await
            .map_err(refused)?;
        if change == EdgeChange::Removed {
            metrics::UNFOLLOWS.inc();
        }
        Ok(change)
    }

    /// Profile of `username` as seen by `viewer`; counts belong to the viewed user
    pub async fn profile(&self, viewer: UserId, username: &str) -> Result<ProfileResponse> {
        self.require_actor(viewer).await?;
        let user = self.directory.by_username(username).await.map_err(refused)?;

        let tweets = self.tweets.list_by_author(user.id).await?;
        let tweets = self.engagement.annotate(tweets, viewer).await?;
        let following_count = self.relationships.count_following(user.id).await?;
        let follower_count = self.relationships.count_followers(user.id).await?;
        let is_following = self.relationships.is_following(viewer, user.id).await?;

        Ok(ProfileResponse {
            user,
            tweets,
            following_count,
            follower_count,
            is_following,
        })
    }

    pub async fn following(&self, viewer: UserId, username: &str) -> Result<UserListResponse> {
        self.require_actor(viewer).await?;
        let user = self.directory.by_username(username).await.map_err(refused)?;
        let users = self.relationships.list_following(user.id).await?;
        Ok(UserListResponse {
            count: users.len(),
            users,
        })
    }

    pub async fn followers(&self, viewer: UserId, username: &str) -> Result<UserListResponse> {
        self.require_actor(viewer).await?;
        let user = self.directory.by_username(username).await.map_err(refused)?;
        let users = self.relationships.list_followers(user.id).await?;
        Ok(UserListResponse {
            count: users.len(),
            users,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use social_core::MemoryStore;

    fn service() -> SocialService {
        SocialService::new(
            Arc::new(MemoryStore::new()),
            AuthConfig {
                jwt_secret: "secret".to_string(),
                token_ttl_secs: 3600,
            },
        )
    }

    fn form(username: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password1: "correct-horse".to_string(),
            password2: "correct-horse".to_string(),
        }
    }

    #[tokio::test]
    async fn test_profile_counts_belong_to_viewed_user() {
        let service = service();
        let alice = service.signup(form("alice")).await.unwrap().user;
        let bob = service.signup(form("bob")).await.unwrap().user;

        service.follow(alice.id, "bob").await.unwrap();

        let bob_seen_by_alice = service.profile(alice.id, "bob").await.unwrap();
        assert_eq!(bob_seen_by_alice.follower_count, 1);
        assert_eq!(bob_seen_by_alice.following_count, 0);
        assert!(bob_seen_by_alice.is_following);

        let alice_seen_by_bob = service.profile(bob.id, "alice").await.unwrap();
        assert_eq!(alice_seen_by_bob.following_count, 1);
        assert_eq!(alice_seen_by_bob.follower_count, 0);
        assert!(!alice_seen_by_bob.is_following);
    }

    #[tokio::test]
    async fn test_follow_unknown_username() {
        let service = service();
        let alice = service.signup(form("alice")).await.unwrap().user;

        let err = service.follow(alice.id, "nobody").await.unwrap_err();
        assert!(matches!(
            err,
            SocialEngineError::Core(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_actor_is_unauthorized() {
        let service = service();
        let bob = service.signup(form("bob")).await.unwrap().user;
        let tweet = service.create_tweet(bob.id, "hello").await.unwrap().tweet;
        let ghost = UserId::new();

        let err = service.follow(ghost, "bob").await.unwrap_err();
        assert!(matches!(err, SocialEngineError::Unauthorized(_)));

        let err = service.like(ghost, tweet.id).await.unwrap_err();
        assert!(matches!(err, SocialEngineError::Unauthorized(_)));

        let err = service.create_tweet(ghost, "hi").await.unwrap_err();
        assert!(matches!(err, SocialEngineError::Unauthorized(_)));
        assert_eq!(service.home(bob.id).await.unwrap().count, 1);
    }
}
