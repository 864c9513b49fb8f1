//! Chirp Social Core
//!
//! Domain layer for a small social network: users, tweets, follow edges and
//! like edges, plus the rules that keep those edges consistent.
//!
//! # Architecture
//!
//! - **Explicit storage**: every component holds an `Arc<dyn SocialStore>`;
//!   there is no ambient connection
//! - **Storage-enforced uniqueness**: duplicate edges are rejected by the store,
//!   never by in-process locks in the ledgers
//! - **Derived counts**: like/follow counts are computed from the edge set at
//!   call time
//!
//! # Invariants
//!
//! - A user never follows themselves
//! - At most one follow edge per (follower, followee)
//! - At most one like edge per (user, tweet)
//! - Tweet content is non-empty and at most 140 characters
//! - Only the author deletes a tweet

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod types;
pub mod error;
pub mod validation;
pub mod store;
pub mod memory;
pub mod directory;
pub mod relationships;
pub mod engagement;
pub mod tweets;

// Re-exports
pub use error::{Error, FieldErrors, Result};
pub use types::{
    EdgeChange, FollowEdge, LikeEdge, NewUser, Tweet, TweetId, TweetView, User, UserId,
};
pub use store::SocialStore;
pub use memory::MemoryStore;
pub use directory::{SignupForm, UserDirectory};
pub use relationships::RelationshipLedger;
pub use engagement::EngagementLedger;
pub use tweets::TweetStore;
