// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Document store adapter.
//!
//! Each collection gets its own trait so services depend only on what they
//! touch. [`PgStore`] is the production backend; [`MemoryStore`] keeps
//! everything in process for local runs and tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    CheckoutCompletion, Comment, Friend, FriendRequest, Livestream, LivestreamChanges, LivestreamStatus,
    NotificationSettings, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Database connection error: {0}")]
    Pool(#[from] diesel_async::pooled_connection::deadpool::PoolError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Record already exists")]
    Conflict,
}

#[async_trait]
pub trait LivestreamStore: Send + Sync {
    async fn list_livestreams(&self, status: Option<LivestreamStatus>) -> Result<Vec<Livestream>, StoreError>;

    async fn find_livestream(&self, id: &str) -> Result<Option<Livestream>, StoreError>;

    async fn insert_livestream(&self, livestream: &Livestream) -> Result<Livestream, StoreError>;

    /// Merge `changes` into an existing record. Returns `None` when no record
    /// has this id; nothing is written in that case.
    async fn update_livestream(&self, id: &str, changes: &LivestreamChanges)
        -> Result<Option<Livestream>, StoreError>;

    async fn delete_livestream(&self, id: &str) -> Result<bool, StoreError>;

    /// Atomically add `delta` to the viewer count. The write is skipped when
    /// the result would be negative. Returns whether a row was changed.
    async fn increment_viewer_count(&self, id: &str, delta: i64) -> Result<bool, StoreError>;

    async fn set_viewer_count(&self, id: &str, count: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Comments for a livestream in no particular order
    async fn list_comments(&self, livestream_id: &str) -> Result<Vec<Comment>, StoreError>;

    async fn insert_comment(&self, comment: &Comment) -> Result<Comment, StoreError>;
}

#[async_trait]
pub trait FriendStore: Send + Sync {
    async fn find_friend_request(&self, recipient_id: &str, sender_id: &str)
        -> Result<Option<FriendRequest>, StoreError>;

    async fn list_friend_requests(&self, recipient_id: &str) -> Result<Vec<FriendRequest>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the pair already has a request
    async fn insert_friend_request(&self, request: &FriendRequest) -> Result<(), StoreError>;

    async fn delete_friend_request(&self, recipient_id: &str, sender_id: &str) -> Result<bool, StoreError>;

    async fn find_friend(&self, user_id: &str, friend_id: &str) -> Result<Option<Friend>, StoreError>;

    async fn list_friends(&self, user_id: &str) -> Result<Vec<Friend>, StoreError>;

    /// Delete the pending request and write both friend records in one
    /// atomic commit. Returns `false` without writing if the request is gone.
    async fn accept_friend_request(&self, recipient_id: &str, sender_id: &str) -> Result<bool, StoreError>;

    /// Delete both directions of a friendship atomically
    async fn delete_friendship(&self, user_a: &str, user_b: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait NotificationSettingsStore: Send + Sync {
    async fn find_notification_settings(&self, user_id: &str) -> Result<Option<NotificationSettings>, StoreError>;

    /// Insert or replace the full settings record
    async fn save_notification_settings(
        &self,
        user_id: &str,
        settings: NotificationSettings,
    ) -> Result<NotificationSettings, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Upsert billing fields after a completed checkout
    async fn record_checkout(&self, completion: &CheckoutCompletion) -> Result<User, StoreError>;

    /// Clear tier and subscription from whoever holds `subscription_id`
    async fn clear_subscription(&self, subscription_id: &str) -> Result<Option<User>, StoreError>;
}

/// A backend serving every collection
#[async_trait]
pub trait Store: LivestreamStore + CommentStore + FriendStore + NotificationSettingsStore + UserStore {
    /// Cheap liveness check
    async fn ping(&self) -> Result<(), StoreError>;
}
