// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use super::{
    CommentStore, FriendStore, LivestreamStore, NotificationSettingsStore, Store, StoreError, UserStore,
};
use crate::db::{Database, DbConnection};
use crate::models::{
    CheckoutCompletion, Comment, Friend, FriendRequest, Livestream, LivestreamChanges, LivestreamStatus,
    NotificationSettings, NotificationSettingsRow, Tier, User,
};
use crate::schema::{comments, friend_requests, friends, livestreams, notification_settings, users};

/// PostgreSQL backend
pub struct PgStore {
    db: Arc<Database>,
}

impl PgStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn get_connection(&self) -> Result<DbConnection, StoreError> {
        Ok(self.db.get_connection().await?)
    }
}

#[async_trait]
impl LivestreamStore for PgStore {
    async fn list_livestreams(&self, status: Option<LivestreamStatus>) -> Result<Vec<Livestream>, StoreError> {
        let mut conn = self.get_connection().await?;

        let mut query = livestreams::table.select(Livestream::as_select()).into_boxed();
        if let Some(status) = status {
            query = query.filter(livestreams::status.eq(status));
        }

        Ok(query.load(&mut conn).await?)
    }

    async fn find_livestream(&self, id: &str) -> Result<Option<Livestream>, StoreError> {
        let mut conn = self.get_connection().await?;

        Ok(livestreams::table
            .find(id)
            .select(Livestream::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn insert_livestream(&self, livestream: &Livestream) -> Result<Livestream, StoreError> {
        let mut conn = self.get_connection().await?;

        Ok(diesel::insert_into(livestreams::table)
            .values(livestream)
            .returning(Livestream::as_returning())
            .get_result(&mut conn)
            .await?)
    }

    async fn update_livestream(
        &self,
        id: &str,
        changes: &LivestreamChanges,
    ) -> Result<Option<Livestream>, StoreError> {
        // Diesel rejects an empty SET clause
        if changes.is_empty() {
            return self.find_livestream(id).await;
        }

        let mut conn = self.get_connection().await?;

        Ok(diesel::update(livestreams::table.find(id))
            .set(changes)
            .returning(Livestream::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?)
    }

    async fn delete_livestream(&self, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.get_connection().await?;

        let deleted = diesel::delete(livestreams::table.find(id)).execute(&mut conn).await?;
        Ok(deleted > 0)
    }

    async fn increment_viewer_count(&self, id: &str, delta: i64) -> Result<bool, StoreError> {
        let mut conn = self.get_connection().await?;

        let updated = diesel::update(
            livestreams::table
                .find(id)
                .filter((livestreams::viewer_count + delta).ge(0)),
        )
        .set(livestreams::viewer_count.eq(livestreams::viewer_count + delta))
        .execute(&mut conn)
        .await?;

        debug!("Viewer count for {} changed by {} ({} rows)", id, delta, updated);
        Ok(updated > 0)
    }

    async fn set_viewer_count(&self, id: &str, count: i64) -> Result<bool, StoreError> {
        let mut conn = self.get_connection().await?;

        let updated = diesel::update(livestreams::table.find(id))
            .set(livestreams::viewer_count.eq(count))
            .execute(&mut conn)
            .await?;
        Ok(updated > 0)
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn list_comments(&self, livestream_id: &str) -> Result<Vec<Comment>, StoreError> {
        let mut conn = self.get_connection().await?;

        Ok(comments::table
            .filter(comments::livestream_id.eq(livestream_id))
            .select(Comment::as_select())
            .load(&mut conn)
            .await?)
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<Comment, StoreError> {
        let mut conn = self.get_connection().await?;

        Ok(diesel::insert_into(comments::table)
            .values(comment)
            .returning(Comment::as_returning())
            .get_result(&mut conn)
            .await?)
    }
}

#[async_trait]
impl FriendStore for PgStore {
    async fn find_friend_request(
        &self,
        recipient_id: &str,
        sender_id: &str,
    ) -> Result<Option<FriendRequest>, StoreError> {
        let mut conn = self.get_connection().await?;

        Ok(friend_requests::table
            .find((recipient_id, sender_id))
            .select(FriendRequest::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn list_friend_requests(&self, recipient_id: &str) -> Result<Vec<FriendRequest>, StoreError> {
        let mut conn = self.get_connection().await?;

        Ok(friend_requests::table
            .filter(friend_requests::recipient_id.eq(recipient_id))
            .order_by(friend_requests::created_at.desc())
            .select(FriendRequest::as_select())
            .load(&mut conn)
            .await?)
    }

    async fn insert_friend_request(&self, request: &FriendRequest) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;

        let result = diesel::insert_into(friend_requests::table)
            .values(request)
            .execute(&mut conn)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Err(StoreError::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_friend_request(&self, recipient_id: &str, sender_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.get_connection().await?;

        let deleted = diesel::delete(friend_requests::table.find((recipient_id, sender_id)))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn find_friend(&self, user_id: &str, friend_id: &str) -> Result<Option<Friend>, StoreError> {
        let mut conn = self.get_connection().await?;

        Ok(friends::table
            .find((user_id, friend_id))
            .select(Friend::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn list_friends(&self, user_id: &str) -> Result<Vec<Friend>, StoreError> {
        let mut conn = self.get_connection().await?;

        Ok(friends::table
            .filter(friends::user_id.eq(user_id))
            .order_by(friends::created_at.desc())
            .select(Friend::as_select())
            .load(&mut conn)
            .await?)
    }

    async fn accept_friend_request(&self, recipient_id: &str, sender_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.get_connection().await?;
        let recipient_id = recipient_id.to_string();
        let sender_id = sender_id.to_string();

        let accepted = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let deleted = diesel::delete(friend_requests::table.find((&recipient_id, &sender_id)))
                        .execute(conn)
                        .await?;
                    if deleted == 0 {
                        return Ok(false);
                    }

                    let pair = Friend::pair(&recipient_id, &sender_id);
                    diesel::insert_into(friends::table)
                        .values(&pair)
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;

                    Ok(true)
                }
                .scope_boxed()
            })
            .await?;

        Ok(accepted)
    }

    async fn delete_friendship(&self, user_a: &str, user_b: &str) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;

        // One statement removes both directions
        diesel::delete(
            friends::table.filter(
                friends::user_id
                    .eq(user_a)
                    .and(friends::friend_id.eq(user_b))
                    .or(friends::user_id.eq(user_b).and(friends::friend_id.eq(user_a))),
            ),
        )
        .execute(&mut conn)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationSettingsStore for PgStore {
    async fn find_notification_settings(&self, user_id: &str) -> Result<Option<NotificationSettings>, StoreError> {
        let mut conn = self.get_connection().await?;

        let row = notification_settings::table
            .find(user_id)
            .select(NotificationSettingsRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row.map(NotificationSettings::from))
    }

    async fn save_notification_settings(
        &self,
        user_id: &str,
        settings: NotificationSettings,
    ) -> Result<NotificationSettings, StoreError> {
        let mut conn = self.get_connection().await?;
        let row = NotificationSettingsRow::new(user_id, settings, Utc::now());

        let saved = diesel::insert_into(notification_settings::table)
            .values(&row)
            .on_conflict(notification_settings::user_id)
            .do_update()
            .set(&row)
            .returning(NotificationSettingsRow::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(saved.into())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let mut conn = self.get_connection().await?;

        Ok(users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn record_checkout(&self, completion: &CheckoutCompletion) -> Result<User, StoreError> {
        let mut conn = self.get_connection().await?;
        let completion = completion.clone();

        let user = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let existing = users::table
                        .find(&completion.user_id)
                        .select(User::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let merged = User::with_checkout(existing, &completion, Utc::now());

                    diesel::insert_into(users::table)
                        .values(&merged)
                        .on_conflict(users::id)
                        .do_update()
                        .set(&merged)
                        .returning(User::as_returning())
                        .get_result(conn)
                        .await
                }
                .scope_boxed()
            })
            .await?;

        Ok(user)
    }

    async fn clear_subscription(&self, subscription_id: &str) -> Result<Option<User>, StoreError> {
        let mut conn = self.get_connection().await?;

        Ok(
            diesel::update(users::table.filter(users::stripe_subscription_id.eq(subscription_id)))
                .set((
                    users::tier.eq(None::<Tier>),
                    users::stripe_subscription_id.eq(None::<String>),
                    users::updated_at.eq(Utc::now()),
                ))
                .returning(User::as_returning())
                .get_result(&mut conn)
                .await
                .optional()?,
        )
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        diesel::sql_query("SELECT 1").execute(&mut conn).await?;
        Ok(())
    }
}
