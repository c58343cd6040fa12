// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    CommentStore, FriendStore, LivestreamStore, NotificationSettingsStore, Store, StoreError, UserStore,
};
use crate::models::{
    CheckoutCompletion, Comment, Friend, FriendRequest, Livestream, LivestreamChanges, LivestreamStatus,
    NotificationSettings, User,
};

#[derive(Default)]
struct Collections {
    livestreams: HashMap<String, Livestream>,
    comments: Vec<Comment>,
    // (recipient, sender)
    friend_requests: BTreeMap<(String, String), FriendRequest>,
    // (user, friend)
    friends: BTreeMap<(String, String), Friend>,
    notification_settings: HashMap<String, NotificationSettings>,
    users: HashMap<String, User>,
}

/// In-process backend. Every multi-record write happens under a single
/// write lock, which gives the same atomicity as the database transactions.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted notification settings records
    pub async fn notification_settings_count(&self) -> usize {
        self.inner.read().await.notification_settings.len()
    }
}

fn key(a: &str, b: &str) -> (String, String) {
    (a.to_string(), b.to_string())
}

#[async_trait]
impl LivestreamStore for MemoryStore {
    async fn list_livestreams(&self, status: Option<LivestreamStatus>) -> Result<Vec<Livestream>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .livestreams
            .values()
            .filter(|l| status.map_or(true, |s| l.status == s))
            .cloned()
            .collect())
    }

    async fn find_livestream(&self, id: &str) -> Result<Option<Livestream>, StoreError> {
        Ok(self.inner.read().await.livestreams.get(id).cloned())
    }

    async fn insert_livestream(&self, livestream: &Livestream) -> Result<Livestream, StoreError> {
        let mut inner = self.inner.write().await;
        inner.livestreams.insert(livestream.id.clone(), livestream.clone());
        Ok(livestream.clone())
    }

    async fn update_livestream(
        &self,
        id: &str,
        changes: &LivestreamChanges,
    ) -> Result<Option<Livestream>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.livestreams.get_mut(id).map(|livestream| {
            livestream.apply(changes);
            livestream.clone()
        }))
    }

    async fn delete_livestream(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.livestreams.remove(id).is_some())
    }

    async fn increment_viewer_count(&self, id: &str, delta: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.livestreams.get_mut(id) {
            Some(livestream) if livestream.viewer_count + delta >= 0 => {
                livestream.viewer_count += delta;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_viewer_count(&self, id: &str, count: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.livestreams.get_mut(id) {
            Some(livestream) => {
                livestream.viewer_count = count;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn list_comments(&self, livestream_id: &str) -> Result<Vec<Comment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .comments
            .iter()
            .filter(|c| c.livestream_id == livestream_id)
            .cloned()
            .collect())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<Comment, StoreError> {
        self.inner.write().await.comments.push(comment.clone());
        Ok(comment.clone())
    }
}

#[async_trait]
impl FriendStore for MemoryStore {
    async fn find_friend_request(
        &self,
        recipient_id: &str,
        sender_id: &str,
    ) -> Result<Option<FriendRequest>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.friend_requests.get(&key(recipient_id, sender_id)).cloned())
    }

    async fn list_friend_requests(&self, recipient_id: &str) -> Result<Vec<FriendRequest>, StoreError> {
        let inner = self.inner.read().await;
        let mut requests: Vec<FriendRequest> = inner
            .friend_requests
            .values()
            .filter(|r| r.recipient_id == recipient_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn insert_friend_request(&self, request: &FriendRequest) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match inner.friend_requests.entry(key(&request.recipient_id, &request.sender_id)) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(request.clone());
                Ok(())
            }
        }
    }

    async fn delete_friend_request(&self, recipient_id: &str, sender_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.friend_requests.remove(&key(recipient_id, sender_id)).is_some())
    }

    async fn find_friend(&self, user_id: &str, friend_id: &str) -> Result<Option<Friend>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.friends.get(&key(user_id, friend_id)).cloned())
    }

    async fn list_friends(&self, user_id: &str) -> Result<Vec<Friend>, StoreError> {
        let inner = self.inner.read().await;
        let mut friends: Vec<Friend> = inner
            .friends
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        friends.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(friends)
    }

    async fn accept_friend_request(&self, recipient_id: &str, sender_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.friend_requests.remove(&key(recipient_id, sender_id)).is_none() {
            return Ok(false);
        }
        for friend in Friend::pair(recipient_id, sender_id) {
            inner
                .friends
                .entry(key(&friend.user_id, &friend.friend_id))
                .or_insert(friend);
        }
        Ok(true)
    }

    async fn delete_friendship(&self, user_a: &str, user_b: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.friends.remove(&key(user_a, user_b));
        inner.friends.remove(&key(user_b, user_a));
        Ok(())
    }
}

#[async_trait]
impl NotificationSettingsStore for MemoryStore {
    async fn find_notification_settings(&self, user_id: &str) -> Result<Option<NotificationSettings>, StoreError> {
        Ok(self.inner.read().await.notification_settings.get(user_id).copied())
    }

    async fn save_notification_settings(
        &self,
        user_id: &str,
        settings: NotificationSettings,
    ) -> Result<NotificationSettings, StoreError> {
        let mut inner = self.inner.write().await;
        inner.notification_settings.insert(user_id.to_string(), settings);
        Ok(settings)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn record_checkout(&self, completion: &CheckoutCompletion) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let existing = inner.users.remove(&completion.user_id);
        let merged = User::with_checkout(existing, completion, Utc::now());
        inner.users.insert(merged.id.clone(), merged.clone());
        Ok(merged)
    }

    async fn clear_subscription(&self, subscription_id: &str) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;
        let holder = inner
            .users
            .values()
            .find(|u| u.stripe_subscription_id.as_deref() == Some(subscription_id))
            .map(|u| u.id.clone());

        Ok(holder.and_then(|id| {
            let user = inner.users.remove(&id)?.without_subscription(Utc::now());
            inner.users.insert(id, user.clone());
            Some(user)
        }))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateLivestream, UserIdentity};

    fn livestream(id: &str) -> Livestream {
        Livestream::new(
            id.to_string(),
            CreateLivestream {
                creator_id: "creator".to_string(),
                creator_name: "Creator".to_string(),
                title: "Title".to_string(),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn viewer_increment_never_goes_negative() {
        let store = MemoryStore::new();
        store.insert_livestream(&livestream("ls")).await.unwrap();

        assert!(!store.increment_viewer_count("ls", -1).await.unwrap());
        assert!(store.increment_viewer_count("ls", 1).await.unwrap());
        assert!(store.increment_viewer_count("ls", -1).await.unwrap());
        assert!(!store.increment_viewer_count("ls", -1).await.unwrap());

        let stored = store.find_livestream("ls").await.unwrap().unwrap();
        assert_eq!(stored.viewer_count, 0);
    }

    #[tokio::test]
    async fn update_of_missing_livestream_writes_nothing() {
        let store = MemoryStore::new();
        let changes = LivestreamChanges {
            title: Some("ghost".to_string()),
            ..Default::default()
        };
        assert!(store.update_livestream("missing", &changes).await.unwrap().is_none());
        assert!(store.list_livestreams(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn accept_without_request_writes_no_friends() {
        let store = MemoryStore::new();
        assert!(!store.accept_friend_request("bob", "alice").await.unwrap());
        assert!(store.list_friends("bob").await.unwrap().is_empty());

        let sender = UserIdentity {
            id: "alice".to_string(),
            name: "Alice".to_string(),
            photo: None,
        };
        store
            .insert_friend_request(&FriendRequest::pending(sender, "bob", Utc::now()))
            .await
            .unwrap();
        assert!(store.accept_friend_request("bob", "alice").await.unwrap());
        assert!(store.find_friend("alice", "bob").await.unwrap().is_some());
        assert!(store.find_friend("bob", "alice").await.unwrap().is_some());
        assert!(store.find_friend_request("bob", "alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_request_for_same_pair_conflicts() {
        let store = MemoryStore::new();
        let sender = UserIdentity {
            id: "alice".to_string(),
            name: "Alice".to_string(),
            photo: None,
        };
        let request = FriendRequest::pending(sender, "bob", Utc::now());

        store.insert_friend_request(&request).await.unwrap();
        assert!(matches!(
            store.insert_friend_request(&request).await,
            Err(StoreError::Conflict)
        ));
        assert_eq!(store.list_friend_requests("bob").await.unwrap().len(), 1);
    }

    #[test]
    fn notification_settings_round_trip_through_save() {
        let store = MemoryStore::new();
        let settings = NotificationSettings {
            email: true,
            ..Default::default()
        };

        tokio_test::block_on(async {
            assert!(store.find_notification_settings("dana").await.unwrap().is_none());
            store.save_notification_settings("dana", settings).await.unwrap();
            assert_eq!(store.find_notification_settings("dana").await.unwrap(), Some(settings));
            assert_eq!(store.notification_settings_count().await, 1);
        });
    }
}
