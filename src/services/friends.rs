// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::BestEffort;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Friend, FriendRequest, UserIdentity};
use crate::store::{FriendStore, StoreError};

/// Friend requests and the symmetric friendships they turn into.
///
/// Per pair of users the lifecycle is none -> pending -> friends | none.
/// Write paths surface store errors; read paths degrade to empty results.
pub struct FriendService {
    store: Arc<dyn FriendStore>,
}

impl FriendService {
    pub fn new(store: Arc<dyn FriendStore>) -> Self {
        Self { store }
    }

    pub async fn send_request(&self, from: UserIdentity, to: &str) -> ServiceResult<FriendRequest> {
        if from.id.trim().is_empty() || to.trim().is_empty() {
            return Err(ServiceError::validation("sender and recipient are required"));
        }
        if from.id == to {
            return Err(ServiceError::validation("cannot send a friend request to yourself"));
        }

        if self.store.find_friend_request(to, &from.id).await?.is_some() {
            return Err(ServiceError::DuplicateRequest);
        }
        if self.store.find_friend(&from.id, to).await?.is_some() {
            return Err(ServiceError::AlreadyFriends);
        }

        let request = FriendRequest::pending(from, to, Utc::now());
        match self.store.insert_friend_request(&request).await {
            Ok(()) => {}
            // A concurrent request for the same pair won the insert
            Err(StoreError::Conflict) => return Err(ServiceError::DuplicateRequest),
            Err(e) => return Err(e.into()),
        }

        info!("Friend request sent from {} to {}", request.sender_id, to);
        Ok(request)
    }

    /// Accept the request `request_id` (the sender's id) in `user_id`'s inbox
    pub async fn accept_request(&self, user_id: &str, request_id: &str) -> ServiceResult<()> {
        if !self.store.accept_friend_request(user_id, request_id).await? {
            return Err(ServiceError::NotFound("Friend request"));
        }
        info!("{} accepted friend request from {}", user_id, request_id);
        Ok(())
    }

    pub async fn reject_request(&self, user_id: &str, request_id: &str) -> ServiceResult<()> {
        let deleted = self.store.delete_friend_request(user_id, request_id).await?;
        debug!("{} rejected friend request from {} (existed: {})", user_id, request_id, deleted);
        Ok(())
    }

    pub async fn remove_friend(&self, user_a: &str, user_b: &str) -> ServiceResult<()> {
        self.store.delete_friendship(user_a, user_b).await?;
        info!("Removed friendship between {} and {}", user_a, user_b);
        Ok(())
    }

    pub async fn are_friends(&self, user_id: &str, other_id: &str) -> BestEffort<bool> {
        let result = self.store.find_friend(user_id, other_id).await.map(|f| f.is_some());
        BestEffort::from_result(result, "are_friends")
    }

    /// Whether `from` has a pending request in `to`'s inbox
    pub async fn has_pending_request(&self, from: &str, to: &str) -> BestEffort<bool> {
        let result = self.store.find_friend_request(to, from).await.map(|r| r.is_some());
        BestEffort::from_result(result, "has_pending_request")
    }

    pub async fn list_friends(&self, user_id: &str) -> BestEffort<Vec<Friend>> {
        BestEffort::from_result(self.store.list_friends(user_id).await, "list_friends")
    }

    pub async fn list_pending_requests(&self, user_id: &str) -> BestEffort<Vec<FriendRequest>> {
        BestEffort::from_result(self.store.list_friend_requests(user_id).await, "list_pending_requests")
    }
}
