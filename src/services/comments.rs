// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::comment::sort_newest_first;
use crate::models::{Comment, NewCommentRequest};
use crate::store::CommentStore;

/// Append-only comments on livestreams
pub struct CommentService {
    store: Arc<dyn CommentStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn CommentStore>) -> Self {
        Self { store }
    }

    /// Comments for a livestream, newest first
    pub async fn list(&self, livestream_id: &str) -> ServiceResult<Vec<Comment>> {
        let mut comments = self.store.list_comments(livestream_id).await?;
        // The store does not guarantee any order
        sort_newest_first(&mut comments);
        Ok(comments)
    }

    pub async fn add(&self, livestream_id: &str, request: NewCommentRequest) -> ServiceResult<Comment> {
        if request.author_id.trim().is_empty() {
            return Err(ServiceError::validation("authorId is required"));
        }
        if request.content.trim().is_empty() {
            return Err(ServiceError::validation("content is required"));
        }

        let comment = Comment::new(Uuid::now_v7().to_string(), livestream_id, request, Utc::now());
        let saved = self.store.insert_comment(&comment).await?;

        debug!("Added comment {} to livestream {}", saved.id, livestream_id);
        Ok(saved)
    }
}
