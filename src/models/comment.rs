// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::comments;

/// Comment attached to a livestream. Comments are append-only.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub livestream_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_photo: Option<String>,
    pub content: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

/// Body of a new comment
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentRequest {
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    pub author_photo: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl Comment {
    pub fn new(id: String, livestream_id: &str, request: NewCommentRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            livestream_id: livestream_id.to_string(),
            author_id: request.author_id,
            author_name: request.author_name,
            author_photo: request.author_photo,
            content: request.content.trim().to_string(),
            likes: 0,
            created_at: now,
        }
    }
}

/// Order comments newest first
pub fn sort_newest_first(comments: &mut [Comment]) {
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
