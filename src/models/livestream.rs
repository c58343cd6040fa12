// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};

use super::ParseEnumError;
use crate::schema::livestreams;

/// Broadcast state of a livestream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum LivestreamStatus {
    Live,
    Scheduled,
}

impl LivestreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LivestreamStatus::Live => "live",
            LivestreamStatus::Scheduled => "scheduled",
        }
    }
}

impl FromStr for LivestreamStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live" => Ok(LivestreamStatus::Live),
            "scheduled" => Ok(LivestreamStatus::Scheduled),
            other => Err(ParseEnumError::new("livestream status", other)),
        }
    }
}

impl ToSql<Text, Pg> for LivestreamStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for LivestreamStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(raw.parse()?)
    }
}

/// A livestream record as persisted
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = livestreams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Livestream {
    pub id: String,
    pub creator_id: String,
    pub creator_name: String,
    pub creator_photo: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: LivestreamStatus,
    pub viewer_count: i64,
    pub tags: Vec<String>,
    pub is_premium: bool,
    pub started_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Livestream {
    /// Build a fresh record from a creation request. Status is always live
    /// and the viewer count always starts at zero.
    pub fn new(id: String, request: CreateLivestream, now: DateTime<Utc>) -> Self {
        Self {
            id,
            creator_id: request.creator_id,
            creator_name: request.creator_name,
            creator_photo: request.creator_photo,
            title: request.title.trim().to_string(),
            description: request.description,
            status: LivestreamStatus::Live,
            viewer_count: 0,
            tags: request.tags,
            is_premium: request.is_premium,
            started_at: now,
            created_at: now,
        }
    }

    /// Case-insensitive substring match on title, creator name or any tag.
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.creator_name.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }

    /// Apply a partial update in place. Used by backends without a native merge.
    pub fn apply(&mut self, changes: &LivestreamChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(description) = &changes.description {
            self.description = Some(description.clone());
        }
        if let Some(creator_name) = &changes.creator_name {
            self.creator_name = creator_name.clone();
        }
        if let Some(creator_photo) = &changes.creator_photo {
            self.creator_photo = Some(creator_photo.clone());
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(tags) = &changes.tags {
            self.tags = tags.clone();
        }
        if let Some(is_premium) = changes.is_premium {
            self.is_premium = is_premium;
        }
    }
}

/// Body of a livestream creation request. Any status or viewer count sent
/// by the client is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLivestream {
    #[serde(default)]
    pub creator_id: String,
    #[serde(default)]
    pub creator_name: String,
    pub creator_photo: Option<String>,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_premium: bool,
}

/// Partial livestream update. The viewer count is absent: it
/// only moves through the viewer operations.
#[derive(Debug, Clone, Default, AsChangeset, Deserialize)]
#[diesel(table_name = livestreams)]
#[serde(rename_all = "camelCase")]
pub struct LivestreamChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub creator_name: Option<String>,
    pub creator_photo: Option<String>,
    pub status: Option<LivestreamStatus>,
    pub tags: Option<Vec<String>>,
    pub is_premium: Option<bool>,
}

impl LivestreamChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.creator_name.is_none()
            && self.creator_photo.is_none()
            && self.status.is_none()
            && self.tags.is_none()
            && self.is_premium.is_none()
    }
}

/// Status and audience of a single stream
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStatus {
    pub id: String,
    pub status: LivestreamStatus,
    pub viewer_count: i64,
}

impl From<&Livestream> for StreamStatus {
    fn from(livestream: &Livestream) -> Self {
        Self {
            id: livestream.id.clone(),
            status: livestream.status,
            viewer_count: livestream.viewer_count,
        }
    }
}
