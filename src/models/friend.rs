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
use crate::schema::{friend_requests, friends};

/// Who a user is, as carried on requests and records
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
}

impl FromStr for FriendRequestStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FriendRequestStatus::Pending),
            other => Err(ParseEnumError::new("friend request status", other)),
        }
    }
}

impl ToSql<Text, Pg> for FriendRequestStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match self {
            FriendRequestStatus::Pending => out.write_all(b"pending")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for FriendRequestStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(raw.parse()?)
    }
}

/// Pending friend request stored in the recipient's inbox. Its identifier
/// is the sender's id.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = friend_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub recipient_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_photo: Option<String>,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
}

impl FriendRequest {
    pub fn pending(sender: UserIdentity, recipient_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            recipient_id: recipient_id.to_string(),
            sender_id: sender.id,
            sender_name: sender.name,
            sender_photo: sender.photo,
            status: FriendRequestStatus::Pending,
            created_at: now,
        }
    }
}

/// One direction of a friendship. Every record has a mirror with the ids
/// swapped.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = friends)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub user_id: String,
    pub friend_id: String,
    pub created_at: DateTime<Utc>,
}

impl Friend {
    /// Both directions of a new friendship. Each side gets its own timestamp.
    pub fn pair(a: &str, b: &str) -> Vec<Friend> {
        vec![
            Friend {
                user_id: a.to_string(),
                friend_id: b.to_string(),
                created_at: Utc::now(),
            },
            Friend {
                user_id: b.to_string(),
                friend_id: a.to_string(),
                created_at: Utc::now(),
            },
        ]
    }
}
