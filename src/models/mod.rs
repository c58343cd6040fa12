// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod comment;
pub mod friend;
pub mod livestream;
pub mod notification;
pub mod user;

pub use comment::{Comment, NewCommentRequest};
pub use friend::{Friend, FriendRequest, FriendRequestStatus, UserIdentity};
pub use livestream::{CreateLivestream, Livestream, LivestreamChanges, LivestreamStatus, StreamStatus};
pub use notification::{NotificationFlag, NotificationSettings, NotificationSettingsPatch, NotificationSettingsRow};
pub use user::{CheckoutCompletion, Entitlement, Tier, User};

/// A string did not name a known enum variant
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
