// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::ParseEnumError;
use crate::schema::notification_settings;

/// Effective notification preferences for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub follow: bool,
    pub like: bool,
    pub comment: bool,
    pub challenge: bool,
    pub payment: bool,
    pub email: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            follow: true,
            like: true,
            comment: true,
            challenge: true,
            payment: true,
            email: false,
        }
    }
}

impl NotificationSettings {
    /// Defaults overlaid with the given flags. Omitted flags fall back to the
    /// default, not to any previously stored value.
    pub fn merged_with_defaults(patch: &NotificationSettingsPatch) -> Self {
        let defaults = Self::default();
        Self {
            follow: patch.follow.unwrap_or(defaults.follow),
            like: patch.like.unwrap_or(defaults.like),
            comment: patch.comment.unwrap_or(defaults.comment),
            challenge: patch.challenge.unwrap_or(defaults.challenge),
            payment: patch.payment.unwrap_or(defaults.payment),
            email: patch.email.unwrap_or(defaults.email),
        }
    }

    pub fn get(&self, flag: NotificationFlag) -> bool {
        match flag {
            NotificationFlag::Follow => self.follow,
            NotificationFlag::Like => self.like,
            NotificationFlag::Comment => self.comment,
            NotificationFlag::Challenge => self.challenge,
            NotificationFlag::Payment => self.payment,
            NotificationFlag::Email => self.email,
        }
    }

    pub fn set(&mut self, flag: NotificationFlag, value: bool) {
        let slot = match flag {
            NotificationFlag::Follow => &mut self.follow,
            NotificationFlag::Like => &mut self.like,
            NotificationFlag::Comment => &mut self.comment,
            NotificationFlag::Challenge => &mut self.challenge,
            NotificationFlag::Payment => &mut self.payment,
            NotificationFlag::Email => &mut self.email,
        };
        *slot = value;
    }
}

/// Flags sent with an update request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationSettingsPatch {
    pub follow: Option<bool>,
    pub like: Option<bool>,
    pub comment: Option<bool>,
    pub challenge: Option<bool>,
    pub payment: Option<bool>,
    pub email: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationFlag {
    Follow,
    Like,
    Comment,
    Challenge,
    Payment,
    Email,
}

impl FromStr for NotificationFlag {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(NotificationFlag::Follow),
            "like" => Ok(NotificationFlag::Like),
            "comment" => Ok(NotificationFlag::Comment),
            "challenge" => Ok(NotificationFlag::Challenge),
            "payment" => Ok(NotificationFlag::Payment),
            "email" => Ok(NotificationFlag::Email),
            other => Err(ParseEnumError::new("notification flag", other)),
        }
    }
}

/// Persisted settings row
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = notification_settings)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationSettingsRow {
    pub user_id: String,
    pub follow_enabled: bool,
    pub like_enabled: bool,
    pub comment_enabled: bool,
    pub challenge_enabled: bool,
    pub payment_enabled: bool,
    pub email_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl NotificationSettingsRow {
    pub fn new(user_id: &str, settings: NotificationSettings, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            follow_enabled: settings.follow,
            like_enabled: settings.like,
            comment_enabled: settings.comment,
            challenge_enabled: settings.challenge,
            payment_enabled: settings.payment,
            email_enabled: settings.email,
            updated_at: now,
        }
    }
}

impl From<NotificationSettingsRow> for NotificationSettings {
    fn from(row: NotificationSettingsRow) -> Self {
        Self {
            follow: row.follow_enabled,
            like: row.like_enabled,
            comment: row.comment_enabled,
            challenge: row.challenge_enabled,
            payment: row.payment_enabled,
            email: row.email_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything_but_email() {
        let settings = NotificationSettings::default();
        assert!(settings.follow && settings.like && settings.comment);
        assert!(settings.challenge && settings.payment);
        assert!(!settings.email);
    }

    #[test]
    fn merge_resets_omitted_flags() {
        let patch = NotificationSettingsPatch {
            email: Some(true),
            like: Some(false),
            ..Default::default()
        };
        let merged = NotificationSettings::merged_with_defaults(&patch);
        assert!(merged.email);
        assert!(!merged.like);
        assert!(merged.follow);
    }

    #[test]
    fn set_and_get_round_through_flags() {
        let mut settings = NotificationSettings::default();
        settings.set(NotificationFlag::Challenge, false);
        assert!(!settings.get(NotificationFlag::Challenge));
        assert_eq!("payment".parse::<NotificationFlag>().unwrap(), NotificationFlag::Payment);
        assert!("sms".parse::<NotificationFlag>().is_err());
    }
}
