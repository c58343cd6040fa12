// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tracing::debug;

use crate::error::ServiceResult;
use crate::models::{NotificationFlag, NotificationSettings, NotificationSettingsPatch};
use crate::store::NotificationSettingsStore;

pub struct NotificationService {
    store: Arc<dyn NotificationSettingsStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationSettingsStore>) -> Self {
        Self { store }
    }

    /// Stored settings, or the defaults. Reading never creates a record.
    pub async fn get(&self, user_id: &str) -> ServiceResult<NotificationSettings> {
        Ok(self
            .store
            .find_notification_settings(user_id)
            .await?
            .unwrap_or_default())
    }

    /// Write the given flags over the defaults. Flags left out of `patch`
    /// go back to their default value.
    pub async fn update(&self, user_id: &str, patch: NotificationSettingsPatch) -> ServiceResult<NotificationSettings> {
        let settings = NotificationSettings::merged_with_defaults(&patch);
        let saved = self.store.save_notification_settings(user_id, settings).await?;
        debug!("Updated notification settings for {}", user_id);
        Ok(saved)
    }

    /// Flip one flag, keeping the others at their current value
    pub async fn toggle(&self, user_id: &str, flag: NotificationFlag) -> ServiceResult<NotificationSettings> {
        let mut settings = self.get(user_id).await?;
        settings.set(flag, !settings.get(flag));
        Ok(self.store.save_notification_settings(user_id, settings).await?)
    }
}
