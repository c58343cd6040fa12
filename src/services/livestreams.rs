// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::BestEffort;
use crate::error::{ServiceError, ServiceResult};
use crate::metrics::VIEWER_EVENTS;
use crate::models::{CreateLivestream, Livestream, LivestreamChanges, LivestreamStatus, StreamStatus};
use crate::store::LivestreamStore;

/// Owns livestream records and their viewer counters
pub struct LivestreamService {
    store: Arc<dyn LivestreamStore>,
}

impl LivestreamService {
    pub fn new(store: Arc<dyn LivestreamStore>) -> Self {
        Self { store }
    }

    /// All livestreams, optionally restricted to a status and filtered by a
    /// case-insensitive search over title, creator name and tags
    pub async fn list(&self, status: Option<LivestreamStatus>, search: Option<&str>) -> ServiceResult<Vec<Livestream>> {
        let mut livestreams = self.store.list_livestreams(status).await?;

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let needle = term.to_lowercase();
            livestreams.retain(|l| l.matches_search(&needle));
        }

        debug!("Listed {} livestreams (status: {:?}, search: {:?})", livestreams.len(), status, search);
        Ok(livestreams)
    }

    pub async fn get_by_id(&self, id: &str) -> ServiceResult<Option<Livestream>> {
        Ok(self.store.find_livestream(id).await?)
    }

    pub async fn create(&self, request: CreateLivestream) -> ServiceResult<Livestream> {
        if request.creator_id.trim().is_empty() {
            return Err(ServiceError::validation("creatorId is required"));
        }
        if request.title.trim().is_empty() {
            return Err(ServiceError::validation("title is required"));
        }

        let livestream = Livestream::new(Uuid::now_v7().to_string(), request, Utc::now());
        let created = self.store.insert_livestream(&livestream).await?;

        info!("Created livestream {} for creator {}", created.id, created.creator_id);
        Ok(created)
    }

    /// Merge fields into an existing livestream. Missing ids are not created.
    pub async fn update(&self, id: &str, mut changes: LivestreamChanges) -> ServiceResult<Livestream> {
        if let Some(title) = changes.title.take() {
            let title = title.trim();
            if title.is_empty() {
                return Err(ServiceError::validation("title cannot be empty"));
            }
            changes.title = Some(title.to_string());
        }

        self.store
            .update_livestream(id, &changes)
            .await?
            .ok_or(ServiceError::NotFound("Livestream"))
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        if !self.store.delete_livestream(id).await? {
            return Err(ServiceError::NotFound("Livestream"));
        }
        info!("Deleted livestream {}", id);
        Ok(())
    }

    pub async fn stream_status(&self, id: &str) -> ServiceResult<Option<StreamStatus>> {
        Ok(self.store.find_livestream(id).await?.as_ref().map(StreamStatus::from))
    }

    /// Count a viewer joining. Returns the count read back after the atomic
    /// increment; concurrent writers may already have moved it.
    pub async fn add_viewer(&self, id: &str) -> BestEffort<i64> {
        let result: ServiceResult<i64> = async {
            if !self.store.increment_viewer_count(id, 1).await? {
                return Err(ServiceError::NotFound("Livestream"));
            }
            self.current_viewers(id).await
        }
        .await;

        record("increment", BestEffort::from_result(result, "add_viewer"))
    }

    /// Count a viewer leaving. The counter never drops below zero.
    pub async fn remove_viewer(&self, id: &str) -> BestEffort<i64> {
        let result: ServiceResult<i64> = async {
            let current = self.current_viewers(id).await?;
            if current <= 0 {
                return Ok(0);
            }
            // The store refuses to go below zero if another leave won the race
            self.store.increment_viewer_count(id, -1).await?;
            self.current_viewers(id).await
        }
        .await;

        record("decrement", BestEffort::from_result(result, "remove_viewer"))
    }

    /// Zero the counter, used when a stream ends
    pub async fn reset_viewer_count(&self, id: &str) -> BestEffort<i64> {
        let result: ServiceResult<i64> = async {
            if !self.store.set_viewer_count(id, 0).await? {
                return Err(ServiceError::NotFound("Livestream"));
            }
            Ok(0)
        }
        .await;

        record("reset", BestEffort::from_result(result, "reset_viewer_count"))
    }

    async fn current_viewers(&self, id: &str) -> ServiceResult<i64> {
        self.store
            .find_livestream(id)
            .await?
            .map(|l| l.viewer_count.max(0))
            .ok_or(ServiceError::NotFound("Livestream"))
    }
}

fn record(action: &str, outcome: BestEffort<i64>) -> BestEffort<i64> {
    let label = if outcome.is_degraded() { "degraded" } else { "ok" };
    VIEWER_EVENTS.with_label_values(&[action, label]).inc();
    outcome
}
