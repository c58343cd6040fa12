// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use crate::api::response::{ApiError, ApiResponse, ApiResult};
use crate::api::AppState;
use crate::models::{NotificationFlag, NotificationSettings, NotificationSettingsPatch, ParseEnumError};

pub async fn get_settings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiResponse<NotificationSettings>>> {
    let settings = state.notifications.get(&user_id).await?;
    Ok(Json(ApiResponse::success(settings)))
}

/// Replace the settings, filling omitted flags with defaults
pub async fn update_settings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<NotificationSettingsPatch>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<NotificationSettings>>> {
    let Json(patch) = payload?;
    let settings = state.notifications.update(&user_id, patch).await?;
    Ok(Json(ApiResponse::success(settings)))
}

pub async fn toggle_setting(
    State(state): State<AppState>,
    Path((user_id, flag)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<NotificationSettings>>> {
    let flag: NotificationFlag = flag
        .parse()
        .map_err(|e: ParseEnumError| ApiError::bad_request(e.to_string()))?;
    let settings = state.notifications.toggle(&user_id, flag).await?;
    Ok(Json(ApiResponse::success(settings)))
}
