// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::api::response::{ApiError, ApiResponse, ApiResult};
use crate::api::AppState;
use crate::models::{CreateLivestream, Livestream, LivestreamChanges, LivestreamStatus, StreamStatus};
use crate::services::BestEffort;

/// Query parameters for listing livestreams
#[derive(Debug, Deserialize)]
pub struct LivestreamsQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamAction {
    Increment,
    Decrement,
    Reset,
}

#[derive(Debug, Deserialize)]
pub struct StreamActionRequest {
    pub action: StreamAction,
}

/// Viewer count after a stream action. `viewer_count` is absent when the
/// count could not be determined, and `status` when the lookup failed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerCountResponse {
    pub id: String,
    pub status: Option<LivestreamStatus>,
    pub viewer_count: Option<i64>,
}

fn parse_status(raw: Option<&str>) -> ApiResult<Option<LivestreamStatus>> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e: crate::models::ParseEnumError| ApiError::bad_request(e.to_string())),
    }
}

pub async fn list_livestreams(
    State(state): State<AppState>,
    Query(query): Query<LivestreamsQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Livestream>>>> {
    let status = parse_status(query.status.as_deref())?;
    let livestreams = state.livestreams.list(status, query.search.as_deref()).await?;
    let total = livestreams.len();
    Ok(Json(ApiResponse::success(livestreams).with_total(total)))
}

pub async fn create_livestream(
    State(state): State<AppState>,
    payload: Result<Json<CreateLivestream>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Livestream>>)> {
    let Json(request) = payload?;
    let livestream = state.livestreams.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(livestream))))
}

pub async fn get_livestream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Livestream>>> {
    let livestream = state
        .livestreams
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Livestream not found"))?;
    Ok(Json(ApiResponse::success(livestream)))
}

pub async fn update_livestream(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<LivestreamChanges>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Livestream>>> {
    let Json(changes) = payload?;
    let livestream = state.livestreams.update(&id, changes).await?;
    Ok(Json(ApiResponse::success(livestream)))
}

pub async fn delete_livestream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Value>>> {
    state.livestreams.delete(&id).await?;
    Ok(Json(ApiResponse::success(json!({ "id": id }))))
}

pub async fn get_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<StreamStatus>>> {
    let status = state
        .livestreams
        .stream_status(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Livestream not found"))?;
    Ok(Json(ApiResponse::success(status)))
}

pub async fn update_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StreamActionRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<ViewerCountResponse>>> {
    let Json(request) = payload?;

    // Only a confirmed absence is a 404; a failed lookup degrades
    let lookup = BestEffort::from_result(state.livestreams.get_by_id(&id).await, "stream_lookup");
    let status = match lookup {
        BestEffort::Fresh(Some(livestream)) => Some(livestream.status),
        BestEffort::Fresh(None) => return Err(ApiError::not_found("Livestream not found")),
        BestEffort::Degraded => None,
    };

    debug!("Stream action {:?} on {}", request.action, id);
    let outcome = match request.action {
        StreamAction::Increment => state.livestreams.add_viewer(&id).await,
        StreamAction::Decrement => state.livestreams.remove_viewer(&id).await,
        StreamAction::Reset => state.livestreams.reset_viewer_count(&id).await,
    };

    let degraded = status.is_none() || outcome.is_degraded();
    let mut response = ApiResponse::success(ViewerCountResponse {
        id,
        status,
        viewer_count: outcome.fresh(),
    });
    response.degraded = degraded;
    Ok(Json(response))
}
