// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::models::{Comment, NewCommentRequest};

/// Comments on a livestream, newest first
pub async fn list_comments(
    State(state): State<AppState>,
    Path(livestream_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<Comment>>>> {
    let comments = state.comments.list(&livestream_id).await?;
    let total = comments.len();
    Ok(Json(ApiResponse::success(comments).with_total(total)))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(livestream_id): Path<String>,
    payload: Result<Json<NewCommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Comment>>)> {
    let Json(request) = payload?;
    let comment = state.comments.add(&livestream_id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(comment))))
}
