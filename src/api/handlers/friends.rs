// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::AppState;
use crate::models::{Friend, FriendRequest, UserIdentity};

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendshipStatus {
    pub are_friends: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct PendingStatus {
    pub pending: bool,
}

pub async fn list_friends(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<ApiResponse<Vec<Friend>>> {
    let response = ApiResponse::best_effort(state.friends.list_friends(&user_id).await);
    let total = response.data.as_ref().map_or(0, Vec::len);
    Json(response.with_total(total))
}

pub async fn check_friendship(
    State(state): State<AppState>,
    Path((user_id, other_id)): Path<(String, String)>,
) -> Json<ApiResponse<FriendshipStatus>> {
    let status = state
        .friends
        .are_friends(&user_id, &other_id)
        .await
        .map(|are_friends| FriendshipStatus { are_friends });
    Json(ApiResponse::best_effort(status))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    Path((user_id, other_id)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<Value>>> {
    state.friends.remove_friend(&user_id, &other_id).await?;
    Ok(Json(ApiResponse::success(json!({
        "userId": user_id,
        "friendId": other_id
    }))))
}

/// Pending requests in a user's inbox
pub async fn list_requests(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<ApiResponse<Vec<FriendRequest>>> {
    let response = ApiResponse::best_effort(state.friends.list_pending_requests(&user_id).await);
    let total = response.data.as_ref().map_or(0, Vec::len);
    Json(response.with_total(total))
}

/// Send a request from the body's sender to the user in the path
pub async fn send_request(
    State(state): State<AppState>,
    Path(recipient_id): Path<String>,
    payload: Result<Json<UserIdentity>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<FriendRequest>>)> {
    let Json(sender) = payload?;
    let request = state.friends.send_request(sender, &recipient_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(request))))
}

pub async fn check_request(
    State(state): State<AppState>,
    Path((user_id, sender_id)): Path<(String, String)>,
) -> Json<ApiResponse<PendingStatus>> {
    let status = state
        .friends
        .has_pending_request(&sender_id, &user_id)
        .await
        .map(|pending| PendingStatus { pending });
    Json(ApiResponse::best_effort(status))
}

pub async fn accept_request(
    State(state): State<AppState>,
    Path((user_id, sender_id)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<Value>>> {
    state.friends.accept_request(&user_id, &sender_id).await?;
    Ok(Json(ApiResponse::success(json!({
        "userId": user_id,
        "friendId": sender_id
    }))))
}

pub async fn reject_request(
    State(state): State<AppState>,
    Path((user_id, sender_id)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<Value>>> {
    state.friends.reject_request(&user_id, &sender_id).await?;
    Ok(Json(ApiResponse::success(json!({ "senderId": sender_id }))))
}
