// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::api::AppState;
use crate::models::{Entitlement, ParseEnumError, Tier};
use crate::payments::{CheckoutSession, SIGNATURE_HEADER};
use crate::services::BillingError;

/// Billing routes answer with a bare `{error}` body
impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        let status = match &self {
            BillingError::Validation(_) | BillingError::Signature(_) | BillingError::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            BillingError::NotConfigured(_) | BillingError::Payment(_) | BillingError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!("Billing request failed: {}", self);
        } else {
            warn!("Billing request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn rejected(rejection: JsonRejection) -> BillingError {
    BillingError::Validation(rejection.body_text())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumCheckoutRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCheckoutRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub creator_id: String,
    #[serde(default)]
    pub creator_name: String,
    #[serde(default)]
    pub price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct EntitlementQuery {
    pub required: Option<String>,
}

pub async fn premium_checkout(
    State(state): State<AppState>,
    payload: Result<Json<PremiumCheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutSession>, BillingError> {
    let Json(request) = payload.map_err(rejected)?;
    let session = state
        .billing
        .create_premium_checkout(&request.user_id, &request.email)
        .await?;
    Ok(Json(session))
}

pub async fn subscription_checkout(
    State(state): State<AppState>,
    payload: Result<Json<SubscriptionCheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutSession>, BillingError> {
    let Json(request) = payload.map_err(rejected)?;
    let session = state
        .billing
        .create_subscription_checkout(
            &request.user_id,
            &request.email,
            &request.creator_id,
            &request.creator_name,
            request.price_cents,
        )
        .await?;
    Ok(Json(session))
}

/// Processor callback. The raw body is needed for signature verification.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, BillingError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());
    state.billing.handle_webhook(&body, signature).await?;
    Ok(Json(json!({ "received": true })))
}

pub async fn get_entitlement(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<EntitlementQuery>,
) -> Result<Json<Entitlement>, BillingError> {
    let required = match query.required.as_deref() {
        None | Some("") => Tier::Basic,
        Some(raw) => raw
            .parse()
            .map_err(|e: ParseEnumError| BillingError::Validation(e.to_string()))?,
    };
    let entitlement = state.billing.entitlement(&user_id, required).await?;
    Ok(Json(entitlement))
}
