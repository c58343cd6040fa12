// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use super::{CheckoutLineItem, CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentProcessor};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Stripe REST client for checkout sessions
pub struct StripeClient {
    http: Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl StripeClient {
    pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Result<Self, PaymentError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form_params(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(body);
            error!("Stripe checkout session failed with {}: {}", status, message);
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: SessionResponse = response.json().await?;
        debug!("Created Stripe checkout session {}", session.id);

        Ok(CheckoutSession {
            url: session.url.ok_or(PaymentError::MissingUrl)?,
            session_id: session.id,
        })
    }
}

/// Stripe's bracketed form encoding of a checkout session
fn form_params(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("mode".to_string(), "subscription".to_string()),
        ("client_reference_id".to_string(), request.client_reference_id.clone()),
        ("customer_email".to_string(), request.customer_email.clone()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
    ];

    match &request.line_item {
        CheckoutLineItem::Price { price_id } => {
            params.push(("line_items[0][price]".to_string(), price_id.clone()));
        }
        CheckoutLineItem::MonthlyRecurring {
            product_name,
            unit_amount_cents,
            currency,
        } => {
            let prefix = "line_items[0][price_data]";
            params.push((format!("{prefix}[currency]"), currency.clone()));
            params.push((format!("{prefix}[unit_amount]"), unit_amount_cents.to_string()));
            params.push((format!("{prefix}[recurring][interval]"), "month".to_string()));
            params.push((format!("{prefix}[product_data][name]"), product_name.clone()));
        }
    }

    for (key, value) in &request.metadata {
        params.push((format!("metadata[{key}]"), value.clone()));
        // Copied onto the subscription so later subscription events carry it
        params.push((format!("subscription_data[metadata][{key}]"), value.clone()));
    }

    params
}
