// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Hosted payment processor integration

pub mod events;
pub mod signature;
pub mod stripe;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use signature::{verify_signature, SignatureError, SIGNATURE_HEADER};
pub use stripe::StripeClient;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment processor request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Payment processor rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Payment processor returned a session without a checkout URL")]
    MissingUrl,
}

/// What is being sold in a checkout session
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutLineItem {
    /// A price already configured at the processor
    Price { price_id: String },
    /// A monthly recurring price defined inline
    MonthlyRecurring {
        product_name: String,
        unit_amount_cents: i64,
        currency: String,
    },
}

/// A monthly subscription checkout to open at the processor
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
    pub client_reference_id: String,
    pub customer_email: String,
    pub line_item: CheckoutLineItem,
    pub metadata: BTreeMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

/// A hosted checkout the client is redirected to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession, PaymentError>;
}
