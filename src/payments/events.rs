// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use serde::Deserialize;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";

/// Envelope of every webhook delivery
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

/// The fields of a completed checkout session we act on
#[derive(Debug, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    pub client_reference_id: Option<String>,
    pub customer: Option<String>,
    pub customer_email: Option<String>,
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionObject {
    pub fn user_id(&self) -> Option<&str> {
        self.metadata
            .get("userId")
            .map(String::as_str)
            .or(self.client_reference_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub customer: Option<String>,
}
