// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::metrics::WEBHOOK_EVENTS;
use crate::models::{CheckoutCompletion, Entitlement, Tier};
use crate::payments::events::{
    CheckoutSessionObject, SubscriptionObject, WebhookEvent, CHECKOUT_SESSION_COMPLETED, SUBSCRIPTION_DELETED,
};
use crate::payments::{
    verify_signature, CheckoutLineItem, CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentProcessor,
    SignatureError,
};
use crate::store::{StoreError, UserStore};

/// Share of a creator subscription retained by the platform
pub const PLATFORM_FEE_PERCENT: i64 = 20;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("{0}")]
    Validation(String),

    #[error("Webhook signature verification failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Billing is not configured: {0}")]
    NotConfigured(&'static str),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Billing settings resolved from configuration
#[derive(Debug, Clone, Default)]
pub struct BillingConfig {
    pub premium_price_id: Option<String>,
    /// Static price id to tier mapping
    pub price_tiers: HashMap<String, Tier>,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub webhook_secret: String,
    pub webhook_tolerance_secs: i64,
}

/// What a webhook delivery changed
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    CheckoutRecorded { user_id: String, tier: Option<Tier> },
    SubscriptionCleared { user_id: Option<String> },
    Ignored { event_type: String },
}

/// Largest unit amount the processor accepts for a single price
pub const MAX_PRICE_CENTS: i64 = 99_999_999;

/// Platform fee for a monthly price, rounded half up to the nearest cent.
/// `None` when the computation overflows.
pub fn platform_fee_cents(price_cents: i64) -> Option<i64> {
    price_cents
        .checked_mul(PLATFORM_FEE_PERCENT)?
        .checked_add(50)
        .map(|scaled| scaled / 100)
}

/// Checkout creation and processor callbacks
pub struct BillingService {
    processor: Arc<dyn PaymentProcessor>,
    users: Arc<dyn UserStore>,
    config: BillingConfig,
}

impl BillingService {
    pub fn new(processor: Arc<dyn PaymentProcessor>, users: Arc<dyn UserStore>, config: BillingConfig) -> Self {
        Self {
            processor,
            users,
            config,
        }
    }

    pub async fn create_premium_checkout(&self, user_id: &str, email: &str) -> Result<CheckoutSession, BillingError> {
        validate_customer(user_id, email)?;
        let price_id = self
            .config
            .premium_price_id
            .clone()
            .ok_or(BillingError::NotConfigured("premium price"))?;

        let mut metadata = BTreeMap::new();
        metadata.insert("userId".to_string(), user_id.to_string());
        metadata.insert("priceId".to_string(), price_id.clone());
        metadata.insert("type".to_string(), "premium".to_string());

        let session = self
            .processor
            .create_checkout_session(&self.session_request(user_id, email, CheckoutLineItem::Price { price_id }, metadata))
            .await?;

        info!("Created premium checkout {} for user {}", session.session_id, user_id);
        Ok(session)
    }

    pub async fn create_subscription_checkout(
        &self,
        user_id: &str,
        email: &str,
        creator_id: &str,
        creator_name: &str,
        price_cents: i64,
    ) -> Result<CheckoutSession, BillingError> {
        validate_customer(user_id, email)?;
        if creator_id.trim().is_empty() {
            return Err(BillingError::Validation("creatorId is required".to_string()));
        }
        if price_cents <= 0 {
            return Err(BillingError::Validation("priceCents must be positive".to_string()));
        }
        if price_cents > MAX_PRICE_CENTS {
            return Err(BillingError::Validation(format!(
                "priceCents must not exceed {}",
                MAX_PRICE_CENTS
            )));
        }

        // Recorded for reconciliation only; collection happens at the processor
        let fee = platform_fee_cents(price_cents)
            .ok_or_else(|| BillingError::Validation("priceCents is out of range".to_string()))?;

        let mut metadata = BTreeMap::new();
        metadata.insert("userId".to_string(), user_id.to_string());
        metadata.insert("creatorId".to_string(), creator_id.to_string());
        metadata.insert("creatorName".to_string(), creator_name.to_string());
        metadata.insert("priceCents".to_string(), price_cents.to_string());
        metadata.insert("platformFeeCents".to_string(), fee.to_string());
        metadata.insert("type".to_string(), "creator_subscription".to_string());

        let line_item = CheckoutLineItem::MonthlyRecurring {
            product_name: format!("Subscription to {}", display_name(creator_name, creator_id)),
            unit_amount_cents: price_cents,
            currency: self.config.currency.clone(),
        };

        let session = self
            .processor
            .create_checkout_session(&self.session_request(user_id, email, line_item, metadata))
            .await?;

        info!(
            "Created subscription checkout {} for user {} to creator {} (fee {} cents)",
            session.session_id, user_id, creator_id, fee
        );
        Ok(session)
    }

    /// Verify and apply a processor callback. Nothing is read or written
    /// unless the signature checks out.
    pub async fn handle_webhook(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookOutcome, BillingError> {
        if let Err(e) = verify_signature(
            payload,
            signature,
            &self.config.webhook_secret,
            self.config.webhook_tolerance_secs,
            Utc::now().timestamp(),
        ) {
            warn!("Rejected webhook: {}", e);
            WEBHOOK_EVENTS.with_label_values(&["unverified", "rejected"]).inc();
            return Err(e.into());
        }

        let event: WebhookEvent =
            serde_json::from_slice(payload).map_err(|e| BillingError::InvalidPayload(e.to_string()))?;
        debug!("Webhook event {} of type {}", event.id, event.event_type);

        let outcome = match event.event_type.as_str() {
            CHECKOUT_SESSION_COMPLETED => self.on_checkout_completed(event.data.object).await?,
            SUBSCRIPTION_DELETED => self.on_subscription_deleted(event.data.object).await?,
            // Every event type must be acknowledged or the processor retries it
            _ => WebhookOutcome::Ignored {
                event_type: event.event_type.clone(),
            },
        };

        let label = match &outcome {
            WebhookOutcome::Ignored { .. } => "ignored",
            _ => "applied",
        };
        WEBHOOK_EVENTS.with_label_values(&[event.event_type.as_str(), label]).inc();
        Ok(outcome)
    }

    pub async fn entitlement(&self, user_id: &str, required: Tier) -> Result<Entitlement, StoreError> {
        let tier = self.users.find_user(user_id).await?.and_then(|u| u.tier);
        Ok(Entitlement::new(user_id, tier, required))
    }

    async fn on_checkout_completed(&self, object: serde_json::Value) -> Result<WebhookOutcome, BillingError> {
        let session: CheckoutSessionObject =
            serde_json::from_value(object).map_err(|e| BillingError::InvalidPayload(e.to_string()))?;

        let Some(user_id) = session.user_id().map(str::to_string) else {
            warn!("Checkout session {} carries no user id, ignoring", session.id);
            return Ok(WebhookOutcome::Ignored {
                event_type: CHECKOUT_SESSION_COMPLETED.to_string(),
            });
        };

        let tier = session
            .metadata
            .get("priceId")
            .and_then(|price_id| self.config.price_tiers.get(price_id))
            .copied();
        if tier.is_none() {
            debug!("Checkout session {} has no tiered price", session.id);
        }

        let completion = CheckoutCompletion {
            user_id: user_id.clone(),
            email: session.customer_email.clone(),
            tier,
            customer_id: session.customer.clone(),
            subscription_id: session.subscription.clone(),
        };
        self.users.record_checkout(&completion).await?;

        info!("Recorded checkout {} for user {} (tier: {:?})", session.id, user_id, tier);
        Ok(WebhookOutcome::CheckoutRecorded { user_id, tier })
    }

    async fn on_subscription_deleted(&self, object: serde_json::Value) -> Result<WebhookOutcome, BillingError> {
        let subscription: SubscriptionObject =
            serde_json::from_value(object).map_err(|e| BillingError::InvalidPayload(e.to_string()))?;

        let user = self.users.clear_subscription(&subscription.id).await?;
        match &user {
            Some(user) => info!("Cleared subscription {} from user {}", subscription.id, user.id),
            None => warn!(
                "No user holds subscription {} (customer {:?})",
                subscription.id, subscription.customer
            ),
        }

        Ok(WebhookOutcome::SubscriptionCleared {
            user_id: user.map(|u| u.id),
        })
    }

    fn session_request(
        &self,
        user_id: &str,
        email: &str,
        line_item: CheckoutLineItem,
        metadata: BTreeMap<String, String>,
    ) -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            client_reference_id: user_id.to_string(),
            customer_email: email.to_string(),
            line_item,
            metadata,
            success_url: self.config.success_url.clone(),
            cancel_url: self.config.cancel_url.clone(),
        }
    }
}

fn validate_customer(user_id: &str, email: &str) -> Result<(), BillingError> {
    if user_id.trim().is_empty() {
        return Err(BillingError::Validation("userId is required".to_string()));
    }
    if !email.contains('@') {
        return Err(BillingError::Validation("a valid email is required".to_string()));
    }
    Ok(())
}

fn display_name<'a>(creator_name: &'a str, creator_id: &'a str) -> &'a str {
    if creator_name.trim().is_empty() {
        creator_id
    } else {
        creator_name
    }
}
