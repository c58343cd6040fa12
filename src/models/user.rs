// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};

use super::ParseEnumError;
use crate::schema::users;

/// Entitlement level. Variant order is the access order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Pro,
    Premium,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Basic => "basic",
            Tier::Pro => "pro",
            Tier::Premium => "premium",
        }
    }

    /// Whether this tier grants content gated at `required`
    pub fn satisfies(&self, required: Tier) -> bool {
        *self >= required
    }
}

impl FromStr for Tier {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Tier::Basic),
            "pro" => Ok(Tier::Pro),
            "premium" => Ok(Tier::Premium),
            other => Err(ParseEnumError::new("tier", other)),
        }
    }
}

impl ToSql<Text, Pg> for Tier {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for Tier {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(raw.parse()?)
    }
}

/// Billing view of a user record
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub tier: Option<Tier>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Fold a completed checkout into the existing record, if any. Fields the
    /// checkout did not resolve keep their stored value. The subscription id
    /// is tied to the tier: a checkout without a tier (a creator subscription)
    /// leaves both untouched, so cancelling it cannot revoke the tier.
    pub fn with_checkout(existing: Option<User>, completion: &CheckoutCompletion, now: DateTime<Utc>) -> User {
        let existing = existing.unwrap_or_else(|| User {
            id: completion.user_id.clone(),
            email: None,
            tier: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            updated_at: now,
        });
        User {
            id: existing.id,
            email: completion.email.clone().or(existing.email),
            tier: completion.tier.or(existing.tier),
            stripe_customer_id: completion.customer_id.clone().or(existing.stripe_customer_id),
            stripe_subscription_id: match completion.tier {
                Some(_) => completion.subscription_id.clone().or(existing.stripe_subscription_id),
                None => existing.stripe_subscription_id,
            },
            updated_at: now,
        }
    }

    /// Drop the entitlement attached to a cancelled subscription
    pub fn without_subscription(mut self, now: DateTime<Utc>) -> User {
        self.tier = None;
        self.stripe_subscription_id = None;
        self.updated_at = now;
        self
    }
}

/// Billing fields written after a completed checkout
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutCompletion {
    pub user_id: String,
    pub email: Option<String>,
    pub tier: Option<Tier>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
}

/// Tier currently held by a user and whether it meets a requirement
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub user_id: String,
    pub tier: Option<Tier>,
    pub required: Tier,
    pub has_access: bool,
}

impl Entitlement {
    pub fn new(user_id: &str, tier: Option<Tier>, required: Tier) -> Self {
        Self {
            user_id: user_id.to_string(),
            tier,
            required,
            has_access: tier.map(|t| t.satisfies(required)).unwrap_or(false),
        }
    }
}
