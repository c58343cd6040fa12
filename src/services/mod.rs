// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod billing;
pub mod comments;
pub mod friends;
pub mod livestreams;
pub mod notifications;

use std::fmt::Display;

use tracing::warn;

use crate::metrics::DEGRADED_OPERATIONS;

pub use billing::{BillingConfig, BillingError, BillingService, WebhookOutcome};
pub use comments::CommentService;
pub use friends::FriendService;
pub use livestreams::LivestreamService;
pub use notifications::NotificationService;

/// Outcome of an operation that must never block the caller. A failure
/// becomes `Degraded` instead of an error, so a fallback value is never
/// mistaken for a real one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort<T> {
    Fresh(T),
    Degraded,
}

impl<T> BestEffort<T> {
    /// Swallow the error, log it and count it against `operation`
    pub(crate) fn from_result<E: Display>(result: Result<T, E>, operation: &'static str) -> Self {
        match result {
            Ok(value) => BestEffort::Fresh(value),
            Err(e) => {
                warn!(operation, error = %e, "Best-effort operation degraded");
                DEGRADED_OPERATIONS.with_label_values(&[operation]).inc();
                BestEffort::Degraded
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, BestEffort::Degraded)
    }

    pub fn fresh(self) -> Option<T> {
        match self {
            BestEffort::Fresh(value) => Some(value),
            BestEffort::Degraded => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BestEffort<U> {
        match self {
            BestEffort::Fresh(value) => BestEffort::Fresh(f(value)),
            BestEffort::Degraded => BestEffort::Degraded,
        }
    }
}

impl<T: Default> BestEffort<T> {
    /// The fresh value, or the type's empty default when degraded
    pub fn unwrap_or_default(self) -> T {
        self.fresh().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_is_distinct_from_a_real_default() {
        let real: BestEffort<i64> = BestEffort::from_result(Ok::<_, String>(0), "test_real");
        let degraded: BestEffort<i64> = BestEffort::from_result(Err("boom"), "test_degraded");

        assert_eq!(real, BestEffort::Fresh(0));
        assert!(degraded.is_degraded());
        assert_ne!(real, degraded);
        assert_eq!(degraded.unwrap_or_default(), 0);
    }
}
