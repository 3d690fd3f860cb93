// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription rows as stored in the backend `subscriptions` table.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// How often a subscription bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    #[serde(alias = "yearly")]
    Annual,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Annual => "annual",
        }
    }
}

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    #[serde(alias = "canceled")]
    Cancelled,
}

/// A subscription row. Owned by the backend, scoped by `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub cost: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub next_billing: NaiveDate,
    #[serde(default)]
    pub category: Option<String>,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

pub(crate) fn default_currency() -> String {
    "USD".to_string()
}

/// Payload for creating a subscription.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NewSubscription {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub cost: f64,
    #[validate(length(equal = 3))]
    #[serde(default = "default_currency")]
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub next_billing: NaiveDate,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub category: Option<String>,
    #[validate(length(max = 20))]
    #[serde(default)]
    pub color: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubscriptionUpdate {
    #[validate(length(min = 1, max = 100))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[validate(length(equal = 3))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<BillingCycle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_billing: Option<NaiveDate>,
    #[validate(length(max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[validate(length(max = 20))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SubscriptionUpdate {
    /// Update that only changes the status.
    pub fn status(status: SubscriptionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_with_missing_optional_fields_deserializes() {
        let row = serde_json::json!({
            "id": "sub-1",
            "user_id": "user-1",
            "name": "Netflix",
            "cost": 15.99,
            "billing_cycle": "yearly",
            "next_billing": "2026-03-01",
            "status": "canceled",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        });

        let sub: Subscription = serde_json::from_value(row).unwrap();
        assert_eq!(sub.billing_cycle, BillingCycle::Annual);
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert_eq!(sub.currency, "USD");
        assert!(sub.description.is_none());
    }

    #[test]
    fn test_status_update_serializes_only_status() {
        let update = SubscriptionUpdate::status(SubscriptionStatus::Paused);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "paused" }));
    }

    #[test]
    fn test_new_subscription_validation() {
        let mut new_sub = NewSubscription {
            name: "Spotify".to_string(),
            description: None,
            cost: 9.99,
            currency: "USD".to_string(),
            billing_cycle: BillingCycle::Monthly,
            next_billing: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            category: None,
            color: None,
        };
        assert!(new_sub.validate().is_ok());

        new_sub.cost = -1.0;
        assert!(new_sub.validate().is_err());
    }
}
