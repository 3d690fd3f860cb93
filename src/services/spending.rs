// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trailing seven-month spending series.
//!
//! Only the current month is an exact figure. Earlier months are estimated
//! from subscriptions that already existed at the start of that month and
//! are still active, scaled by a fresh random factor in `[0.85, 1.15]` on
//! every call. There is no billing history to aggregate, so the historical
//! points are a display aid and must not be read as a metric.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::db::BackendDb;
use crate::models::{BillingCycle, SpendingDataPoint, SpendingReport, Subscription};
use crate::services::session::ActiveSession;
use crate::time_utils::{month_label, month_start};

/// Number of points in the series, including the current month.
pub const SERIES_MONTHS: u32 = 7;

/// Lower and upper bound of the historical display jitter.
pub const JITTER_MIN: f64 = 0.85;
pub const JITTER_MAX: f64 = 1.15;

/// Shown when the row store cannot be read on a configured deployment.
const LOAD_ERROR_MESSAGE: &str = "Couldn't load your spending data. Showing empty chart.";

/// Cost normalized to one month.
pub fn monthly_equivalent(subscription: &Subscription) -> f64 {
    match subscription.billing_cycle {
        BillingCycle::Monthly => subscription.cost,
        BillingCycle::Annual => subscription.cost / 12.0,
    }
}

/// Exact monthly spend across active subscriptions.
pub fn total_monthly_spend(subscriptions: &[Subscription]) -> f64 {
    subscriptions
        .iter()
        .filter(|s| s.is_active())
        .map(monthly_equivalent)
        .sum()
}

/// Exact spend for a past month: active subscriptions created on or before
/// the first instant of that month.
pub fn month_baseline(subscriptions: &[Subscription], month_begins: DateTime<Utc>) -> f64 {
    subscriptions
        .iter()
        .filter(|s| s.is_active() && s.created_at <= month_begins)
        .map(monthly_equivalent)
        .sum()
}

/// Build the series using the thread-local RNG.
pub fn spending_series(subscriptions: &[Subscription], now: DateTime<Utc>) -> Vec<SpendingDataPoint> {
    spending_series_with_rng(subscriptions, now, &mut rand::thread_rng())
}

/// Build the series, oldest month first, drawing jitter from `rng`.
pub fn spending_series_with_rng<R: Rng>(
    subscriptions: &[Subscription],
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<SpendingDataPoint> {
    (0..SERIES_MONTHS)
        .rev()
        .map(|months_back| {
            let begins = month_start(now, months_back);
            let amount = if months_back == 0 {
                total_monthly_spend(subscriptions)
            } else {
                month_baseline(subscriptions, begins) * rng.gen_range(JITTER_MIN..=JITTER_MAX)
            };
            SpendingDataPoint {
                month: month_label(begins),
                amount,
            }
        })
        .collect()
}

/// Seven zero-amount points with the right month labels.
pub fn zero_series(now: DateTime<Utc>) -> Vec<SpendingDataPoint> {
    (0..SERIES_MONTHS)
        .rev()
        .map(|months_back| SpendingDataPoint {
            month: month_label(month_start(now, months_back)),
            amount: 0.0,
        })
        .collect()
}

/// Load the user's subscriptions and build the chart payload.
///
/// Backend failures never fail the request: the chart falls back to zeros.
/// The error message is only surfaced when the backend is configured, so a
/// half-set-up environment does not alarm users.
pub async fn spending_report(
    db: &BackendDb,
    backend_configured: bool,
    session: &ActiveSession,
    now: DateTime<Utc>,
) -> SpendingReport {
    match db
        .list_subscriptions(&session.access_token, &session.user.id)
        .await
    {
        Ok(subscriptions) => SpendingReport {
            points: spending_series(&subscriptions, now),
            total_monthly: total_monthly_spend(&subscriptions),
            error: None,
        },
        Err(e) => {
            let surface = backend_configured && db.is_connected();
            tracing::warn!(
                user_id = %session.user.id,
                error = %e,
                surfaced = surface,
                "Failed to load subscriptions for spending chart"
            );
            SpendingReport {
                points: zero_series(now),
                total_monthly: 0.0,
                error: surface.then(|| LOAD_ERROR_MESSAGE.to_string()),
            }
        }
    }
}
