// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Derived spending series. Recomputed on demand, never stored.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One month of the trailing spend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SpendingDataPoint {
    /// Month abbreviation ("Jan")
    pub month: String,
    pub amount: f64,
}

/// Spending chart payload.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SpendingReport {
    /// Seven points, oldest first, ending at the current month
    pub points: Vec<SpendingDataPoint>,
    /// Exact monthly-equivalent spend of active subscriptions
    pub total_monthly: f64,
    /// User-facing message when the row store could not be read
    pub error: Option<String>,
}
