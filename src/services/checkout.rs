// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checkout-session client.
//!
//! Asks the remote checkout endpoint for a payment session and hands back
//! the URL the browser should be sent to. Payment itself happens entirely on
//! the provider's side.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::session::ActiveSession;

/// Checkout mode for recurring plans.
pub const SUBSCRIPTION_MODE: &str = "subscription";

const RECURRING_PRICE_HINT: &str =
    "This plan's price is not set up for recurring billing. Please contact support so we can fix it.";
const SUBSCRIPTION_MODE_HINT: &str =
    "This plan cannot be purchased as a subscription right now. Please contact support so we can fix it.";

/// Parameters for a checkout session.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub price_id: String,
    pub mode: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// What the caller should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Navigate the browser to the provider's checkout page.
    Redirect { session_id: String, url: String },
    /// No session: show the sign-in prompt. No request was sent.
    SignInRequired,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutSessionResponse {
    session_id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct CheckoutErrorResponse {
    error: String,
}

/// Client for the checkout-session endpoint.
#[derive(Clone)]
pub struct CheckoutService {
    http: reqwest::Client,
    endpoint: String,
    anon_key: String,
}

impl CheckoutService {
    pub fn new(endpoint: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    /// Create a checkout session for the signed-in user. A single attempt;
    /// the user retries by clicking again.
    pub async fn begin(
        &self,
        session: Option<&ActiveSession>,
        request: &CheckoutRequest,
    ) -> Result<CheckoutOutcome, AppError> {
        let Some(session) = session else {
            tracing::info!("Checkout requested without a session, prompting sign-in");
            return Ok(CheckoutOutcome::SignInRequired);
        };

        tracing::info!(
            user_id = %session.user.id,
            price_id = %request.price_id,
            mode = %request.mode,
            "Creating checkout session"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Checkout(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<CheckoutErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));
            tracing::warn!(status = %status, error = %message, "Checkout endpoint failed");
            return Err(AppError::Checkout(friendly_checkout_error(&message)));
        }

        let created: CheckoutSessionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Checkout(format!("Invalid checkout response: {}", e)))?;

        Ok(CheckoutOutcome::Redirect {
            session_id: created.session_id,
            url: created.url,
        })
    }
}

/// Replace known provider configuration errors with something a user can act
/// on; pass everything else through unchanged.
pub fn friendly_checkout_error(message: &str) -> String {
    let lower = message.to_lowercase();
    if lower.contains("recurring price") {
        RECURRING_PRICE_HINT.to_string()
    } else if lower.contains("subscription mode") {
        SUBSCRIPTION_MODE_HINT.to_string()
    } else {
        message.to_string()
    }
}
