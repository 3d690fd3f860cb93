// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checkout redirect route.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::post,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{current_session, hard_reset};
use crate::services::checkout::{CheckoutOutcome, CheckoutRequest, SUBSCRIPTION_MODE};
use crate::AppState;

/// Frontend path showing the sign-in prompt.
pub const SIGN_IN_PATH: &str = "/sign-in";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/checkout", post(start_checkout))
}

/// Optional body; an empty body buys the default plan.
#[derive(Debug, Default, Deserialize)]
struct StartCheckoutBody {
    #[serde(default)]
    price_id: Option<String>,
}

/// Send the browser to the payment provider, or to sign-in without a session.
async fn start_checkout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let (session, reset) = current_session(&state, &jar, &headers).await;
    if reset.is_some() {
        return Ok(hard_reset(jar, &state.config.frontend_url));
    }

    let frontend = state.config.frontend_url.trim_end_matches('/');
    if session.is_none() {
        tracing::info!("Checkout requested without a session, prompting sign-in");
        return Ok(sign_in_redirect(frontend));
    }

    let body: StartCheckoutBody = if body.is_empty() {
        StartCheckoutBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid checkout request: {}", e)))?
    };

    let price_id = body
        .price_id
        .or_else(|| state.config.checkout_price_id.clone())
        .ok_or_else(|| AppError::NotConfigured("No checkout price configured".to_string()))?;

    let request = CheckoutRequest {
        price_id,
        mode: SUBSCRIPTION_MODE.to_string(),
        success_url: format!("{}/dashboard?checkout=success", frontend),
        cancel_url: format!("{}/pricing?checkout=cancelled", frontend),
    };

    match state.checkout.begin(session.as_ref(), &request).await? {
        CheckoutOutcome::Redirect { session_id, url } => {
            tracing::info!(checkout_session = %session_id, "Redirecting to checkout");
            Ok(Redirect::to(&url).into_response())
        }
        CheckoutOutcome::SignInRequired => Ok(sign_in_redirect(frontend)),
    }
}

fn sign_in_redirect(frontend: &str) -> Response {
    Redirect::to(&format!("{}{}", frontend, SIGN_IN_PATH)).into_response()
}
