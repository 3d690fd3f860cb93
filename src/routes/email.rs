// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transactional email endpoint.

use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::routes::auth::MessageResponse;
use crate::services::session::ActiveSession;
use crate::AppState;

/// Email routes (require an authenticated session).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/email/send", post(send_email))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    #[serde(default)]
    to: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    html_content: String,
}

async fn send_email(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ActiveSession>,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<MessageResponse>> {
    if request.to.is_empty() || request.subject.is_empty() || request.html_content.is_empty() {
        return Err(AppError::BadRequest(
            "Missing required fields: to, subject, htmlContent".to_string(),
        ));
    }

    state
        .email
        .send(&request.to, &request.subject, &request.html_content)
        .await?;

    tracing::info!(user_id = %session.user.id, "Email sent on behalf of user");
    Ok(Json(MessageResponse {
        message: "Email sent successfully".to_string(),
    }))
}
