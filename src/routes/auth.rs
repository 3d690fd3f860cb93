// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes: sign-in, sign-up, sign-out and session status.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::db::tables;
use crate::error::{AppError, Result};
use crate::middleware::auth::{
    create_session_token, current_session, decode_session_token, hard_reset, session_cookie,
    session_token,
};
use crate::models::AuthUser;
use crate::services::session::{ActiveSession, SignUpResult};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/session", get(session_status))
        .route("/auth/resend-confirmation", post(resend_confirmation))
}

#[derive(Deserialize, Validate)]
pub struct Credentials {
    #[validate(email)]
    email: String,
    #[validate(length(min = 6, max = 128))]
    password: String,
}

/// Session status returned to the frontend.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Set after sign-up when the account must confirm its email first.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub confirmation_sent: bool,
}

impl SessionResponse {
    fn signed_in(user: &AuthUser) -> Self {
        Self {
            authenticated: true,
            user_id: Some(user.id.clone()),
            email: user.email.clone(),
            confirmation_sent: false,
        }
    }

    fn signed_out() -> Self {
        Self {
            authenticated: false,
            user_id: None,
            email: None,
            confirmation_sent: false,
        }
    }
}

/// Attach a signed session cookie for `session`.
fn with_session_cookie(
    state: &AppState,
    jar: CookieJar,
    session: &ActiveSession,
) -> Result<CookieJar> {
    let token = create_session_token(
        &session.user.id,
        &session.session_id,
        &state.config.session_signing_key,
    )?;
    Ok(jar.add(session_cookie(token, &state.config.frontend_url)))
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    credentials.validate()?;

    let session = state
        .sessions
        .sign_in(&credentials.email, &credentials.password)
        .await?;
    let jar = with_session_cookie(&state, jar, &session)?;

    Ok((jar, Json(SessionResponse::signed_in(&session.user))))
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    credentials.validate()?;

    let redirect_to = format!("{}/sign-in", state.config.frontend_url.trim_end_matches('/'));
    match state
        .sessions
        .sign_up(&credentials.email, &credentials.password, Some(&redirect_to))
        .await?
    {
        SignUpResult::ConfirmationSent => {
            tracing::info!("Sign-up pending email confirmation");
            Ok((
                jar,
                Json(SessionResponse {
                    confirmation_sent: true,
                    ..SessionResponse::signed_out()
                }),
            ))
        }
        SignUpResult::SignedIn(session) => {
            let jar = with_session_cookie(&state, jar, &session)?;
            Ok((jar, Json(SessionResponse::signed_in(&session.user))))
        }
    }
}

/// Sign out is always a hard reset, whether or not a session was found.
async fn sign_out(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    let claims = session_token(&jar, &headers)
        .and_then(|token| decode_session_token(&token, &state.config.session_signing_key));

    if let Some(claims) = claims {
        state.sessions.sign_out(&claims.sid).await;
        tracing::info!(user_id = %claims.sub, "User signed out");
    }

    hard_reset(jar, &state.config.frontend_url)
}

async fn session_status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    match current_session(&state, &jar, &headers).await {
        (Some(session), _) => Json(SessionResponse::signed_in(&session.user)).into_response(),
        (None, Some(_)) => hard_reset(jar, &state.config.frontend_url),
        (None, None) => Json(SessionResponse::signed_out()).into_response(),
    }
}

// ─── Confirmation Email ──────────────────────────────────────

#[derive(Deserialize)]
pub struct ResendConfirmationRequest {
    #[serde(default)]
    email: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
struct ResendConfirmationArgs<'a> {
    user_id: &'a str,
    email: &'a str,
}

/// Resend the signup confirmation email for an existing account.
async fn resend_confirmation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResendConfirmationRequest>,
) -> Result<Json<MessageResponse>> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }

    let service_key = state
        .config
        .backend_service_role_key
        .as_deref()
        .ok_or_else(|| AppError::NotConfigured("Backend service role key is not set".to_string()))?;

    let user = state
        .db
        .find_user_by_email(service_key, email)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "User lookup failed");
            AppError::Internal(anyhow::anyhow!("Failed to look up user"))
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let args = ResendConfirmationArgs {
        user_id: &user.id,
        email: user.email.as_deref().unwrap_or(email),
    };
    state
        .db
        .call_procedure(service_key, tables::RESEND_CONFIRMATION_RPC, &args)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "Confirmation resend failed");
            AppError::Internal(anyhow::anyhow!("Failed to resend confirmation email"))
        })?;

    tracing::info!(user_id = %user.id, "Confirmation email resent");
    Ok(Json(MessageResponse {
        message: "Confirmation email sent".to_string(),
    }))
}
