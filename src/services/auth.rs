// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Managed auth client.
//!
//! Handles:
//! - Password sign-in and sign-up
//! - Access token refresh
//! - Sign-out (token revocation)
//!
//! The protocol itself belongs to the auth service; this module only maps its
//! JSON responses onto [`AuthTokens`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::AuthUser;

/// Tokens and identity returned by a successful sign-in or refresh.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

/// Result of a sign-up request.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// Email confirmation is required before the account can sign in.
    ConfirmationSent,
    /// The account was auto-confirmed and is already signed in.
    SignedIn(AuthTokens),
}

/// Operations the session store needs from managed auth.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<AuthTokens, AppError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome, AppError>;

    /// Exchange a refresh token for new tokens. Callers reset the session on
    /// any error, so a transient outage here also signs the user out.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AppError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
}

/// Token response from the auth service.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl From<TokenResponse> for AuthTokens {
    fn from(t: TokenResponse) -> Self {
        let expires_at = t
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(|| Utc::now() + Duration::seconds(t.expires_in));
        AuthTokens {
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            expires_at,
            user: t.user,
        }
    }
}

/// HTTP client for the backend's `/auth/v1` API.
#[derive(Clone)]
pub struct HttpAuthProvider {
    http: reqwest::Client,
    auth_url: String,
    anon_key: String,
}

impl HttpAuthProvider {
    pub fn new(backend_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth_url: format!("{}/auth/v1", backend_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
        }
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, AppError> {
        self.http
            .post(format!("{}/token", self.auth_url))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Backend(format!("Auth request failed: {}", e)))
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthTokens, AppError> {
        let response = self
            .token_grant(
                "password",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await?;

        if response.status().is_client_error() {
            let body = response.text().await.unwrap_or_default();
            tracing::info!(body = %body, "Sign-in rejected by auth service");
            return Err(AppError::Unauthorized);
        }

        parse_tokens(response).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome, AppError> {
        let mut request = self
            .http
            .post(format!("{}/signup", self.auth_url))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }));
        if let Some(redirect) = redirect_to {
            request = request.query(&[("redirect_to", redirect)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Backend(format!("Sign-up request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_client_error() {
                AppError::BadRequest(error_message(&body))
            } else {
                AppError::Backend(format!("HTTP {}: {}", status, body))
            });
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))?;

        // With confirmations enabled the service returns the bare user record.
        if value.get("access_token").is_none() {
            return Ok(SignUpOutcome::ConfirmationSent);
        }

        let tokens: TokenResponse = serde_json::from_value(value)
            .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))?;
        Ok(SignUpOutcome::SignedIn(tokens.into()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AppError> {
        let response = self
            .token_grant(
                "refresh_token",
                serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await?;

        if response.status().is_client_error() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(body = %body, "Refresh token rejected");
            return Err(AppError::InvalidToken);
        }

        parse_tokens(response).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Backend(format!("Sign-out request failed: {}", e)))?;

        // An already-invalid token is as signed out as it gets.
        if response.status().is_success() || response.status().as_u16() == 401 {
            return Ok(());
        }
        Err(AppError::Backend(format!(
            "Sign-out failed with status {}",
            response.status()
        )))
    }
}

async fn parse_tokens(response: reqwest::Response) -> Result<AuthTokens, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Backend(format!("HTTP {}: {}", status, body)));
    }

    response
        .json::<TokenResponse>()
        .await
        .map(AuthTokens::from)
        .map_err(|e| AppError::Backend(format!("Failed to parse token response: {}", e)))
}

/// Pull a human-readable message out of an auth error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}
