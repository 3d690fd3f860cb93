// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The backend URL, its public API key and the session signing key are
//! required; startup aborts without them. Everything else has a default or
//! disables the feature that needs it.

use std::env;

/// Default transactional email API (Brevo-compatible `htmlContent` payloads).
pub const DEFAULT_EMAIL_API_URL: &str = "https://api.brevo.com/v3/smtp/email";

/// Path of the checkout edge function relative to the backend URL.
const CHECKOUT_FUNCTION_PATH: &str = "/functions/v1/create-checkout-session";

/// Substrings that mark a backend URL copied from a template and never filled in.
const PLACEHOLDER_MARKERS: [&str; 3] = ["your-project", "your_project", "example.supabase"];

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Managed backend ---
    /// Base URL of the managed backend (auth, rows, functions)
    pub backend_url: String,
    /// Public (anon) API key sent as `apikey` on every backend call
    pub backend_anon_key: String,
    /// Service-role key, only needed for the confirmation-resend endpoint
    pub backend_service_role_key: Option<String>,

    // --- Server ---
    /// Frontend URL for CORS and redirects
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Directory holding locally persisted records (profiles, sessions)
    pub data_dir: String,
    /// HS256 key for the session cookie (raw bytes)
    pub session_signing_key: Vec<u8>,

    // --- Checkout ---
    /// Remote checkout-session endpoint
    pub checkout_url: String,
    /// Price used when a checkout request does not name one
    pub checkout_price_id: Option<String>,

    // --- Email ---
    pub email_api_url: String,
    pub email_api_key: Option<String>,
    pub email_sender_address: Option<String>,
    pub email_sender_name: String,
    /// Inbox receiving support submissions
    pub support_email: Option<String>,
    /// How many days ahead renewal reminders look
    pub reminder_days: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let backend_url = env::var("BACKEND_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .map_err(|_| ConfigError::Missing("BACKEND_URL"))?;
        if backend_url.is_empty() {
            return Err(ConfigError::Missing("BACKEND_URL"));
        }

        let backend_anon_key = env::var("BACKEND_ANON_KEY")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("BACKEND_ANON_KEY"))?;
        if backend_anon_key.is_empty() {
            return Err(ConfigError::Missing("BACKEND_ANON_KEY"));
        }

        let checkout_url = optional_var("CHECKOUT_URL")
            .unwrap_or_else(|| format!("{}{}", backend_url, CHECKOUT_FUNCTION_PATH));

        Ok(Self {
            backend_service_role_key: optional_var("BACKEND_SERVICE_ROLE_KEY"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            session_signing_key: env::var("SESSION_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
                .into_bytes(),
            checkout_url,
            checkout_price_id: optional_var("CHECKOUT_PRICE_ID"),
            email_api_url: optional_var("EMAIL_API_URL")
                .unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_string()),
            email_api_key: optional_var("EMAIL_API_KEY"),
            email_sender_address: optional_var("EMAIL_SENDER_ADDRESS"),
            email_sender_name: env::var("EMAIL_SENDER_NAME")
                .unwrap_or_else(|_| "SubTrack".to_string()),
            support_email: optional_var("SUPPORT_EMAIL"),
            reminder_days: env::var("REMINDER_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            backend_url,
            backend_anon_key,
        })
    }

    /// Whether the backend settings look like a real deployment rather than
    /// template values. Used to decide if a failed backend call is worth
    /// showing to the user.
    pub fn backend_configured(&self) -> bool {
        !self.backend_anon_key.is_empty()
            && !PLACEHOLDER_MARKERS
                .iter()
                .any(|marker| self.backend_url.contains(marker))
    }

    /// Whether transactional email can be sent.
    pub fn email_configured(&self) -> bool {
        self.email_api_key.is_some() && self.email_sender_address.is_some()
    }

    /// Config for tests.
    pub fn test_default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:9".to_string(),
            backend_anon_key: "test_anon_key".to_string(),
            backend_service_role_key: None,
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            data_dir: std::env::temp_dir()
                .join(format!("subtrack-test-{}", uuid::Uuid::new_v4()))
                .to_string_lossy()
                .into_owned(),
            session_signing_key: b"test_session_key_32_bytes_min!!".to_vec(),
            checkout_url: "http://127.0.0.1:9/functions/v1/create-checkout-session".to_string(),
            checkout_price_id: Some("price_test_pro".to_string()),
            email_api_url: "http://127.0.0.1:9/v3/smtp/email".to_string(),
            email_api_key: None,
            email_sender_address: None,
            email_sender_name: "SubTrack".to_string(),
            support_email: None,
            reminder_days: 3,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
