// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#[allow(dead_code)]
pub mod backend_stub;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use subtrack::config::Config;
use subtrack::db::{BackendDb, LocalStore};
use subtrack::error::AppError;
use subtrack::middleware::auth::{create_session_token, SESSION_COOKIE};
use subtrack::models::AuthUser;
use subtrack::routes::create_router;
use subtrack::services::{AuthProvider, AuthTokens, SignUpOutcome};
use subtrack::AppState;

/// Password the mock provider accepts.
#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "correct-horse";

/// Email whose sessions are issued already expiring, with a revoked refresh token.
#[allow(dead_code)]
pub const EXPIRING_EMAIL: &str = "expiring@example.com";

/// Email whose sign-up requires confirmation.
#[allow(dead_code)]
pub const UNCONFIRMED_EMAIL: &str = "new@example.com";

/// Check if a live backend is available via environment variable.
#[allow(dead_code)]
pub fn backend_available() -> bool {
    std::env::var("SUBTRACK_TEST_BACKEND_URL").is_ok()
}

/// Skip test with message if no live backend is configured.
#[macro_export]
macro_rules! require_backend {
    () => {
        if !crate::common::backend_available() {
            eprintln!("⚠️  Skipping: SUBTRACK_TEST_BACKEND_URL not set");
            return;
        }
    };
}

/// In-process stand-in for managed auth.
#[derive(Default)]
pub struct MockAuthProvider {
    pub refresh_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
}

impl MockAuthProvider {
    fn tokens_for(email: &str) -> AuthTokens {
        let expiring = email == EXPIRING_EMAIL;
        AuthTokens {
            access_token: format!("access-{}", email),
            refresh_token: if expiring {
                "revoked".to_string()
            } else {
                format!("refresh-{}", email)
            },
            expires_at: if expiring {
                Utc::now()
            } else {
                Utc::now() + Duration::hours(1)
            },
            user: AuthUser {
                id: format!("user-{}", email.split('@').next().unwrap_or_default()),
                email: Some(email.to_string()),
                created_at: Utc::now() - Duration::days(30),
            },
        }
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthTokens, AppError> {
        if password != TEST_PASSWORD {
            return Err(AppError::Unauthorized);
        }
        Ok(Self::tokens_for(email))
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        _redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome, AppError> {
        if email == UNCONFIRMED_EMAIL {
            return Ok(SignUpOutcome::ConfirmationSent);
        }
        Ok(SignUpOutcome::SignedIn(Self::tokens_for(email)))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AppError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if refresh_token == "revoked" {
            return Err(AppError::InvalidToken);
        }
        let email = refresh_token.trim_start_matches("refresh-");
        Ok(Self::tokens_for(email))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AppError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Handles returned with a test app.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub storage: LocalStore,
    pub auth: Arc<MockAuthProvider>,
}

/// Create a test app with offline dependencies: in-memory local storage,
/// mock managed auth and an unconnected backend.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::test_default(), LocalStore::in_memory(), true)
}

/// Create a test app from an explicit config and store. With
/// `offline_backend` the row store is the offline mock; otherwise it talks to
/// `config.backend_url`.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config, storage: LocalStore, offline_backend: bool) -> TestApp {
    let auth = Arc::new(MockAuthProvider::default());
    let base = AppState::new(config, storage.clone(), auth.clone());
    let state = if offline_backend {
        AppState {
            db: BackendDb::new_mock(),
            ..base
        }
    } else {
        base
    };
    let state = Arc::new(state);

    TestApp {
        router: create_router(state.clone()),
        state,
        storage,
        auth,
    }
}

/// Sign in through the session store and return a `Cookie` header value
/// plus the session id.
#[allow(dead_code)]
pub async fn create_test_session(state: &AppState, email: &str) -> (String, String) {
    let session = state
        .sessions
        .sign_in(email, TEST_PASSWORD)
        .await
        .expect("mock sign-in");
    let token = create_session_token(
        &session.user.id,
        &session.session_id,
        &state.config.session_signing_key,
    )
    .expect("session token");

    (format!("{}={}", SESSION_COOKIE, token), session.session_id)
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Serve `router` on an ephemeral local port and return its base URL.
#[allow(dead_code)]
pub async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{}", addr)
}
