// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session store over managed auth.
//!
//! A session moves through `Loading -> Authenticated | Unauthenticated`.
//! A failed token refresh or an explicit sign-out is a hard reset: the stored
//! session record and its cache entry are purged and the browser is sent back
//! to the root path, so nothing from a broken session survives in memory.

use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::{keys, LocalStore};
use crate::error::AppError;
use crate::models::{AuthUser, SessionRecord};
use crate::services::auth::{AuthProvider, AuthTokens, SignUpOutcome};

/// Refresh access tokens this close to expiry.
const SESSION_REFRESH_MARGIN_SECS: i64 = 60;

/// Where a hard reset sends the browser.
pub const ROOT_PATH: &str = "/";

/// A signed-in session, handed to request handlers.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub session_id: String,
    pub user: AuthUser,
    /// Managed-auth access token, forwarded to the backend and checkout.
    pub access_token: String,
}

#[derive(Debug, Clone)]
pub enum SessionState {
    Loading,
    Authenticated(ActiveSession),
    Unauthenticated,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Fetched(Option<ActiveSession>),
    RefreshFailed,
    /// The backend refused the session's access token.
    TokenRejected,
    SignedOut,
}

/// Purge local session artifacts and navigate to [`ROOT_PATH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetDirective;

impl SessionState {
    /// Apply an event. Refresh failure, token rejection and sign-out always end
    /// unauthenticated with a reset, whatever the prior state.
    pub fn transition(self, event: SessionEvent) -> (SessionState, Option<ResetDirective>) {
        match event {
            SessionEvent::Fetched(Some(session)) => (SessionState::Authenticated(session), None),
            SessionEvent::Fetched(None) => (SessionState::Unauthenticated, None),
            SessionEvent::RefreshFailed
            | SessionEvent::TokenRejected
            | SessionEvent::SignedOut => (SessionState::Unauthenticated, Some(ResetDirective)),
        }
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

/// Outcome of resolving a session id.
#[derive(Debug, Clone)]
pub struct SessionResolution {
    pub state: SessionState,
    pub reset: Option<ResetDirective>,
}

/// Result of a sign-up through the session store.
#[derive(Debug, Clone)]
pub enum SignUpResult {
    ConfirmationSent,
    SignedIn(ActiveSession),
}

/// Shared cache of decoded session records, keyed by session id.
pub type SessionCache = Arc<DashMap<String, SessionRecord>>;

/// Per-session refresh locks.
pub type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Owns session records and their lifecycle.
#[derive(Clone)]
pub struct SessionStore {
    auth: Arc<dyn AuthProvider>,
    storage: LocalStore,
    cache: SessionCache,
    refresh_locks: RefreshLocks,
}

impl SessionStore {
    pub fn new(auth: Arc<dyn AuthProvider>, storage: LocalStore) -> Self {
        Self {
            auth,
            storage,
            cache: Arc::new(DashMap::new()),
            refresh_locks: Arc::new(DashMap::new()),
        }
    }

    // ─── Sign-in / Sign-up / Sign-out ────────────────────────────────────────

    /// Sign in with email and password and persist a new session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<ActiveSession, AppError> {
        let tokens = self.auth.sign_in_with_password(email, password).await?;
        let session = self.start_session(tokens)?;
        tracing::info!(user_id = %session.user.id, "User signed in");
        Ok(session)
    }

    /// Register a new account.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<SignUpResult, AppError> {
        match self.auth.sign_up(email, password, redirect_to).await? {
            SignUpOutcome::ConfirmationSent => Ok(SignUpResult::ConfirmationSent),
            SignUpOutcome::SignedIn(tokens) => Ok(SignUpResult::SignedIn(self.start_session(tokens)?)),
        }
    }

    /// End a session. Local artifacts are purged even when the remote
    /// revocation fails.
    pub async fn sign_out(&self, session_id: &str) -> SessionResolution {
        if let Some(record) = self.load_record(session_id) {
            if let Err(e) = self.auth.sign_out(&record.access_token).await {
                tracing::warn!(error = %e, "Remote sign-out failed, purging locally anyway");
            }
        }
        self.apply(session_id, SessionState::Loading, SessionEvent::SignedOut)
    }

    /// Drop a session whose access token the backend refused.
    pub fn reject(&self, session_id: &str) -> SessionResolution {
        tracing::warn!(session_id = %session_id, "Backend rejected session token, resetting");
        self.apply(session_id, SessionState::Loading, SessionEvent::TokenRejected)
    }

    // ─── Resolution ──────────────────────────────────────────────────────────

    /// Resolve a session id to its current state, refreshing the access token
    /// if it is about to expire.
    pub async fn resolve(&self, session_id: &str) -> SessionResolution {
        let state = SessionState::Loading;
        let margin = Duration::seconds(SESSION_REFRESH_MARGIN_SECS);

        let Some(record) = self.load_record(session_id) else {
            return self.apply(session_id, state, SessionEvent::Fetched(None));
        };

        if Utc::now() + margin < record.expires_at {
            let session = active_session(session_id, &record);
            return self.apply(session_id, state, SessionEvent::Fetched(Some(session)));
        }

        let lock = self
            .refresh_locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another request may have refreshed while we waited.
        if let Some(cached) = self.cache.get(session_id) {
            if Utc::now() + margin < cached.expires_at {
                let session = active_session(session_id, &cached);
                drop(cached);
                return self.apply(session_id, state, SessionEvent::Fetched(Some(session)));
            }
        }

        tracing::info!(user_id = %record.user.id, "Access token expiring, refreshing");

        match self.auth.refresh(&record.refresh_token).await {
            Ok(tokens) => {
                let refreshed = record_from_tokens(tokens);
                if let Err(e) = self.storage.set(&keys::session(session_id), &refreshed) {
                    tracing::warn!(error = %e, "Failed to persist refreshed session");
                }
                let session = active_session(session_id, &refreshed);
                self.cache.insert(session_id.to_string(), refreshed);
                self.apply(session_id, state, SessionEvent::Fetched(Some(session)))
            }
            // Network errors land here too and end the session like a revoked token.
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    user_id = %record.user.id,
                    "Token refresh failed, resetting session"
                );
                self.apply(session_id, state, SessionEvent::RefreshFailed)
            }
        }
    }

    /// Run a transition and carry out any reset it demands.
    fn apply(&self, session_id: &str, state: SessionState, event: SessionEvent) -> SessionResolution {
        let (state, reset) = state.transition(event);
        if reset.is_some() {
            self.purge(session_id);
        }
        SessionResolution { state, reset }
    }

    // ─── Storage ─────────────────────────────────────────────────────────────

    fn start_session(&self, tokens: AuthTokens) -> Result<ActiveSession, AppError> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let record = record_from_tokens(tokens);
        self.storage.set(&keys::session(&session_id), &record)?;
        let session = active_session(&session_id, &record);
        self.cache.insert(session_id, record);
        Ok(session)
    }

    fn load_record(&self, session_id: &str) -> Option<SessionRecord> {
        if let Some(cached) = self.cache.get(session_id) {
            return Some(cached.clone());
        }

        match self.storage.get::<SessionRecord>(&keys::session(session_id)) {
            Ok(Some(record)) => {
                self.cache.insert(session_id.to_string(), record.clone());
                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable session record, discarding");
                self.purge(session_id);
                None
            }
        }
    }

    fn purge(&self, session_id: &str) {
        self.cache.remove(session_id);
        self.refresh_locks.remove(session_id);
        if let Err(e) = self.storage.remove(&keys::session(session_id)) {
            tracing::error!(error = %e, "Failed to delete session record");
        }
    }
}

fn record_from_tokens(tokens: AuthTokens) -> SessionRecord {
    SessionRecord {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_at: tokens.expires_at,
        user: tokens.user,
    }
}

fn active_session(session_id: &str, record: &SessionRecord) -> ActiveSession {
    ActiveSession {
        session_id: session_id.to_string(),
        user: record.user.clone(),
        access_token: record.access_token.clone(),
    }
}
