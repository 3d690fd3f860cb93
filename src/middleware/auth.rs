// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.
//!
//! The browser holds a signed session token (cookie, or bearer header for
//! API clients) naming a session id. The session store resolves that id to
//! managed-auth tokens, refreshing them when needed.

use crate::error::BackendAuthRejected;
use crate::services::session::{ActiveSession, ResetDirective, ROOT_PATH};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "subtrack_session";

/// Session cookie lifetime in days.
const SESSION_TTL_DAYS: i64 = 30;

/// Session token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (backend user id)
    pub sub: String,
    /// Session id in the session store
    pub sid: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Middleware that requires a resolvable session.
///
/// A session whose refresh failed, or whose token the backend refuses while
/// handling the request, is reset: the cookie is removed and the browser is
/// sent to the root path instead of being shown an error.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match current_session(&state, &jar, request.headers()).await {
        (Some(session), _) => {
            let session_id = session.session_id.clone();
            request.extensions_mut().insert(session);
            let response = next.run(request).await;

            if response.extensions().get::<BackendAuthRejected>().is_some() {
                state.sessions.reject(&session_id);
                return hard_reset(jar, &state.config.frontend_url);
            }
            response
        }
        (None, Some(ResetDirective)) => hard_reset(jar, &state.config.frontend_url),
        (None, None) => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// Resolve the request's session, if any.
pub async fn current_session(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> (Option<ActiveSession>, Option<ResetDirective>) {
    let Some(token) = session_token(jar, headers) else {
        return (None, None);
    };

    let Some(claims) = decode_session_token(&token, &state.config.session_signing_key) else {
        return (None, None);
    };

    let resolution = state.sessions.resolve(&claims.sid).await;
    match resolution.state.session() {
        Some(session) if session.user.id == claims.sub => (Some(session.clone()), None),
        Some(_) => {
            tracing::warn!(sid = %claims.sid, "Session token subject does not match session");
            (None, None)
        }
        None => (None, resolution.reset),
    }
}

/// Cookie first, then `Authorization: Bearer`.
pub fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Verify and decode a session token.
pub fn decode_session_token(token: &str, signing_key: &[u8]) -> Option<Claims> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .ok()
}

/// Create a signed session token.
pub fn create_session_token(
    user_id: &str,
    session_id: &str,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        sid: session_id.to_string(),
        iat: now,
        exp: now + SESSION_TTL_DAYS as usize * 24 * 60 * 60,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Build the session cookie. `Secure` is dropped for plain-http localhost.
pub fn session_cookie(token: String, frontend_url: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(!is_local(frontend_url))
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Removal cookie whose attributes match [`session_cookie`].
pub fn session_cookie_removal(frontend_url: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(!is_local(frontend_url))
        .same_site(SameSite::Lax)
        .build()
}

/// Drop the session cookie and send the browser to the frontend root path.
pub fn hard_reset(jar: CookieJar, frontend_url: &str) -> Response {
    let jar = jar.remove(session_cookie_removal(frontend_url));
    let root = format!("{}{}", frontend_url.trim_end_matches('/'), ROOT_PATH);
    (jar, Redirect::to(&root)).into_response()
}

fn is_local(url: &str) -> bool {
    url.starts_with("http://localhost") || url.starts_with("http://127.0.0.1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let key = b"test_session_key_32_bytes_min!!";
        let token = create_session_token("user-1", "sid-1", key).unwrap();
        let claims = decode_session_token(&token, key).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.sid, "sid-1");
        assert!(claims.exp > claims.iat);

        assert!(decode_session_token(&token, b"another_key_entirely_32_bytes!!").is_none());
    }

    #[test]
    fn test_cookie_attributes() {
        let local = session_cookie("t".to_string(), "http://localhost:5173");
        assert_eq!(local.secure(), Some(false));
        assert_eq!(local.http_only(), Some(true));

        let prod = session_cookie("t".to_string(), "https://app.subtrack.test");
        assert_eq!(prod.secure(), Some(true));
        assert_eq!(prod.same_site(), Some(SameSite::Lax));
    }
}
