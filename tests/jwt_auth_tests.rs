// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token tests.
//!
//! These tests pin the session token format: tokens minted at sign-in must
//! decode in the middleware, and tokens from elsewhere must not.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use subtrack::middleware::auth::{create_session_token, decode_session_token, Claims};

const KEY: &[u8] = b"test_session_key_32_bytes_min!!";

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

#[test]
fn test_session_token_roundtrip() {
    let token = create_session_token("user-1", "sid-1", KEY).unwrap();
    let claims = decode_session_token(&token, KEY).expect("token should decode");

    assert_eq!(claims.sub, "user-1");
    assert_eq!(claims.sid, "sid-1");
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_session_token_expiration_is_future() {
    let token = create_session_token("user-1", "sid-1", KEY).unwrap();
    let claims = decode_session_token(&token, KEY).unwrap();

    // Session cookies last about 30 days
    assert!(
        claims.exp > now() + 86400 * 29,
        "Token expiration should be ~30 days in the future"
    );
}

#[test]
fn test_expired_token_rejected() {
    let claims = Claims {
        sub: "user-1".to_string(),
        sid: "sid-1".to_string(),
        iat: now() - 7200,
        exp: now() - 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(KEY),
    )
    .unwrap();

    assert!(decode_session_token(&token, KEY).is_none());
}

#[test]
fn test_token_without_session_id_rejected() {
    // Shape of a bare identity token with no session binding.
    #[derive(Serialize)]
    struct BareClaims {
        sub: String,
        exp: usize,
        iat: usize,
    }

    let token = encode(
        &Header::new(Algorithm::HS256),
        &BareClaims {
            sub: "user-1".to_string(),
            exp: now() + 3600,
            iat: now(),
        },
        &EncodingKey::from_secret(KEY),
    )
    .unwrap();

    assert!(decode_session_token(&token, KEY).is_none());
}

#[test]
fn test_wrong_algorithm_rejected() {
    let claims = Claims {
        sub: "user-1".to_string(),
        sid: "sid-1".to_string(),
        iat: now(),
        exp: now() + 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(KEY),
    )
    .unwrap();

    assert!(decode_session_token(&token, KEY).is_none());
}
