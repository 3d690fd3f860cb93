// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity and session records issued by the managed auth service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identity as reported by managed auth. Never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Backend user id (UUID string)
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Token pair plus identity, persisted under a server-issued session id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub access_token: String,
    pub refresh_token: String,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}
