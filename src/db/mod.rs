// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer: the managed backend's row store and local device storage.

pub mod backend;
pub mod local;

pub use backend::BackendDb;
pub use local::{LocalStore, StorageError};

/// Backend table, view and procedure names.
pub mod tables {
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    /// Read-only view over auth users (service role only)
    pub const USERS: &str = "users";
    pub const RESEND_CONFIRMATION_RPC: &str = "resend_confirmation_email";
}

/// Local storage key prefixes. Full keys are `prefix + id`.
pub mod keys {
    pub const PROFILE: &str = "subtrack_profile_";
    pub const SESSION: &str = "subtrack_session_";

    pub fn profile(user_id: &str) -> String {
        format!("{}{}", PROFILE, user_id)
    }

    pub fn session(session_id: &str) -> String {
        format!("{}{}", SESSION, session_id)
    }
}
