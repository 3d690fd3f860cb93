// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile persistence in local storage.

use crate::db::{keys, LocalStore, StorageError};
use crate::error::AppError;
use crate::models::{AuthUser, Profile, ProfileUpdate};
use crate::time_utils::format_utc_rfc3339;

/// Loads and saves user profiles. Local storage is the only durable copy;
/// identity fields fall back to what managed auth reports.
#[derive(Clone)]
pub struct ProfileStore {
    storage: LocalStore,
}

impl ProfileStore {
    pub fn new(storage: LocalStore) -> Self {
        Self { storage }
    }

    /// Load the profile for `user`, seeding and persisting one on first use.
    pub fn load(&self, user: &AuthUser) -> Profile {
        let key = keys::profile(&user.id);

        match self.storage.get::<Profile>(&key) {
            Ok(Some(mut profile)) => {
                fill_identity(&mut profile, user);
                return profile;
            }
            Ok(None) => {
                tracing::debug!(user_id = %user.id, "No stored profile, seeding");
            }
            Err(StorageError::Corrupt { reason, .. }) => {
                tracing::warn!(user_id = %user.id, reason = %reason, "Stored profile unreadable, reseeding");
            }
            Err(e) => {
                // Leave whatever is on disk alone; it may be readable next time.
                tracing::warn!(user_id = %user.id, error = %e, "Failed to read profile");
                return seed_profile(user);
            }
        }

        let profile = seed_profile(user);
        if let Err(e) = self.storage.set(&key, &profile) {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to persist seeded profile");
        }
        profile
    }

    /// Merge `update` into the stored profile and write it back wholesale.
    pub fn save(&self, user: &AuthUser, update: ProfileUpdate) -> Result<Profile, AppError> {
        let mut profile = self.load(user);
        profile.merge(update);

        self.storage.set(&keys::profile(&user.id), &profile).map_err(|e| {
            tracing::error!(user_id = %user.id, error = %e, "Failed to save profile");
            AppError::from(e)
        })?;

        tracing::info!(user_id = %user.id, "Profile saved");
        Ok(profile)
    }
}

/// Initial profile derived from the auth identity.
fn seed_profile(user: &AuthUser) -> Profile {
    let email = user.email.clone().unwrap_or_default();
    let display_name = email.split('@').next().unwrap_or_default().to_string();

    Profile {
        display_name,
        email,
        join_date: format_utc_rfc3339(user.created_at),
        ..Profile::default()
    }
}

fn fill_identity(profile: &mut Profile, user: &AuthUser) {
    if profile.email.is_empty() {
        profile.email = user.email.clone().unwrap_or_default();
    }
    if profile.join_date.is_empty() {
        profile.join_date = format_utc_rfc3339(user.created_at);
    }
}
