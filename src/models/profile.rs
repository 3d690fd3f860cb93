// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User-editable profile kept in local storage.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Profile record, keyed by user id.
///
/// Every field defaults so records written by older builds, or with fields
/// missing, still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct Profile {
    pub display_name: String,
    pub email: String,
    pub bio: String,
    pub location: String,
    pub website: String,
    /// Avatar URL or data URI
    pub avatar: String,
    /// RFC3339 timestamp of account creation
    pub join_date: String,
}

/// Fields a user may change. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileUpdate {
    #[validate(length(max = 80))]
    pub display_name: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    #[validate(length(max = 200))]
    pub website: Option<String>,
    pub avatar: Option<String>,
}

impl Profile {
    /// Overwrite the fields present in `update`.
    pub fn merge(&mut self, update: ProfileUpdate) {
        if let Some(v) = update.display_name {
            self.display_name = v;
        }
        if let Some(v) = update.bio {
            self.bio = v;
        }
        if let Some(v) = update.location {
            self.location = v;
        }
        if let Some(v) = update.website {
            self.website = v;
        }
        if let Some(v) = update.avatar {
            self.avatar = v;
        }
    }
}
