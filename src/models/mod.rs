// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod profile;
pub mod spending;
pub mod subscription;
pub mod user;

pub use profile::{Profile, ProfileUpdate};
pub use spending::{SpendingDataPoint, SpendingReport};
pub use subscription::{
    BillingCycle, NewSubscription, Subscription, SubscriptionStatus, SubscriptionUpdate,
};
pub use user::{AuthUser, SessionRecord};
