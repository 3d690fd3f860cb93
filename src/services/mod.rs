// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod checkout;
pub mod email;
pub mod intake;
pub mod profile;
pub mod reminders;
pub mod session;
pub mod spending;

pub use auth::{AuthProvider, AuthTokens, HttpAuthProvider, SignUpOutcome};
pub use checkout::{CheckoutOutcome, CheckoutRequest, CheckoutService};
pub use email::EmailService;
pub use profile::ProfileStore;
pub use session::{ActiveSession, SessionState, SessionStore};
