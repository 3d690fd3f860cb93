// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SubTrack: track recurring subscriptions and what they cost
//!
//! This crate provides the backend API behind the SubTrack web app: session
//! handling over managed auth, subscription records, spending analytics,
//! profile storage, receipt intake, checkout and email.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{BackendDb, LocalStore, StorageError};
use services::{
    AuthProvider, CheckoutService, EmailService, HttpAuthProvider, ProfileStore, SessionStore,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: BackendDb,
    pub sessions: SessionStore,
    pub profiles: ProfileStore,
    pub checkout: CheckoutService,
    pub email: EmailService,
}

impl AppState {
    /// Assemble state from explicit collaborators.
    pub fn new(config: Config, storage: LocalStore, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            db: BackendDb::new(&config.backend_url, &config.backend_anon_key),
            sessions: SessionStore::new(auth, storage.clone()),
            profiles: ProfileStore::new(storage),
            checkout: CheckoutService::new(&config.checkout_url, &config.backend_anon_key),
            email: EmailService::from_config(&config),
            config,
        }
    }

    /// Production wiring: directory-backed local store and HTTP managed auth.
    pub fn from_config(config: Config) -> Result<Self, StorageError> {
        let storage = LocalStore::open(&config.data_dir)?;
        let auth = Arc::new(HttpAuthProvider::new(
            &config.backend_url,
            &config.backend_anon_key,
        ));
        Ok(Self::new(config, storage, auth))
    }
}
