// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! T-Minus: a "time remaining" journal service.
//!
//! This crate provides the backend API for recording journal entries grouped
//! by time period, estimating time remaining from a user's birthdate, and
//! summarizing entries with a generative-text provider.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod time_utils;

use config::Config;
use db::UserDataStore;
use services::{AccountDeletion, AnalysisService, IdentityProvider, ProfileService, TextGenerator};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn UserDataStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: ProfileService,
    pub analysis: AnalysisService,
    pub deletion: AccountDeletion,
}

impl AppState {
    /// Wire the services around their providers.
    pub fn new(
        config: Config,
        store: Arc<dyn UserDataStore>,
        identity: Arc<dyn IdentityProvider>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            profiles: ProfileService::new(store.clone(), config.life_expectancy),
            analysis: AnalysisService::new(generator),
            deletion: AccountDeletion::new(store.clone(), identity.clone()),
            config,
            store,
            identity,
        }
    }
}
