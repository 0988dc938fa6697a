// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The configuration is assembled once at startup and handed to every
//! component that needs credentials or tunables. Nothing else in the crate
//! reads the process environment.

use crate::time_utils::{DayGranularity, LifeExpectancyPolicy};
use std::env;
use std::time::Duration;

/// Default Gemini model used for journal analysis.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Default bounded wait before the auth session is declared settled.
pub const DEFAULT_AUTH_SETTLE_TIMEOUT: Duration = Duration::from_secs(3);

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

/// Which document store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// Process-local store; data is lost on restart.
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnv,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,

    // --- Firebase ---
    /// Firebase / GCP project ID (also the ID-token audience)
    pub firebase_project_id: String,
    /// Service account email for admin operations
    pub firebase_client_email: Option<String>,
    /// Service account private key (PEM, real newlines)
    pub firebase_private_key: Option<String>,
    pub store_backend: StoreBackend,
    /// Firestore emulator address; when set, connect unauthenticated
    pub firestore_emulator_host: Option<String>,

    // --- Gemini ---
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,

    // --- Behaviour ---
    pub auth_settle_timeout: Duration,
    pub life_expectancy: LifeExpectancyPolicy,
    pub day_granularity: DayGranularity,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            app_env: AppEnv::Development,
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            firebase_project_id: "test-project".to_string(),
            firebase_client_email: None,
            firebase_private_key: None,
            store_backend: StoreBackend::Memory,
            firestore_emulator_host: None,
            gemini_api_key: Some("test-gemini-key".to_string()),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            auth_settle_timeout: DEFAULT_AUTH_SETTLE_TIMEOUT,
            life_expectancy: LifeExpectancyPolicy::default(),
            day_granularity: DayGranularity::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let app_env = match get("APP_ENV").as_deref() {
            None | Some("development") | Some("dev") => AppEnv::Development,
            Some("production") | Some("prod") => AppEnv::Production,
            Some(_) => return Err(ConfigError::Invalid("APP_ENV")),
        };
        let production = app_env == AppEnv::Production;

        let firebase_project_id = match get("FIREBASE_PROJECT_ID") {
            Some(id) => id,
            None if production => return Err(ConfigError::Missing("FIREBASE_PROJECT_ID")),
            None => "local-dev".to_string(),
        };

        let firebase_client_email = get("FIREBASE_CLIENT_EMAIL");
        // The key usually arrives with literal "\n" sequences.
        let firebase_private_key = get("FIREBASE_PRIVATE_KEY").map(|k| k.replace("\\n", "\n"));
        match (&firebase_client_email, &firebase_private_key) {
            (Some(_), None) => return Err(ConfigError::Missing("FIREBASE_PRIVATE_KEY")),
            (None, Some(_)) => return Err(ConfigError::Missing("FIREBASE_CLIENT_EMAIL")),
            _ => {}
        }

        let gemini_api_key = get("GEMINI_API_KEY");
        if production && gemini_api_key.is_none() {
            return Err(ConfigError::Missing("GEMINI_API_KEY"));
        }

        let store_backend = match get("STORE_BACKEND").as_deref() {
            None | Some("firestore") => StoreBackend::Firestore,
            Some("memory") if !production => StoreBackend::Memory,
            Some(_) => return Err(ConfigError::Invalid("STORE_BACKEND")),
        };

        let auth_settle_timeout = match get("AUTH_SETTLE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs_f64(
                raw.parse::<f64>()
                    .ok()
                    .filter(|secs| secs.is_finite() && *secs >= 0.0)
                    .ok_or(ConfigError::Invalid("AUTH_SETTLE_TIMEOUT_SECS"))?,
            ),
            None => DEFAULT_AUTH_SETTLE_TIMEOUT,
        };

        let mut life_expectancy = LifeExpectancyPolicy::default();
        if let Some(raw) = get("DEFAULT_LIFE_EXPECTANCY") {
            life_expectancy.default_years = raw
                .parse::<f64>()
                .ok()
                .filter(|years| years.is_finite() && *years > 0.0)
                .ok_or(ConfigError::Invalid("DEFAULT_LIFE_EXPECTANCY"))?;
        }
        if let Some(raw) = get("ZERO_LIFE_EXPECTANCY_MEANS_DEFAULT") {
            life_expectancy.zero_means_default =
                parse_bool(&raw).ok_or(ConfigError::Invalid("ZERO_LIFE_EXPECTANCY_MEANS_DEFAULT"))?;
        }

        let day_granularity = match get("DAY_PERIOD_GRANULARITY") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("DAY_PERIOD_GRANULARITY"))?,
            None => DayGranularity::default(),
        };

        Ok(Self {
            app_env,
            frontend_url: get("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            port: get("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
            firebase_project_id,
            firebase_client_email,
            firebase_private_key,
            store_backend,
            firestore_emulator_host: get("FIRESTORE_EMULATOR_HOST"),
            gemini_api_key,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            auth_settle_timeout,
            life_expectancy,
            day_granularity,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env == AppEnv::Production
    }

    /// Service-account JSON for `gcloud-sdk`, if explicit credentials were supplied.
    ///
    /// Returns `None` when application-default credentials should be used.
    pub fn service_account_json(&self) -> Option<String> {
        let email = self.firebase_client_email.as_ref()?;
        let key = self.firebase_private_key.as_ref()?;

        Some(
            serde_json::json!({
                "type": "service_account",
                "project_id": self.firebase_project_id,
                "client_email": email,
                "private_key": key,
                "token_uri": "https://oauth2.googleapis.com/token",
            })
            .to_string(),
        )
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
