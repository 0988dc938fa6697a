// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;
use std::sync::{Arc, Mutex};
use tminus::config::Config;
use tminus::db::{FirestoreDb, MemoryDb, UserDataStore};
use tminus::error::AppError;
use tminus::models::{JournalEntry, NewJournalEntry, Profile, VerifiedIdToken};
use tminus::routes::create_router;
use tminus::services::{IdentityProvider, TextGenerator, TokenError};
use tminus::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection against the emulator.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    let mut config = Config::test_default();
    config.firestore_emulator_host = std::env::var("FIRESTORE_EMULATOR_HOST").ok();
    FirestoreDb::new(&config)
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Generate a unique user ID for test isolation.
#[allow(dead_code)]
pub fn unique_uid(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}-{nanos}")
}

/// Bearer token the mock identity provider accepts for `uid`.
#[allow(dead_code)]
pub fn token_for(uid: &str) -> String {
    format!("token-{uid}")
}

/// Identity provider that accepts `token-<uid>` and records deletions.
#[derive(Default)]
pub struct MockIdentity {
    pub fail_delete: bool,
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdToken, TokenError> {
        let uid = id_token
            .strip_prefix("token-")
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| TokenError::Rejected("unknown token".to_string()))?;

        Ok(VerifiedIdToken {
            uid: uid.to_string(),
            email: Some(format!("{uid}@example.com")),
            email_verified: true,
            auth_time: 0,
        })
    }

    async fn delete_user(&self, uid: &str) -> Result<(), AppError> {
        if self.fail_delete {
            return Err(AppError::IdentityProvider("USER_NOT_FOUND".to_string()));
        }
        self.deleted.lock().unwrap().push(uid.to_string());
        Ok(())
    }
}

/// Generator returning a canned reply, or failing when `reply` is `None`.
pub struct StubGenerator {
    pub reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    #[allow(dead_code)]
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    #[allow(dead_code)]
    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| AppError::Generation("upstream unavailable".to_string()))
    }
}

/// Memory store whose bulk journal deletion always fails.
pub struct FailingJournalStore {
    pub inner: MemoryDb,
}

#[async_trait]
impl UserDataStore for FailingJournalStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.inner.get_profile(user_id).await
    }

    async fn upsert_profile(&self, user_id: &str, profile: &Profile) -> Result<(), AppError> {
        self.inner.upsert_profile(user_id, profile).await
    }

    async fn delete_profile(&self, user_id: &str) -> Result<(), AppError> {
        self.inner.delete_profile(user_id).await
    }

    async fn add_journal_entry(
        &self,
        user_id: &str,
        entry: NewJournalEntry,
    ) -> Result<JournalEntry, AppError> {
        self.inner.add_journal_entry(user_id, entry).await
    }

    async fn get_journal_entries(
        &self,
        user_id: &str,
        period_id: &str,
    ) -> Result<Vec<JournalEntry>, AppError> {
        self.inner.get_journal_entries(user_id, period_id).await
    }

    async fn delete_all_journal_entries(&self, _user_id: &str) -> Result<usize, AppError> {
        Err(AppError::Database("commit failed: unavailable".to_string()))
    }
}

/// Router plus handles on its fakes.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub identity: Arc<MockIdentity>,
    pub generator: Arc<StubGenerator>,
}

/// Create a test app over the given store and fakes.
#[allow(dead_code)]
pub fn create_test_app_with(
    store: Arc<dyn UserDataStore>,
    identity: Arc<MockIdentity>,
    generator: Arc<StubGenerator>,
) -> TestApp {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        store,
        identity.clone(),
        generator.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        identity,
        generator,
    }
}

/// Create a test app with an in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> (TestApp, Arc<MemoryDb>) {
    let db = Arc::new(MemoryDb::new());
    let app = create_test_app_with(
        db.clone(),
        Arc::new(MockIdentity::default()),
        Arc::new(StubGenerator::replying(
            r#"{"summary":"ok","insights":["a","b","c"],"sentiment":"neutral"}"#,
        )),
    );
    (app, db)
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
