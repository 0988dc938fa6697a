// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Layout:
//! - `users/{uid}`: profile document
//! - `users/{uid}/journal/{auto_id}`: journal entries
//!
//! Timestamps are stored as native Firestore timestamps, so the wire
//! documents here differ from the API models in [`crate::models`].

use crate::config::Config;
use crate::db::{collections, UserDataStore};
use crate::error::AppError;
use crate::models::{JournalEntry, NewJournalEntry, Profile};
use crate::time_utils::{format_utc_rfc3339, PeriodType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile document as stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDoc {
    #[serde(default)]
    birthdate: Option<String>,
    #[serde(default)]
    birth_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    life_expectancy: Option<f64>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    updated_at: Option<DateTime<Utc>>,
}

impl From<&Profile> for ProfileDoc {
    fn from(profile: &Profile) -> Self {
        Self {
            birthdate: profile.birthdate.clone(),
            birth_time: profile.birth_time.clone(),
            life_expectancy: profile.life_expectancy,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

impl From<ProfileDoc> for Profile {
    fn from(doc: ProfileDoc) -> Self {
        Self {
            birthdate: doc.birthdate,
            birth_time: doc.birth_time,
            life_expectancy: doc.life_expectancy,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// Journal entry document as stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JournalEntryDoc {
    /// Populated from the document name on reads; never written.
    #[serde(alias = "_firestore_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    period_id: String,
    #[serde(default)]
    period_type: PeriodType,
    #[serde(with = "firestore::serialize_as_timestamp")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    timestamp: String,
}

impl JournalEntryDoc {
    fn into_entry(self) -> Result<JournalEntry, AppError> {
        let id = self
            .id
            .ok_or_else(|| AppError::Database("Journal entry without document ID".to_string()))?;

        Ok(JournalEntry {
            id,
            content: self.content,
            period_id: self.period_id,
            period_type: self.period_type,
            created_at: self.created_at,
            timestamp: self.timestamp,
        })
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// Uses the emulator when `firestore_emulator_host` is configured, the
    /// explicit service account when one is configured, and
    /// application-default credentials otherwise.
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        let project_id = config.firebase_project_id.as_str();

        if config.firestore_emulator_host.is_some() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = match config.service_account_json() {
            Some(json) => firestore::FirestoreDb::with_options_token_source(
                firestore::FirestoreDbOptions::new(project_id.to_string()),
                gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
                gcloud_sdk::TokenSourceType::Json(json),
            )
            .await,
            None => firestore::FirestoreDb::new(project_id).await,
        }
        .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// The underlying client, or an error if offline.
    pub fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Path of `users/{uid}`, the parent of the journal subcollection.
    fn user_path(&self, user_id: &str) -> Result<firestore::ParentPathBuilder, AppError> {
        self.get_client()?
            .parent_path(collections::USERS, user_id)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_journal_docs(
        &self,
        user_id: &str,
        period_id: &str,
    ) -> Result<Vec<JournalEntryDoc>, AppError> {
        let parent_path = self.user_path(user_id)?;

        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::JOURNAL)
            .parent(&parent_path);

        let query = if period_id.is_empty() {
            query
        } else {
            let period_id = period_id.to_string();
            query.filter(move |q| q.field("periodId").eq(period_id.clone()))
        };

        query
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of every journal document under `users/{uid}`.
    ///
    /// Unordered and projected to `__name__` so entries missing `createdAt`
    /// or carrying an older schema are still enumerated.
    async fn list_journal_doc_ids(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let parent_path = self.user_path(user_id)?;

        let docs = self
            .get_client()?
            .fluent()
            .select()
            .fields(["__name__"])
            .from(collections::JOURNAL)
            .parent(&parent_path)
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        docs.into_iter()
            .map(|doc| {
                doc.name
                    .rsplit('/')
                    .next()
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::Database(format!("Malformed document name: {}", doc.name))
                    })
            })
            .collect()
    }
}

#[async_trait]
impl UserDataStore for FirestoreDb {
    // ─── Profile Operations ──────────────────────────────────────

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        let doc: Option<ProfileDoc> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc.map(Profile::from))
    }

    async fn upsert_profile(&self, user_id: &str, profile: &Profile) -> Result<(), AppError> {
        let doc = ProfileDoc::from(profile);

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_profile(&self, user_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(user_id, "Deleted profile document");
        Ok(())
    }

    // ─── Journal Operations ──────────────────────────────────────

    async fn add_journal_entry(
        &self,
        user_id: &str,
        entry: NewJournalEntry,
    ) -> Result<JournalEntry, AppError> {
        let parent_path = self.user_path(user_id)?;
        let now = Utc::now();

        let doc = JournalEntryDoc {
            id: None,
            content: entry.content,
            period_id: entry.period_id,
            period_type: entry.period_type,
            created_at: now,
            timestamp: format_utc_rfc3339(now),
        };

        let stored: JournalEntryDoc = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::JOURNAL)
            .generate_document_id()
            .parent(&parent_path)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let stored = stored.into_entry()?;
        tracing::debug!(
            user_id,
            entry_id = %stored.id,
            period_id = %stored.period_id,
            period_type = %stored.period_type,
            "Journal entry added"
        );
        Ok(stored)
    }

    async fn get_journal_entries(
        &self,
        user_id: &str,
        period_id: &str,
    ) -> Result<Vec<JournalEntry>, AppError> {
        self.list_journal_docs(user_id, period_id)
            .await?
            .into_iter()
            .map(JournalEntryDoc::into_entry)
            .collect()
    }

    async fn delete_all_journal_entries(&self, user_id: &str) -> Result<usize, AppError> {
        let doc_ids = self.list_journal_doc_ids(user_id).await?;
        if doc_ids.is_empty() {
            return Ok(0);
        }

        let client = self.get_client()?;
        let parent_path = self.user_path(user_id)?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for doc_id in &doc_ids {
            client
                .fluent()
                .delete()
                .from(collections::JOURNAL)
                .document_id(doc_id)
                .parent(&parent_path)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add deletion to transaction for {}: {}",
                        collections::JOURNAL,
                        e
                    ))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit batch deletion: {}", e)))?;

        tracing::debug!(user_id, count = doc_ids.len(), "Deleted journal entries");
        Ok(doc_ids.len())
    }
}
