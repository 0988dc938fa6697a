// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`UserDataStore`] is the seam between the workflows and the document
//! store. [`FirestoreDb`] backs production; [`MemoryDb`] backs development
//! mode and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{JournalEntry, NewJournalEntry, Profile};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// Profile documents, keyed by user ID
    pub const USERS: &str = "users";
    /// Journal entries, a subcollection of each user document
    pub const JOURNAL: &str = "journal";
}

/// Per-user documents owned by the service: one profile plus an append-only
/// journal.
#[async_trait]
pub trait UserDataStore: Send + Sync {
    /// Get a user's profile document.
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError>;

    /// Create or replace a user's profile document.
    async fn upsert_profile(&self, user_id: &str, profile: &Profile) -> Result<(), AppError>;

    /// Delete a user's profile document. Deleting a missing document succeeds.
    async fn delete_profile(&self, user_id: &str) -> Result<(), AppError>;

    /// Append a journal entry stamped with the store's current time.
    async fn add_journal_entry(
        &self,
        user_id: &str,
        entry: NewJournalEntry,
    ) -> Result<JournalEntry, AppError>;

    /// Entries newest first. An empty `period_id` returns every entry;
    /// otherwise only entries whose period ID matches exactly.
    async fn get_journal_entries(
        &self,
        user_id: &str,
        period_id: &str,
    ) -> Result<Vec<JournalEntry>, AppError>;

    /// Delete every journal entry of a user in one atomic commit.
    ///
    /// Returns the number of entries deleted.
    async fn delete_all_journal_entries(&self, user_id: &str) -> Result<usize, AppError>;
}
