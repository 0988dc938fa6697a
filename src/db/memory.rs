// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Mirrors the Firestore layout (profile per user, journal subcollection per
//! user) so the workflows behave the same against either backend.

use crate::db::UserDataStore;
use crate::error::AppError;
use crate::models::{JournalEntry, NewJournalEntry, Profile};
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of "server time" for new entries.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// In-memory implementation of [`UserDataStore`].
#[derive(Clone)]
pub struct MemoryDb {
    profiles: Arc<DashMap<String, Profile>>,
    journals: Arc<DashMap<String, Vec<JournalEntry>>>,
    next_id: Arc<AtomicU64>,
    clock: Clock,
}

impl Default for MemoryDb {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Store whose entry timestamps come from `clock`.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            profiles: Arc::new(DashMap::new()),
            journals: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            clock,
        }
    }

    /// Number of journal entries held for a user.
    pub fn journal_len(&self, user_id: &str) -> usize {
        self.journals.get(user_id).map_or(0, |entries| entries.len())
    }
}

#[async_trait]
impl UserDataStore for MemoryDb {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        Ok(self.profiles.get(user_id).map(|p| p.clone()))
    }

    async fn upsert_profile(&self, user_id: &str, profile: &Profile) -> Result<(), AppError> {
        self.profiles.insert(user_id.to_string(), profile.clone());
        Ok(())
    }

    async fn delete_profile(&self, user_id: &str) -> Result<(), AppError> {
        self.profiles.remove(user_id);
        Ok(())
    }

    async fn add_journal_entry(
        &self,
        user_id: &str,
        entry: NewJournalEntry,
    ) -> Result<JournalEntry, AppError> {
        let now = (self.clock)();
        let id = format!("entry-{:08}", self.next_id.fetch_add(1, Ordering::Relaxed));

        let stored = JournalEntry {
            id,
            content: entry.content,
            period_id: entry.period_id,
            period_type: entry.period_type,
            created_at: now,
            timestamp: format_utc_rfc3339(now),
        };

        self.journals
            .entry(user_id.to_string())
            .or_default()
            .push(stored.clone());

        Ok(stored)
    }

    async fn get_journal_entries(
        &self,
        user_id: &str,
        period_id: &str,
    ) -> Result<Vec<JournalEntry>, AppError> {
        let mut entries: Vec<JournalEntry> = self
            .journals
            .get(user_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| period_id.is_empty() || e.period_id == period_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // IDs are zero-padded and increasing, so they order ties by insertion.
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(entries)
    }

    async fn delete_all_journal_entries(&self, user_id: &str) -> Result<usize, AppError> {
        Ok(self
            .journals
            .remove(user_id)
            .map_or(0, |(_, entries)| entries.len()))
    }
}
