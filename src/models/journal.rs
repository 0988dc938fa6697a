// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Journal entry model for storage and API.

use crate::time_utils::PeriodType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Stored journal entry at `users/{uid}/journal/{id}`.
///
/// Entries are immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct JournalEntry {
    /// Store-generated document ID
    pub id: String,
    pub content: String,
    /// Grouping key; empty means the entry is unscoped
    pub period_id: String,
    pub period_type: PeriodType,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    /// ISO-8601 duplicate of `created_at`
    pub timestamp: String,
}

/// Input for appending a journal entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewJournalEntry {
    pub content: String,
    pub period_id: String,
    pub period_type: PeriodType,
}

impl NewJournalEntry {
    /// Unscoped `day` entry.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn in_period(mut self, period_id: impl Into<String>, period_type: PeriodType) -> Self {
        self.period_id = period_id.into();
        self.period_type = period_type;
        self
    }
}
