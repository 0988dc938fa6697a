// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Journal analysis request/response models.

use crate::models::JournalEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Structured analysis returned to clients.
///
/// A degraded result (unparseable provider output) still has this shape,
/// with `sentiment == "unknown"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AnalysisResult {
    pub summary: String,
    pub insights: Vec<String>,
    pub sentiment: String,
}

/// One journal entry as submitted for analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisEntry {
    pub content: String,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<EntryInstant>,
    /// ISO-8601 duplicate written alongside `createdAt`
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Creation instant as clients send it: a Firestore timestamp object or an
/// ISO-8601 string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryInstant {
    Timestamp {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    Iso(DateTime<Utc>),
}

impl AnalysisEntry {
    /// When the entry was written, if the client told us.
    pub fn written_at(&self) -> Option<DateTime<Utc>> {
        match &self.created_at {
            Some(EntryInstant::Timestamp {
                seconds,
                nanoseconds,
            }) => DateTime::from_timestamp(*seconds, *nanoseconds),
            Some(EntryInstant::Iso(at)) => Some(*at),
            None => self
                .timestamp
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl From<&JournalEntry> for AnalysisEntry {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            content: entry.content.clone(),
            created_at: Some(EntryInstant::Iso(entry.created_at)),
            timestamp: Some(entry.timestamp.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_firestore_timestamp_objects() {
        let entry: AnalysisEntry = serde_json::from_value(serde_json::json!({
            "content": "walked to the lake",
            "createdAt": { "seconds": 1_700_000_000, "nanoseconds": 0 }
        }))
        .unwrap();

        assert_eq!(
            entry.written_at(),
            DateTime::from_timestamp(1_700_000_000, 0)
        );
    }

    #[test]
    fn accepts_iso_strings_and_timestamp_fallback() {
        let entry: AnalysisEntry = serde_json::from_value(serde_json::json!({
            "content": "x",
            "createdAt": "2025-03-07T09:05:03Z"
        }))
        .unwrap();
        assert_eq!(
            entry.written_at().unwrap().to_rfc3339(),
            "2025-03-07T09:05:03+00:00"
        );

        let entry: AnalysisEntry = serde_json::from_value(serde_json::json!({
            "content": "x",
            "timestamp": "2025-03-07T09:05:03Z"
        }))
        .unwrap();
        assert!(entry.written_at().is_some());

        let entry: AnalysisEntry =
            serde_json::from_value(serde_json::json!({ "content": "x" })).unwrap();
        assert!(entry.written_at().is_none());
    }
}
