// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (`FIRESTORE_EMULATOR_HOST` set). Each test uses a fresh user ID.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tminus::db::{collections, UserDataStore};
use tminus::models::{NewJournalEntry, Profile};
use tminus::time_utils::PeriodType;

mod common;
use common::{test_db, unique_uid};

// ═══════════════════════════════════════════════════════════════════════════
// PROFILE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_profile_upsert_and_delete() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid("profile");

    assert!(db.get_profile(&uid).await.unwrap().is_none());

    let profile = Profile {
        birthdate: Some("1990-05-15".to_string()),
        birth_time: Some("08:30".to_string()),
        life_expectancy: Some(82.0),
        created_at: Some(chrono::Utc::now()),
        updated_at: None,
    };
    db.upsert_profile(&uid, &profile).await.unwrap();

    let fetched = db.get_profile(&uid).await.unwrap().expect("profile stored");
    assert_eq!(fetched.birthdate.as_deref(), Some("1990-05-15"));
    assert_eq!(fetched.birth_time.as_deref(), Some("08:30"));
    assert_eq!(fetched.life_expectancy, Some(82.0));
    assert!(fetched.created_at.is_some());

    db.delete_profile(&uid).await.unwrap();
    assert!(db.get_profile(&uid).await.unwrap().is_none());

    // Deleting again is not an error
    db.delete_profile(&uid).await.unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════
// JOURNAL TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_journal_entries_newest_first() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid("journal");

    for i in 0..5 {
        db.add_journal_entry(&uid, NewJournalEntry::new(format!("entry {i}")))
            .await
            .unwrap();
        // Distinct server timestamps
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let entries = db.get_journal_entries(&uid, "").await.unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0].content, "entry 4");
    assert_eq!(entries[4].content, "entry 0");
    assert!(entries
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
    assert!(entries.iter().all(|e| !e.id.is_empty()));
}

#[tokio::test]
async fn test_journal_period_filter() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid("period");

    db.add_journal_entry(
        &uid,
        NewJournalEntry::new("weekly").in_period("week-2025-1", PeriodType::Week),
    )
    .await
    .unwrap();
    db.add_journal_entry(
        &uid,
        NewJournalEntry::new("other week").in_period("week-2025-10", PeriodType::Week),
    )
    .await
    .unwrap();
    db.add_journal_entry(&uid, NewJournalEntry::new(""))
        .await
        .unwrap();

    let matched = db.get_journal_entries(&uid, "week-2025-1").await.unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].content, "weekly");
    assert_eq!(matched[0].period_type, PeriodType::Week);

    assert_eq!(db.get_journal_entries(&uid, "").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_all_journal_entries() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid("wipe");
    let bystander = unique_uid("keep");

    for i in 0..3 {
        db.add_journal_entry(&uid, NewJournalEntry::new(format!("{i}")))
            .await
            .unwrap();
    }
    db.add_journal_entry(&bystander, NewJournalEntry::new("mine"))
        .await
        .unwrap();

    assert_eq!(db.delete_all_journal_entries(&uid).await.unwrap(), 3);
    assert!(db.get_journal_entries(&uid, "").await.unwrap().is_empty());
    assert_eq!(db.delete_all_journal_entries(&uid).await.unwrap(), 0);

    assert_eq!(
        db.get_journal_entries(&bystander, "").await.unwrap().len(),
        1
    );
}

/// Entry written by an older client: no `createdAt`, no period fields.
#[derive(Serialize, Deserialize)]
struct LegacyEntry {
    content: String,
}

#[tokio::test]
async fn test_delete_all_includes_entries_without_created_at() {
    require_emulator!();

    let db = test_db().await;
    let uid = unique_uid("legacy");

    db.add_journal_entry(&uid, NewJournalEntry::new("current"))
        .await
        .unwrap();

    let client = db.get_client().unwrap();
    let parent = client.parent_path(collections::USERS, &uid).unwrap();
    let _: () = client
        .fluent()
        .insert()
        .into(collections::JOURNAL)
        .document_id("legacy-entry")
        .parent(&parent)
        .object(&LegacyEntry {
            content: "old".to_string(),
        })
        .execute()
        .await
        .unwrap();

    assert_eq!(db.delete_all_journal_entries(&uid).await.unwrap(), 2);

    let remaining: Vec<serde_json::Value> = client
        .fluent()
        .select()
        .from(collections::JOURNAL)
        .parent(&parent)
        .obj()
        .query()
        .await
        .unwrap();
    assert!(remaining.is_empty());
}
