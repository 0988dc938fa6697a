// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{JournalEntry, NewJournalEntry, Profile};
use crate::services::ProfileUpdate;
use crate::time_utils::{PeriodType, TimeRemaining};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use std::sync::Arc;

/// API routes (require a Firebase ID token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", get(get_profile).put(update_profile))
        .route("/api/profile/birthdate", post(save_birthdate))
        .route("/api/time-remaining", get(time_remaining))
        .route("/api/journal", get(list_journal).post(add_journal_entry))
}

// ─── Profile ─────────────────────────────────────────────────

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Profile>> {
    Ok(Json(state.profiles.get_profile(&user.uid).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BirthdateRequest {
    birthdate: String,
    #[serde(default)]
    birth_time: Option<String>,
}

/// Onboarding: record the user's birthdate.
async fn save_birthdate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(body), _): WithRejection<Json<BirthdateRequest>, AppError>,
) -> Result<Json<Profile>> {
    let profile = state
        .profiles
        .save_birthdate(&user.uid, &body.birthdate, body.birth_time.as_deref())
        .await?;
    Ok(Json(profile))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(update), _): WithRejection<Json<ProfileUpdate>, AppError>,
) -> Result<Json<Profile>> {
    Ok(Json(state.profiles.update_profile(&user.uid, update).await?))
}

async fn time_remaining(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TimeRemaining>> {
    Ok(Json(state.profiles.time_remaining(&user.uid).await?))
}

// ─── Journal ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JournalQuery {
    #[serde(default)]
    period_id: String,
}

async fn list_journal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<JournalQuery>,
) -> Result<Json<Vec<JournalEntry>>> {
    let entries = state
        .store
        .get_journal_entries(&user.uid, &query.period_id)
        .await?;
    Ok(Json(entries))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewEntryRequest {
    #[serde(default)]
    content: String,
    #[serde(default)]
    period_id: String,
    #[serde(default)]
    period_type: PeriodType,
}

async fn add_journal_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(body), _): WithRejection<Json<NewEntryRequest>, AppError>,
) -> Result<(StatusCode, Json<JournalEntry>)> {
    let entry = state
        .store
        .add_journal_entry(
            &user.uid,
            NewJournalEntry::new(body.content).in_period(body.period_id, body.period_type),
        )
        .await?;

    tracing::debug!(
        uid = %user.uid,
        entry_id = %entry.id,
        period_id = %entry.period_id,
        "Journal entry created"
    );
    Ok((StatusCode::CREATED, Json(entry)))
}
