// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-authorized account deletion.

use crate::error::{AppError, Result};
use crate::services::DeletionRequest;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account deletion route. The ID token travels in the body, so no auth
/// middleware is applied.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/user/delete", post(delete_user))
}

/// Response for account deletion.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteAccountResponse {
    pub success: bool,
}

/// Delete the caller's profile, journal and identity.
///
/// Identity deletion failures are logged but do not fail the request.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(request), _): WithRejection<Json<DeletionRequest>, AppError>,
) -> Result<Json<DeleteAccountResponse>> {
    tracing::info!(
        user_id = request.user_id.as_deref().unwrap_or_default(),
        "Account deletion requested"
    );

    state.deletion.run(&request).await?;

    Ok(Json(DeleteAccountResponse { success: true }))
}
