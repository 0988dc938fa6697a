// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal analysis endpoint.

use crate::error::{AppError, Result};
use crate::models::{AnalysisEntry, AnalysisResult};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/analyze", post(analyze))
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    entries: Vec<AnalysisEntry>,
}

/// Every failure, including an unreadable body, is a 500 `{error}`.
async fn analyze(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>> {
    let Json(body) = body.map_err(|rejection| AppError::Analysis(rejection.body_text()))?;
    let result = state.analysis.analyze(&body.entries).await?;
    Ok(Json(result))
}
