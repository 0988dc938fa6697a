// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current period identifiers.

use crate::error::{AppError, Result};
use crate::time_utils::{time_period_id_at, PeriodType};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/periods/current", get(current_period))
}

#[derive(Deserialize)]
struct PeriodQuery {
    #[serde(rename = "type")]
    period_type: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CurrentPeriodResponse {
    pub period_id: String,
    pub period_type: PeriodType,
}

async fn current_period(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<CurrentPeriodResponse>> {
    let period_type = match query.period_type.as_deref() {
        None | Some("") => PeriodType::default(),
        Some(raw) => raw.parse().map_err(AppError::BadRequest)?,
    };

    Ok(Json(CurrentPeriodResponse {
        period_id: time_period_id_at(
            &chrono::Utc::now(),
            period_type,
            state.config.day_granularity,
        ),
        period_type,
    }))
}
