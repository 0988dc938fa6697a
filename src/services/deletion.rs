// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account deletion workflow.
//!
//! Deletion runs as an ordered list of steps. Validation and token steps
//! abort with no side effects; a store failure aborts mid-sequence without
//! rolling back earlier steps; an identity-deletion failure is logged and the
//! overall result is still success.

use crate::db::UserDataStore;
use crate::error::AppError;
use crate::services::firebase_auth::IdentityProvider;
use crate::session::SessionManager;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Body of a server-authorized deletion request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

impl DeletionRequest {
    pub fn new(user_id: impl Into<String>, id_token: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            id_token: Some(id_token.into()),
        }
    }

    fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or_default()
    }

    fn id_token(&self) -> &str {
        self.id_token.as_deref().unwrap_or_default()
    }
}

/// One step of the deletion sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStep {
    ValidateRequest,
    VerifyToken,
    DeleteProfile,
    DeleteJournal,
    DeleteIdentity,
}

impl DeletionStep {
    pub const SEQUENCE: [DeletionStep; 5] = [
        DeletionStep::ValidateRequest,
        DeletionStep::VerifyToken,
        DeletionStep::DeleteProfile,
        DeletionStep::DeleteJournal,
        DeletionStep::DeleteIdentity,
    ];

    /// Whether a failure of this step aborts the workflow.
    pub fn is_fatal(self) -> bool {
        !matches!(self, DeletionStep::DeleteIdentity)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeletionStep::ValidateRequest => "validate_request",
            DeletionStep::VerifyToken => "verify_token",
            DeletionStep::DeleteProfile => "delete_profile",
            DeletionStep::DeleteJournal => "delete_journal",
            DeletionStep::DeleteIdentity => "delete_identity",
        }
    }
}

impl fmt::Display for DeletionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed {
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    Failed {
        error: String,
    },
}

/// Outcome of every step that ran, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub steps: Vec<(DeletionStep, StepOutcome)>,
}

impl DeletionReport {
    fn record(&mut self, step: DeletionStep, outcome: StepOutcome) {
        self.steps.push((step, outcome));
    }

    pub fn outcome(&self, step: DeletionStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| outcome)
    }

    /// Steps that failed without aborting the workflow.
    pub fn warnings(&self) -> impl Iterator<Item = DeletionStep> + '_ {
        self.steps
            .iter()
            .filter(|(_, outcome)| matches!(outcome, StepOutcome::Failed { .. }))
            .map(|(step, _)| *step)
    }
}

/// Fatal deletion failures.
#[derive(Debug, thiserror::Error)]
pub enum DeletionError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid authentication token: {0}")]
    InvalidToken(String),

    #[error("{step} failed: {message}")]
    StepFailed {
        step: DeletionStep,
        message: String,
        report: DeletionReport,
    },
}

impl From<DeletionError> for AppError {
    fn from(err: DeletionError) -> Self {
        match err {
            DeletionError::MissingFields => {
                AppError::BadRequest("Missing required fields".to_string())
            }
            DeletionError::InvalidToken(_) => AppError::InvalidToken,
            DeletionError::StepFailed { step, message, .. } => {
                AppError::Database(format!("{step}: {message}"))
            }
        }
    }
}

/// Server-authorized account deletion.
#[derive(Clone)]
pub struct AccountDeletion {
    store: Arc<dyn UserDataStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl AccountDeletion {
    pub fn new(store: Arc<dyn UserDataStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// Run every step in order, stopping at the first fatal failure.
    pub async fn run(&self, request: &DeletionRequest) -> Result<DeletionReport, DeletionError> {
        let mut report = DeletionReport::default();

        for step in DeletionStep::SEQUENCE {
            match self.execute(step, request).await {
                Ok(detail) => {
                    tracing::debug!(step = %step, detail = ?detail, "Deletion step completed");
                    report.record(step, StepOutcome::Completed { detail });
                }
                Err(message) if step.is_fatal() => {
                    tracing::warn!(
                        step = %step,
                        user_id = request.user_id(),
                        error = %message,
                        "Account deletion aborted"
                    );
                    report.record(
                        step,
                        StepOutcome::Failed {
                            error: message.clone(),
                        },
                    );
                    return Err(match step {
                        DeletionStep::ValidateRequest => DeletionError::MissingFields,
                        DeletionStep::VerifyToken => DeletionError::InvalidToken(message),
                        _ => DeletionError::StepFailed {
                            step,
                            message,
                            report,
                        },
                    });
                }
                Err(message) => {
                    tracing::error!(
                        step = %step,
                        user_id = request.user_id(),
                        error = %message,
                        "Account deletion step failed; continuing"
                    );
                    report.record(step, StepOutcome::Failed { error: message });
                }
            }
        }

        tracing::info!(
            user_id = request.user_id(),
            warnings = report.warnings().count(),
            "Account deleted"
        );
        Ok(report)
    }

    async fn execute(
        &self,
        step: DeletionStep,
        request: &DeletionRequest,
    ) -> Result<Option<String>, String> {
        let user_id = request.user_id();

        match step {
            DeletionStep::ValidateRequest => {
                if user_id.is_empty() || request.id_token().is_empty() {
                    return Err("userId and idToken are required".to_string());
                }
                Ok(None)
            }
            DeletionStep::VerifyToken => {
                let verified = self
                    .identity
                    .verify_id_token(request.id_token())
                    .await
                    .map_err(|e| e.to_string())?;
                if verified.uid != user_id {
                    return Err("token subject does not match userId".to_string());
                }
                Ok(None)
            }
            DeletionStep::DeleteProfile => {
                self.store
                    .delete_profile(user_id)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(None)
            }
            DeletionStep::DeleteJournal => {
                let count = self
                    .store
                    .delete_all_journal_entries(user_id)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Some(format!("{count} entries")))
            }
            DeletionStep::DeleteIdentity => {
                self.identity
                    .delete_user(user_id)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(None)
            }
        }
    }
}

/// Client-only deletion: remove the profile document, then sign out.
///
/// Journal entries and the identity record are left in place.
pub async fn delete_account_client_fallback(
    store: &dyn UserDataStore,
    session: &SessionManager,
    user_id: &str,
) -> Result<(), AppError> {
    store.delete_profile(user_id).await?;
    tracing::warn!(
        user_id,
        "Client-side account deletion: journal entries and identity remain"
    );
    session.sign_out().await?;
    Ok(())
}
