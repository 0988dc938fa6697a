// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod analysis;
pub mod deletion;
pub mod firebase_auth;
pub mod gemini;
pub mod profile;

pub use analysis::AnalysisService;
pub use deletion::{AccountDeletion, DeletionReport, DeletionRequest, DeletionStep, StepOutcome};
pub use firebase_auth::{FirebaseAdmin, FirebaseTokenVerifier, IdentityProvider, TokenError};
pub use gemini::{GeminiClient, TextGenerator};
pub use profile::{ProfileService, ProfileUpdate};
