// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod analysis;
pub mod identity;
pub mod journal;
pub mod profile;

pub use analysis::{AnalysisEntry, AnalysisResult};
pub use identity::{CachedUser, UserIdentity, VerifiedIdToken};
pub use journal::{JournalEntry, NewJournalEntry};
pub use profile::Profile;
