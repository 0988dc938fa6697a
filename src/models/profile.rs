// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Profile document model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Per-user profile stored at `users/{uid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    /// Calendar date string, set during onboarding
    #[serde(default)]
    pub birthdate: Option<String>,
    /// Optional `HH:MM`
    #[serde(default)]
    pub birth_time: Option<String>,
    /// Per-user override of the default life expectancy (years)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_expectancy: Option<f64>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Whether onboarding has recorded a birthdate.
    pub fn has_birthdate(&self) -> bool {
        self.birthdate.as_deref().is_some_and(|b| !b.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_camel_case() {
        let profile = Profile {
            birthdate: Some("1990-05-15".to_string()),
            birth_time: None,
            life_expectancy: Some(80.0),
            ..Profile::default()
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["birthdate"], "1990-05-15");
        assert!(json["birthTime"].is_null());
        assert_eq!(json["lifeExpectancy"], 80.0);
    }

    #[test]
    fn blank_birthdate_counts_as_missing() {
        let mut profile = Profile::default();
        assert!(!profile.has_birthdate());

        profile.birthdate = Some("  ".to_string());
        assert!(!profile.has_birthdate());

        profile.birthdate = Some("1990-05-15".to_string());
        assert!(profile.has_birthdate());
    }
}
