// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile onboarding and updates.

use crate::db::UserDataStore;
use crate::error::AppError;
use crate::models::Profile;
use crate::time_utils::{
    calculate_time_remaining_at, parse_birth_instant, LifeExpectancyPolicy, TimeRemaining,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 40))]
    pub birthdate: Option<String>,
    #[validate(length(max = 5))]
    pub birth_time: Option<String>,
    #[validate(range(min = 0.0, max = 150.0))]
    pub life_expectancy: Option<f64>,
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn UserDataStore>,
    policy: LifeExpectancyPolicy,
}

impl ProfileService {
    pub fn new(store: Arc<dyn UserDataStore>, policy: LifeExpectancyPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Profile, AppError> {
        self.store
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("profile for {user_id}")))
    }

    /// Onboarding: record the birthdate (and optional birth time).
    ///
    /// `createdAt` is set on first save and kept afterwards.
    pub async fn save_birthdate(
        &self,
        user_id: &str,
        birthdate: &str,
        birth_time: Option<&str>,
    ) -> Result<Profile, AppError> {
        let birth_time = birth_time.map(str::trim).filter(|t| !t.is_empty());
        parse_birth_instant(birthdate, birth_time)?;

        let mut profile = self.store.get_profile(user_id).await?.unwrap_or_default();
        profile.birthdate = Some(birthdate.trim().to_string());
        profile.birth_time = birth_time.map(str::to_string);
        profile.created_at.get_or_insert_with(Utc::now);

        self.store.upsert_profile(user_id, &profile).await?;
        tracing::info!(user_id, has_birth_time = birth_time.is_some(), "Birthdate saved");
        Ok(profile)
    }

    /// Merge the provided fields into the profile and stamp `updatedAt`.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Profile, AppError> {
        update
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let mut profile = self.store.get_profile(user_id).await?.unwrap_or_default();

        if let Some(birthdate) = update.birthdate {
            profile.birthdate = Some(birthdate);
        }
        if let Some(birth_time) = update.birth_time {
            profile.birth_time = Some(birth_time).filter(|t| !t.is_empty());
        }
        if let Some(years) = update.life_expectancy {
            profile.life_expectancy = Some(years);
        }

        if let Some(birthdate) = profile.birthdate.as_deref() {
            parse_birth_instant(birthdate, profile.birth_time.as_deref())?;
        }

        profile.updated_at = Some(Utc::now());
        self.store.upsert_profile(user_id, &profile).await?;

        tracing::info!(user_id, "Profile updated");
        Ok(profile)
    }

    /// Time remaining for a user, from their stored profile.
    pub async fn time_remaining(&self, user_id: &str) -> Result<TimeRemaining, AppError> {
        let profile = self.get_profile(user_id).await?;
        let birthdate = profile
            .birthdate
            .as_deref()
            .filter(|_| profile.has_birthdate())
            .ok_or_else(|| AppError::NotFound("birthdate not set".to_string()))?;

        Ok(calculate_time_remaining_at(
            Utc::now(),
            birthdate,
            profile.birth_time.as_deref(),
            profile.life_expectancy,
            &self.policy,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryDb;

    fn service() -> (Arc<MemoryDb>, ProfileService) {
        let db = Arc::new(MemoryDb::new());
        let service = ProfileService::new(db.clone(), LifeExpectancyPolicy::default());
        (db, service)
    }

    #[tokio::test]
    async fn save_birthdate_keeps_original_created_at() {
        let (_db, service) = service();

        let first = service
            .save_birthdate("u1", "1990-05-15", Some("08:30"))
            .await
            .unwrap();
        let second = service
            .save_birthdate("u1", "1990-05-16", None)
            .await
            .unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.birthdate.as_deref(), Some("1990-05-16"));
        assert!(second.birth_time.is_none());
    }

    #[tokio::test]
    async fn save_birthdate_rejects_garbage() {
        let (db, service) = service();

        let err = service.save_birthdate("u1", "yesterday", None).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(db.get_profile("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_rejects_out_of_range_life_expectancy() {
        let (_db, service) = service();

        let update = ProfileUpdate {
            life_expectancy: Some(151.0),
            ..Default::default()
        };
        let err = service.update_profile("u1", update).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn update_merges_and_stamps() {
        let (_db, service) = service();
        service
            .save_birthdate("u1", "1990-05-15", Some("08:30"))
            .await
            .unwrap();

        let updated = service
            .update_profile(
                "u1",
                ProfileUpdate {
                    life_expectancy: Some(90.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.birthdate.as_deref(), Some("1990-05-15"));
        assert_eq!(updated.birth_time.as_deref(), Some("08:30"));
        assert_eq!(updated.life_expectancy, Some(90.0));
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn time_remaining_requires_birthdate() {
        let (db, service) = service();
        assert!(matches!(
            service.time_remaining("u1").await,
            Err(AppError::NotFound(_))
        ));

        db.upsert_profile("u1", &Profile::default()).await.unwrap();
        assert!(matches!(
            service.time_remaining("u1").await,
            Err(AppError::NotFound(_))
        ));

        service.save_birthdate("u1", "2000-01-01", None).await.unwrap();
        let remaining = service.time_remaining("u1").await.unwrap();
        assert!(remaining.years > 0);
        assert!(remaining.days >= remaining.weeks);
    }
}
