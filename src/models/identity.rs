// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Identity models: the provider's user record, its cached snapshot, and
//! verified ID-token claims.

use serde::{Deserialize, Serialize};

/// A signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

/// Minimal identity snapshot kept between loads for fast rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl From<&UserIdentity> for CachedUser {
    fn from(user: &UserIdentity) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            photo_url: user.photo_url.clone(),
        }
    }
}

impl From<CachedUser> for UserIdentity {
    fn from(cached: CachedUser) -> Self {
        Self {
            uid: cached.uid,
            email: cached.email,
            display_name: cached.display_name,
            photo_url: cached.photo_url,
            email_verified: false,
        }
    }
}

/// Claims extracted from a verified Firebase ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdToken {
    /// Firebase user ID (`sub`)
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    /// Unix seconds of the original sign-in
    pub auth_time: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_snapshot_uses_provider_field_names() {
        let user = UserIdentity {
            uid: "abc".to_string(),
            email: Some("a@example.com".to_string()),
            display_name: Some("Ada".to_string()),
            photo_url: Some("https://example.com/a.png".to_string()),
            email_verified: true,
        };

        let json = serde_json::to_value(CachedUser::from(&user)).unwrap();
        assert_eq!(json["uid"], "abc");
        assert_eq!(json["displayName"], "Ada");
        assert_eq!(json["photoURL"], "https://example.com/a.png");
        assert!(json.get("emailVerified").is_none());
    }
}
