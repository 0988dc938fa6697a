// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication: ID-token verification and admin user deletion.

use crate::config::Config;
use crate::error::AppError;
use crate::models::VerifiedIdToken;
use anyhow::Context;
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;
const MAX_UID_LEN: usize = 128;

/// ID-token verification error categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is missing/invalid or claims do not match expectations.
    Rejected(String),
    /// Keys could not be fetched; the token was not judged.
    Transient(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Rejected(reason) => write!(f, "token rejected: {reason}"),
            TokenError::Transient(reason) => write!(f, "token verification unavailable: {reason}"),
        }
    }
}

/// Server-side identity provider operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a client-supplied ID token.
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdToken, TokenError>;

    /// Permanently delete the authentication record of a user.
    async fn delete_user(&self, uid: &str) -> Result<(), AppError>;
}

// ─── Token verification ──────────────────────────────────────

#[derive(Clone)]
enum VerifierMode {
    Google {
        jwks_url: String,
    },
    StaticKey {
        kid: String,
        algorithm: Algorithm,
        decoding_key: Arc<DecodingKey>,
    },
}

#[derive(Clone)]
struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier for Firebase-issued ID tokens.
pub struct FirebaseTokenVerifier {
    http_client: reqwest::Client,
    project_id: String,
    expected_issuer: String,
    mode: VerifierMode,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl FirebaseTokenVerifier {
    /// Create a production verifier that fetches and caches Firebase JWKS keys.
    pub fn new(project_id: &str) -> anyhow::Result<Self> {
        let verifier = Self::build(
            project_id,
            VerifierMode::Google {
                jwks_url: FIREBASE_JWKS_URL.to_string(),
            },
        )?;

        tracing::info!(
            project = %verifier.project_id,
            issuer = %verifier.expected_issuer,
            "Initialized Firebase ID-token verifier"
        );

        Ok(verifier)
    }

    /// Create a verifier with a single static key.
    ///
    /// This is intended for deterministic local/integration tests.
    pub fn new_with_static_key(
        project_id: &str,
        kid: impl Into<String>,
        algorithm: Algorithm,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static key kid must not be empty");
        }

        Self::build(
            project_id,
            VerifierMode::StaticKey {
                kid,
                algorithm,
                decoding_key: Arc::new(decoding_key),
            },
        )
    }

    fn build(project_id: &str, mode: VerifierMode) -> anyhow::Result<Self> {
        if project_id.trim().is_empty() {
            anyhow::bail!("Firebase project ID must not be empty");
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building JWKS HTTP client")?;

        Ok(Self {
            http_client,
            project_id: project_id.to_string(),
            expected_issuer: format!("https://securetoken.google.com/{project_id}"),
            mode,
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Verify a Firebase ID token.
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdToken, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Rejected("ID token is empty".to_string()));
        }

        let header = decode_header(token)
            .map_err(|e| TokenError::Rejected(format!("invalid JWT header: {e}")))?;

        let expected_alg = self.expected_algorithm();
        if header.alg != expected_alg {
            return Err(TokenError::Rejected(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| TokenError::Rejected("missing JWT kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(expected_alg);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[self.expected_issuer.as_str()]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<FirebaseIdTokenClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| TokenError::Rejected(format!("JWT validation failed: {e}")))?
            .claims;

        validate_not_in_future("iat", claims.iat)?;
        validate_not_in_future("auth_time", claims.auth_time)?;

        if claims.sub.is_empty() || claims.sub.len() > MAX_UID_LEN {
            return Err(TokenError::Rejected("invalid sub claim".to_string()));
        }

        tracing::debug!(
            uid = %claims.sub,
            email_verified = ?claims.email_verified,
            exp = claims.exp,
            "Firebase ID token verified"
        );

        Ok(VerifiedIdToken {
            uid: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified.unwrap_or(false),
            auth_time: claims.auth_time.unwrap_or_default() as u64,
        })
    }

    fn expected_algorithm(&self) -> Algorithm {
        match &self.mode {
            VerifierMode::Google { .. } => Algorithm::RS256,
            VerifierMode::StaticKey { algorithm, .. } => *algorithm,
        }
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, TokenError> {
        let jwks_url = match &self.mode {
            VerifierMode::StaticKey {
                kid: static_kid,
                decoding_key,
                ..
            } => {
                if kid == static_kid {
                    return Ok(decoding_key.clone());
                }

                return Err(TokenError::Rejected(format!(
                    "unknown JWT kid for static verifier: {kid}"
                )));
            }
            VerifierMode::Google { jwks_url } => jwks_url.as_str(),
        };

        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        // Keys rotate; a miss on a fresh cache forces one refetch.
        for force_refresh in [false, true] {
            self.refresh_jwks(jwks_url, force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(TokenError::Rejected(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, jwks_url: &str, force_refresh: bool) -> Result<(), TokenError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        tracing::debug!(jwks_url = %jwks_url, "Refreshing Firebase JWKS cache");

        let response = self
            .http_client
            .get(jwks_url)
            .send()
            .await
            .map_err(|e| TokenError::Transient(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TokenError::Transient(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| TokenError::Transient(format!("invalid JWKS JSON: {e}")))?;

        let keys_by_kid = usable_rsa_keys(jwks);
        if keys_by_kid.is_empty() {
            return Err(TokenError::Transient(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Firebase JWKS cache refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirebaseIdTokenClaims {
    sub: String,
    exp: usize,
    iat: Option<usize>,
    auth_time: Option<usize>,
    email: Option<String>,
    email_verified: Option<bool>,
}

fn usable_rsa_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    let mut keys_by_kid = HashMap::new();

    for jwk in jwks.keys {
        if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
            continue;
        }
        if jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
            continue;
        }
        if jwk.use_.as_deref().is_some_and(|use_| use_ != "sig") {
            continue;
        }

        match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => {
                keys_by_kid.insert(jwk.kid, Arc::new(key));
            }
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
            }
        }
    }

    keys_by_kid
}

fn validate_not_in_future(claim: &str, value: Option<usize>) -> Result<(), TokenError> {
    let Some(value) = value else {
        return Err(TokenError::Rejected(format!("missing {claim} claim")));
    };

    if value as u64 > now_unix_secs() + CLOCK_SKEW_SECS {
        return Err(TokenError::Rejected(format!(
            "{claim} claim is in the future"
        )));
    }

    Ok(())
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value.split(',').find_map(|directive| {
        directive
            .trim()
            .strip_prefix("max-age=")
            .and_then(|raw| raw.trim_matches('"').parse::<u64>().ok())
    })
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// ─── Admin client ────────────────────────────────────────────

/// Firebase Admin operations backed by a service account.
pub struct FirebaseAdmin {
    verifier: FirebaseTokenVerifier,
    http_client: reqwest::Client,
    base_url: String,
    project_id: String,
    token_generator: Option<gcloud_sdk::GoogleAuthTokenGenerator>,
}

impl FirebaseAdmin {
    /// Create the admin client from configuration.
    ///
    /// In development a missing service account only disables identity
    /// deletion; in production it is a startup error.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let verifier = FirebaseTokenVerifier::new(&config.firebase_project_id)?;

        let token_source = match config.service_account_json() {
            Some(json) => gcloud_sdk::TokenSourceType::Json(json),
            None => gcloud_sdk::TokenSourceType::Default,
        };

        let token_generator = match gcloud_sdk::GoogleAuthTokenGenerator::new(
            token_source,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
        )
        .await
        {
            Ok(generator) => Some(generator),
            Err(e) if !config.is_production() => {
                tracing::warn!(
                    error = %e,
                    "No Firebase admin credentials; identity deletion is disabled"
                );
                None
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed initializing Firebase admin credentials: {e}"
                ))
            }
        };

        Self::with_parts(
            verifier,
            &config.firebase_project_id,
            IDENTITY_TOOLKIT_URL,
            token_generator,
        )
    }

    /// Assemble from parts; `base_url` points at the Identity Toolkit API.
    pub fn with_parts(
        verifier: FirebaseTokenVerifier,
        project_id: &str,
        base_url: &str,
        token_generator: Option<gcloud_sdk::GoogleAuthTokenGenerator>,
    ) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building Identity Toolkit HTTP client")?;

        Ok(Self {
            verifier,
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            token_generator,
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAdmin {
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdToken, TokenError> {
        self.verifier.verify(id_token).await
    }

    async fn delete_user(&self, uid: &str) -> Result<(), AppError> {
        let generator = self.token_generator.as_ref().ok_or_else(|| {
            AppError::IdentityProvider("admin credentials not configured".to_string())
        })?;

        let token = generator
            .create_token()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("access token: {e}")))?;

        let url = format!(
            "{}/projects/{}/accounts:delete",
            self.base_url, self.project_id
        );

        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, token.header_value())
            .json(&serde_json::json!({ "localId": uid }))
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("delete request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::IdentityProvider(format!("HTTP {}: {}", status, body)));
        }

        tracing::info!(uid, "Firebase auth user deleted");
        Ok(())
    }
}
