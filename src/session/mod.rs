// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client session: observes the identity provider, keeps a cached identity
//! snapshot and decides where to go after sign-in.
//!
//! State is published on a [`tokio::sync::watch`] channel. `start()` seeds
//! it from the snapshot cache and begins listening; if the provider has not
//! reported within the settle timeout, loading clears and the session runs
//! on the cached snapshot (or as signed out, without one) until the provider
//! says otherwise.

pub mod cache;

pub use cache::{FileSnapshotCache, MemorySnapshotCache};

use crate::config::Config;
use crate::db::UserDataStore;
use crate::error::AppError;
use crate::models::{CachedUser, UserIdentity};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Where the client should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Onboarding,
    Dashboard,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Onboarding => "/onboarding",
            Route::Dashboard => "/dashboard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// Snapshot of the session published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub status: AuthStatus,
    pub user: Option<UserIdentity>,
    pub loading: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("identity provider error: {0}")]
    Provider(String),

    #[error("snapshot cache error: {0}")]
    Cache(String),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Provider(msg) => AppError::IdentityProvider(msg),
            SessionError::Cache(msg) => AppError::Internal(anyhow::anyhow!(msg)),
            SessionError::Store(e) => e,
        }
    }
}

/// Client-side identity provider.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Sign-in state changes; `None` means no user is signed in.
    fn auth_state_changes(&self) -> BoxStream<'static, Option<UserIdentity>>;

    /// Interactive (popup) sign-in with Google.
    async fn sign_in_with_google(&self) -> Result<UserIdentity, SessionError>;

    async fn sign_out(&self) -> Result<(), SessionError>;
}

/// Persistence for the identity snapshot between loads.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    async fn load(&self) -> Result<Option<CachedUser>, SessionError>;
    async fn store(&self, user: &CachedUser) -> Result<(), SessionError>;
    async fn clear(&self) -> Result<(), SessionError>;
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Explicitly constructed session context with a start/stop lifecycle.
pub struct SessionManager {
    auth: Arc<dyn AuthClient>,
    store: Arc<dyn UserDataStore>,
    cache: Arc<dyn SnapshotCache>,
    navigator: Arc<dyn Navigator>,
    settle_timeout: Duration,
    state: Arc<watch::Sender<SessionState>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(
        auth: Arc<dyn AuthClient>,
        store: Arc<dyn UserDataStore>,
        cache: Arc<dyn SnapshotCache>,
        navigator: Arc<dyn Navigator>,
        settle_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            auth,
            store,
            cache,
            navigator,
            settle_timeout,
            state: Arc::new(state),
            listener: Mutex::new(None),
        }
    }

    /// Session using the configured settle timeout.
    pub fn from_config(
        auth: Arc<dyn AuthClient>,
        store: Arc<dyn UserDataStore>,
        cache: Arc<dyn SnapshotCache>,
        navigator: Arc<dyn Navigator>,
        config: &Config,
    ) -> Self {
        Self::new(auth, store, cache, navigator, config.auth_settle_timeout)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Begin observing the provider. Calling `start()` twice restarts the
    /// listener.
    pub async fn start(&self) {
        let cached = match self.cache.load().await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable identity snapshot");
                None
            }
        };

        self.state.send_replace(SessionState {
            status: AuthStatus::Authenticating,
            user: cached.map(UserIdentity::from),
            loading: true,
        });

        let task = tokio::spawn(listen(
            self.auth.auth_state_changes(),
            self.cache.clone(),
            self.state.clone(),
            self.settle_timeout,
        ));

        if let Ok(mut listener) = self.listener.lock() {
            if let Some(previous) = listener.replace(task) {
                previous.abort();
            }
        }
        tracing::debug!(settle_timeout_ms = self.settle_timeout.as_millis() as u64, "Session started");
    }

    /// Stop observing the provider. The last published state is kept.
    pub fn stop(&self) {
        if let Some(task) = self.listener.lock().ok().and_then(|mut l| l.take()) {
            task.abort();
            tracing::debug!("Session stopped");
        }
    }

    /// Interactive sign-in, then route by onboarding status.
    pub async fn sign_in_with_google(&self) -> Result<UserIdentity, SessionError> {
        let user = self.auth.sign_in_with_google().await?;

        let profile = self.store.get_profile(&user.uid).await?;
        let route = if profile.is_some_and(|p| p.has_birthdate()) {
            Route::Dashboard
        } else {
            Route::Onboarding
        };

        tracing::info!(uid = %user.uid, route = route.path(), "Signed in");
        self.navigator.navigate(route);
        Ok(user)
    }

    pub async fn sign_out(&self) -> Result<(), SessionError> {
        self.auth.sign_out().await?;
        self.navigator.navigate(Route::Landing);
        Ok(())
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn listen(
    mut changes: BoxStream<'static, Option<UserIdentity>>,
    cache: Arc<dyn SnapshotCache>,
    state: Arc<watch::Sender<SessionState>>,
    settle_timeout: Duration,
) {
    let settle = tokio::time::sleep(settle_timeout);
    tokio::pin!(settle);
    let mut settled = false;

    loop {
        tokio::select! {
            _ = &mut settle, if !settled => {
                settled = true;
                state.send_modify(|s| {
                    s.loading = false;
                    if s.status == AuthStatus::Authenticating {
                        s.status = if s.user.is_some() {
                            AuthStatus::Authenticated
                        } else {
                            AuthStatus::Unauthenticated
                        };
                    }
                    tracing::info!(cached_user = s.user.is_some(), "Auth settle timeout reached");
                });
            }
            change = changes.next() => {
                let Some(change) = change else {
                    tracing::debug!("Auth state stream ended");
                    break;
                };
                settled = true;
                apply_change(change, cache.as_ref(), &state).await;
            }
        }
    }
}

async fn apply_change(
    change: Option<UserIdentity>,
    cache: &dyn SnapshotCache,
    state: &watch::Sender<SessionState>,
) {
    let next = match change {
        Some(user) => {
            tracing::debug!(uid = %user.uid, "Auth state changed: signed in");
            if let Err(e) = cache.store(&CachedUser::from(&user)).await {
                tracing::error!(error = %e, "Failed to cache identity snapshot");
            }
            SessionState {
                status: AuthStatus::Authenticated,
                user: Some(user),
                loading: false,
            }
        }
        None => {
            tracing::debug!("Auth state changed: signed out");
            if let Err(e) = cache.clear().await {
                tracing::error!(error = %e, "Failed to clear identity snapshot");
            }
            SessionState::default()
        }
    };

    state.send_replace(next);
}
