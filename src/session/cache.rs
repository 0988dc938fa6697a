// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity snapshot caches.

use super::{SessionError, SnapshotCache};
use crate::models::CachedUser;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Default snapshot file name.
pub const SNAPSHOT_FILE: &str = "tminus_user.json";

/// Snapshot persisted as a JSON file.
pub struct FileSnapshotCache {
    path: PathBuf,
}

impl FileSnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache at `dir/tminus_user.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SNAPSHOT_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotCache for FileSnapshotCache {
    async fn load(&self) -> Result<Option<CachedUser>, SessionError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionError::Cache(e.to_string())),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| SessionError::Cache(format!("corrupt snapshot: {e}")))
    }

    async fn store(&self, user: &CachedUser) -> Result<(), SessionError> {
        let raw = serde_json::to_vec(user).map_err(|e| SessionError::Cache(e.to_string()))?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| SessionError::Cache(e.to_string()))
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Cache(e.to_string())),
        }
    }
}

/// Process-local snapshot.
#[derive(Default)]
pub struct MemorySnapshotCache {
    slot: Mutex<Option<CachedUser>>,
}

impl MemorySnapshotCache {
    pub fn with_user(user: CachedUser) -> Self {
        Self {
            slot: Mutex::new(Some(user)),
        }
    }

    pub fn current(&self) -> Option<CachedUser> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn with_slot<T>(
        &self,
        f: impl FnOnce(&mut Option<CachedUser>) -> T,
    ) -> Result<T, SessionError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| SessionError::Cache("snapshot lock poisoned".to_string()))?;
        Ok(f(&mut slot))
    }
}

#[async_trait]
impl SnapshotCache for MemorySnapshotCache {
    async fn load(&self) -> Result<Option<CachedUser>, SessionError> {
        self.with_slot(|slot| slot.clone())
    }

    async fn store(&self, user: &CachedUser) -> Result<(), SessionError> {
        self.with_slot(|slot| *slot = Some(user.clone()))
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.with_slot(|slot| *slot = None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> CachedUser {
        CachedUser {
            uid: "u1".to_string(),
            email: Some("ada@example.com".to_string()),
            display_name: Some("Ada".to_string()),
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn file_cache_round_trips_and_clears() {
        let dir = std::env::temp_dir().join(format!("tminus-cache-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let cache = FileSnapshotCache::in_dir(&dir);

        assert!(cache.load().await.unwrap().is_none());

        cache.store(&snapshot()).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), Some(snapshot()));

        cache.clear().await.unwrap();
        assert!(cache.load().await.unwrap().is_none());
        // Clearing twice is fine.
        cache.clear().await.unwrap();

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn corrupt_file_is_a_cache_error() {
        let path = std::env::temp_dir().join(format!("tminus-corrupt-{}.json", std::process::id()));
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let cache = FileSnapshotCache::new(&path);
        assert!(matches!(cache.load().await, Err(SessionError::Cache(_))));

        tokio::fs::remove_file(&path).await.ok();
    }
}
