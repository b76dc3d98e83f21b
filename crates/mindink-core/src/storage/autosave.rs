//! Auto-save functionality for session persistence.
//!
//! Provides periodic saving of the editor session to prevent data loss.

use crate::session::SessionState;
use crate::storage::{Storage, StorageResult};
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Key for the most recently saved session.
pub const LAST_SESSION_KEY: &str = "__last_session__";

/// Manages automatic session persistence.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    /// Whether the session has unsaved changes.
    dirty: bool,
    /// Id the session is saved under, besides the last-session key.
    session_id: Option<String>,
}

impl<S: Storage> AutoSaveManager<S> {
    /// Create a new auto-save manager with the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
            session_id: None,
        }
    }

    /// Set the auto-save interval.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark the session as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_session_id(&mut self, id: Option<String>) {
        self.session_id = id;
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Check if enough time has passed for an auto-save.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }

        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save the session if needed (dirty + interval elapsed).
    /// Returns true if a save was performed.
    pub async fn maybe_save(&mut self, session: &SessionState) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }

        self.save(session).await?;
        Ok(true)
    }

    /// Save the session immediately.
    pub async fn save(&mut self, session: &SessionState) -> StorageResult<()> {
        if let Some(id) = &self.session_id {
            self.storage.save(id, session).await?;
        }
        // Always kept for auto-restore on the next start
        self.storage.save(LAST_SESSION_KEY, session).await?;

        self.last_save = Some(Instant::now());
        self.dirty = false;
        log::debug!("Session saved ({} history entries)", session.history.len());

        Ok(())
    }

    /// Load a session by ID and make it the current one.
    pub async fn load(&mut self, id: &str) -> StorageResult<SessionState> {
        let session = self.storage.load(id).await?;
        self.session_id = Some(id.to_string());
        self.dirty = false;
        self.last_save = Some(Instant::now());
        Ok(session)
    }

    /// Try to load the most recently saved session.
    /// Returns None if there is none or it cannot be read.
    pub async fn load_last(&mut self) -> Option<SessionState> {
        match self.storage.load(LAST_SESSION_KEY).await {
            Ok(session) => {
                self.dirty = false;
                self.last_save = Some(Instant::now());
                Some(session)
            }
            Err(e) => {
                log::debug!("No last session to restore: {}", e);
                None
            }
        }
    }

    /// Delete a session by ID.
    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        self.storage.delete(id).await
    }

    /// List all saved session IDs.
    pub async fn list_sessions(&self) -> StorageResult<Vec<String>> {
        let mut sessions = self.storage.list().await?;
        sessions.retain(|id| id != LAST_SESSION_KEY);
        sessions.sort();
        Ok(sessions)
    }

    pub async fn exists(&self, id: &str) -> StorageResult<bool> {
        self.storage.exists(id).await
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

/// Create a platform-appropriate storage backend.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_storage() -> StorageResult<Arc<crate::storage::FileStorage>> {
    Ok(Arc::new(crate::storage::FileStorage::default_location()?))
}

#[cfg(target_arch = "wasm32")]
pub fn create_default_storage() -> StorageResult<Arc<crate::storage::LocalStorage>> {
    Ok(Arc::new(crate::storage::LocalStorage::new()?))
}

/// Convenience type alias for platform-specific storage.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformStorage = crate::storage::FileStorage;

#[cfg(target_arch = "wasm32")]
pub type PlatformStorage = crate::storage::LocalStorage;

/// Type alias for the auto-save manager with platform-specific storage.
pub type PlatformAutoSaveManager = AutoSaveManager<PlatformStorage>;

/// Convenience function to create an auto-save manager with default storage.
pub fn create_autosave_manager() -> StorageResult<PlatformAutoSaveManager> {
    let storage = create_default_storage()?;
    Ok(AutoSaveManager::new(storage))
}
