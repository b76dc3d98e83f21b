//! Browser `localStorage` backend for WebAssembly.

use super::{BoxFuture, Storage, StorageError, StorageResult, sanitize_id};
use crate::session::SessionState;

/// Prefix keeping session keys apart from other data on the same origin.
const KEY_PREFIX: &str = "mindink:session:";

/// Session storage on top of the browser's `localStorage`.
///
/// Not Send/Sync: browser handles only live on the main thread.
pub struct LocalStorage {
    store: web_sys::Storage,
}

impl LocalStorage {
    /// Open the window's `localStorage`.
    pub fn new() -> StorageResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Other("No window object".to_string()))?;
        let store = window
            .local_storage()
            .map_err(|e| StorageError::Other(format!("localStorage error: {:?}", e)))?
            .ok_or_else(|| StorageError::Other("localStorage not available".to_string()))?;
        Ok(Self { store })
    }

    fn key(id: &str) -> String {
        format!("{}{}", KEY_PREFIX, sanitize_id(id))
    }

    fn get(&self, id: &str) -> StorageResult<Option<String>> {
        self.store
            .get_item(&Self::key(id))
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {:?}", id, e)))
    }
}

impl Storage for LocalStorage {
    fn save(&self, id: &str, session: &SessionState) -> BoxFuture<'_, StorageResult<()>> {
        let key = Self::key(id);
        let json = session.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            self.store
                .set_item(&key, &json)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {:?}", key, e)))
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SessionState>> {
        let id = id.to_string();
        Box::pin(async move {
            let json = self.get(&id)?.ok_or_else(|| StorageError::NotFound(id.clone()))?;
            SessionState::from_json(&json).map_err(|e| {
                StorageError::Serialization(format!("Failed to parse {}: {}", id, e))
            })
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = Self::key(id);
        Box::pin(async move {
            self.store
                .remove_item(&key)
                .map_err(|e| StorageError::Io(format!("Failed to delete {}: {:?}", key, e)))
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let length = self
                .store
                .length()
                .map_err(|e| StorageError::Io(format!("Failed to list keys: {:?}", e)))?;
            let mut ids = Vec::new();
            for index in 0..length {
                let key = self
                    .store
                    .key(index)
                    .map_err(|e| StorageError::Io(format!("Failed to list keys: {:?}", e)))?;
                if let Some(id) = key.as_deref().and_then(|k| k.strip_prefix(KEY_PREFIX)) {
                    ids.push(id.to_string());
                }
            }
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.get(&id)?.is_some()) })
    }
}
