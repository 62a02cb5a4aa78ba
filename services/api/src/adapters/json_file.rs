//! services/api/src/adapters/json_file.rs
//!
//! File-backed implementation of the `KeyValueStore` port. Each key is kept in
//! its own `<key>.json` file under the data directory.

use async_trait::async_trait;
use score_ledger_core::ports::{KeyValueStore, PortError, PortResult, StorageKey};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Stores each record as a JSON file, replacing it atomically on save.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a new `JsonFileStore` rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> PortError {
    PortError::Unexpected(format!("Failed to {} {}: {}", action, path.display(), e))
}

//=========================================================================================
// `KeyValueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn load(&self, key: StorageKey) -> PortResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read", &path, e)),
        }
    }

    async fn save(&self, key: StorageKey, blob: &str) -> PortResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error("create", &self.dir, e))?;

        // Write beside the target and rename over it so a crash never leaves a torn file.
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, blob)
            .await
            .map_err(|e| io_error("write", &tmp_path, e))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| io_error("replace", &path, e))?;
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> PortResult<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_key_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load(StorageKey::History).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_returns_latest_blob() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));

        store.save(StorageKey::CurrentGame, "{\"a\":1}").await.unwrap();
        store.save(StorageKey::CurrentGame, "{\"a\":2}").await.unwrap();

        let blob = store.load(StorageKey::CurrentGame).await.unwrap();
        assert_eq!(blob.as_deref(), Some("{\"a\":2}"));
        assert!(store.dir().join("current-game.json").exists());
        assert!(!store.dir().join("current-game.json.tmp").exists());
        assert!(store.load(StorageKey::History).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save(StorageKey::History, "[]").await.unwrap();
        store.remove(StorageKey::History).await.unwrap();
        store.remove(StorageKey::History).await.unwrap();
        assert!(store.load(StorageKey::History).await.unwrap().is_none());
    }
}
