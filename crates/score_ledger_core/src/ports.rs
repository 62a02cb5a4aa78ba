//! crates/score_ledger_core/src/ports.rs
//!
//! Defines the persistence contract the ledger's host must provide.
//! The core never performs I/O itself; adapters in the host implement
//! `KeyValueStore` against whatever local storage is available.

use async_trait::async_trait;
use std::fmt;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Failed to encode or decode a stored record: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Keys
//=========================================================================================

/// The two logical records the ledger persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Roster, in-progress rounds, ended flag, session id and preferences.
    CurrentGame,
    /// The array of saved sessions.
    History,
}

impl StorageKey {
    pub const ALL: [StorageKey; 2] = [StorageKey::CurrentGame, StorageKey::History];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::CurrentGame => "current-game",
            StorageKey::History => "game-history",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored blob, or `None` if nothing was ever saved under `key`.
    async fn load(&self, key: StorageKey) -> PortResult<Option<String>>;

    /// Replaces the blob stored under `key`.
    async fn save(&self, key: StorageKey, blob: &str) -> PortResult<()>;

    /// Deletes the blob stored under `key`. Removing an absent key is not an error.
    async fn remove(&self, key: StorageKey) -> PortResult<()>;
}
