//! Persistent key-value storage for session data.
//!
//! This module provides:
//! - `KeyValueStore`: the synchronous string-keyed storage seam
//! - `FileStore`: a JSON file in the cache directory
//! - `KeyringStore`: OS-level storage via keyring
//! - `MemoryStore`: an in-process map for tests and throwaway sessions

pub mod file;
pub mod keychain;
pub mod memory;

use thiserror::Error;

pub use self::file::FileStore;
pub use self::keychain::KeyringStore;
pub use self::memory::MemoryStore;

/// Storage key for the bearer credential.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the user id.
pub const USER_ID_KEY: &str = "userID";
/// Storage key for the username.
pub const USERNAME_KEY: &str = "username";

/// All keys written by a login, in write order.
pub const SESSION_KEYS: [&str; 3] = [TOKEN_KEY, USER_ID_KEY, USERNAME_KEY];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode storage file: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Durable string-keyed storage.
///
/// Reads never fail: an unreadable entry is reported as absent.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Write several entries. Stores that can write them together override this.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}
