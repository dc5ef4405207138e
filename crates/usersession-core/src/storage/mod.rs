//! Local key-value persistence for the session record.
//!
//! This module provides the `KeyValueStore` trait and its backends:
//! - `MemoryStore`: process-local map, used in tests and `memory` mode
//! - `FileStore`: one JSON file per key in a data directory
//! - `KeyringStore`: OS keychain entries via keyring
//!
//! Backends guarantee atomic single-key writes and nothing more.

pub mod error;
pub mod file;
pub mod keychain;
pub mod memory;

pub use error::StorageError;
pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

/// String-keyed get/set/remove store.
///
/// Values are opaque strings; serialization is the caller's concern.
pub trait KeyValueStore {
    /// Read the value under `key`, `None` when nothing is stored.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value under `key`. Removing a missing key is a no-op.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}
