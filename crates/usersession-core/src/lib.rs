//! usersession core library.
//!
//! Persists the signed-in user's session record (token plus optional
//! profile) in a local key-value store and refreshes it against the
//! authentication service.

pub mod api;
pub mod auth;
pub mod config;
pub mod storage;

pub use api::{ApiClient, ApiError, AuthResponse, AuthService};
pub use auth::{SessionRecord, SessionState, SessionStore, ACCOUNT_INFO};
pub use config::{Config, StorageBackend};
pub use storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore, StorageError};
