//! Session management for the signed-in user.
//!
//! This module provides:
//! - `SessionRecord`: token plus optional profile, persisted as JSON
//! - `SessionStore`: get/set/remove over a `KeyValueStore`, and `refresh`
//!   against the authentication service
//!
//! The record lives under the single `ACCOUNT_INFO` key and persists until
//! it is removed.

pub mod session;

pub use session::{merge, SessionRecord, SessionState, SessionStore, ACCOUNT_INFO};
