use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::api::{AuthResponse, AuthService};
use crate::storage::KeyValueStore;

/// Storage key holding the account record. One record per device profile.
pub const ACCOUNT_INFO: &str = "account_info";

/// Field names that map onto typed fields and never appear in `extra`.
/// `code` is the response envelope and is not part of the record.
const RESERVED_FIELDS: [&str; 3] = ["token", "username", "code"];

/// The persisted identity of the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Profile fields supplied by the authentication service.
    /// Never holds a `RESERVED_FIELDS` key, so the flattened JSON has no duplicates.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl SessionRecord {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: None,
            extra: Map::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn is_reserved_field(key: &str) -> bool {
        RESERVED_FIELDS.contains(&key)
    }

    /// Profile fields beyond `token` and `username`
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn extra_field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Set a profile field, returning the previous value.
    ///
    /// `token`, `username` and `code` are rejected; use the typed fields.
    pub fn insert_extra(&mut self, key: impl Into<String>, value: Value) -> Result<Option<Value>> {
        let key = key.into();
        if Self::is_reserved_field(&key) {
            bail!("'{}' is a reserved session field", key);
        }
        Ok(self.extra.insert(key, value))
    }

    pub fn remove_extra(&mut self, key: &str) -> Option<Value> {
        self.extra.remove(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Shallow-merge an authentication response over the stored record.
///
/// Fields present in `response` win; everything else in `stored` is kept.
/// A JSON `null` counts as absent and never erases a stored field. Reserved
/// names smuggled into `response.extra` are ignored.
pub fn merge(stored: Option<SessionRecord>, response: &AuthResponse) -> SessionRecord {
    let mut record = stored.unwrap_or_default();
    if let Some(ref token) = response.token {
        record.token = token.clone();
    }
    if let Some(ref username) = response.username {
        record.username = Some(username.clone());
    }
    for (key, value) in &response.extra {
        if value.is_null() || SessionRecord::is_reserved_field(key) {
            continue;
        }
        record.extra.insert(key.clone(), value.clone());
    }
    record
}

/// Sole owner of the `ACCOUNT_INFO` key.
pub struct SessionStore<S> {
    storage: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load the stored record, `None` when signed out
    pub fn get(&self) -> Result<Option<SessionRecord>> {
        let raw = self
            .storage
            .get_item(ACCOUNT_INFO)
            .context("Failed to read session record")?;
        match raw {
            Some(raw) => {
                let record = serde_json::from_str(&raw).context("Failed to parse session record")?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Replace the stored record. No validation is applied.
    pub fn set(&self, record: &SessionRecord) -> Result<()> {
        let contents = serde_json::to_string(record)?;
        self.storage
            .set_item(ACCOUNT_INFO, &contents)
            .context("Failed to save session record")?;
        debug!(has_username = record.username.is_some(), "Session record saved");
        Ok(())
    }

    /// Delete the stored record. Safe to call when nothing is stored.
    pub fn remove(&self) -> Result<()> {
        self.storage
            .remove_item(ACCOUNT_INFO)
            .context("Failed to remove session record")?;
        debug!("Session record removed");
        Ok(())
    }

    /// Ask the authentication service for fresh identity data.
    ///
    /// On code 200 the response is merged into the stored record. Any other
    /// code leaves storage untouched. The raw response is returned either way.
    pub async fn refresh<A: AuthService>(&self, auth: &A) -> Result<AuthResponse> {
        let response = auth.auth().await?;

        if response.is_success() {
            let record = merge(self.get()?, &response);
            self.set(&record)?;
            info!("Session refreshed");
        } else {
            warn!(code = response.code, "Session refresh rejected, keeping stored record");
        }

        Ok(response)
    }

    /// Bearer token of the stored record, if any
    pub fn token(&self) -> Result<Option<String>> {
        Ok(self.get()?.map(|record| record.token))
    }

    pub fn state(&self) -> Result<SessionState> {
        Ok(if self.get()?.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        })
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.state()? == SessionState::Authenticated)
    }
}
