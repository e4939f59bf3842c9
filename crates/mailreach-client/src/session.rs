//! Persisted session tokens
//!
//! Tokens are kept under fixed keys. `auth_token` and `token` are legacy
//! names that older sessions may still carry; they are read as a fallback for
//! the access token and removed whenever the session is cleared.

use mailreach_common::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const LEGACY_TOKEN_KEYS: [&str; 2] = ["auth_token", "token"];

/// Key-value storage for session tokens
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Tokens held in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .map_err(|e| Error::Session(e.to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .map_err(|e| Error::Session(e.to_string()))?
            .remove(key);
        Ok(())
    }
}

/// Tokens persisted as a JSON object in a file
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileTokenStore {
    /// Open the store, reading any tokens already on disk
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| Error::Session(format!("Failed to read {}: {}", path.display(), e)))?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    Error::Session(format!("Corrupt session file {}: {}", path.display(), e))
                })?
            }
        } else {
            HashMap::new()
        };

        debug!("Opened session store at {} ({} keys)", path.display(), values.len());

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::Session(e.to_string()))?;
            }
        }
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content).map_err(|e| {
            Error::Session(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|e| Error::Session(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|e| Error::Session(e.to_string()))?;
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }
}

/// Typed access to the token keys of a [`TokenStore`]
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Session kept in memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Session backed by the configured token file, or memory when none is set
    pub fn from_config(config: &mailreach_common::config::SessionConfig) -> Result<Self> {
        match &config.token_path {
            Some(path) => Ok(Self::new(Arc::new(FileTokenStore::open(path)?))),
            None => Ok(Self::in_memory()),
        }
    }

    /// Current access token, falling back to the legacy keys
    pub fn access_token(&self) -> Option<String> {
        std::iter::once(ACCESS_TOKEN_KEY)
            .chain(LEGACY_TOKEN_KEYS)
            .find_map(|key| self.store.get(key).filter(|t| !t.is_empty()))
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn is_present(&self) -> bool {
        self.access_token().is_some()
    }

    /// Persist a new token pair. A missing refresh token keeps the stored one.
    pub fn store_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> Result<()> {
        self.store.set(ACCESS_TOKEN_KEY, access_token)?;
        if let Some(refresh) = refresh_token {
            self.store.set(REFRESH_TOKEN_KEY, refresh)?;
        }
        Ok(())
    }

    /// Remove every token key, including legacy ones
    pub fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY]
            .into_iter()
            .chain(LEGACY_TOKEN_KEYS)
        {
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to remove session key {}: {}", key, e);
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_present())
            .finish()
    }
}
