// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key-value store holding JSON blobs under logical key names.
//!
//! Values live in a concurrent map and are flushed as a single JSON document
//! to `path` after every write. Without a path the store is memory only.

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Persistent key-value store of JSON text blobs.
#[derive(Clone)]
pub struct PrefsStore {
    entries: Arc<DashMap<String, String>>,
    path: Option<Arc<PathBuf>>,
    // Serializes file writes so an older snapshot never overwrites a newer one
    flush_lock: Arc<Mutex<()>>,
}

impl PrefsStore {
    /// Open the store backed by `path`, loading existing contents.
    ///
    /// A missing file starts empty. A file that is not a JSON object of
    /// strings is logged and treated as having no prior data.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = DashMap::new();

        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
                Ok(map) => {
                    for (key, value) in map {
                        entries.insert(key, value);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Store file is malformed, starting empty"
                    );
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Store file not found, starting empty");
            }
            Err(e) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        }

        tracing::info!(path = %path.display(), keys = entries.len(), "Opened store");

        Ok(Self {
            entries: Arc::new(entries),
            path: Some(Arc::new(path)),
            flush_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Create a store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            path: None,
            flush_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Raw JSON text stored under `key`.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    /// Store raw text under `key` and flush.
    pub async fn put_raw(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.put_all_raw(vec![(key, value)]).await
    }

    /// Store several raw values and flush once. If the flush fails the
    /// previous values are put back, so the map never runs ahead of disk.
    pub async fn put_all_raw(&self, values: Vec<(&str, String)>) -> Result<(), StoreError> {
        let previous: Vec<(String, Option<String>)> = values
            .into_iter()
            .map(|(key, value)| (key.to_string(), self.entries.insert(key.to_string(), value)))
            .collect();

        let result = self.flush().await;
        if result.is_err() {
            for (key, old) in previous.into_iter().rev() {
                match old {
                    Some(old) => {
                        self.entries.insert(key, old);
                    }
                    None => {
                        self.entries.remove(&key);
                    }
                }
            }
        }
        result
    }

    /// Decode the value under `key`. `Ok(None)` if absent.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.get_raw(key) else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Decode {
                key: key.to_string(),
                source: e,
            })
    }

    /// Decode the value under `key`, falling back to the default when it is
    /// absent or cannot be decoded. Decode failures are logged.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.load(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable stored value");
                T::default()
            }
        }
    }

    /// Encode `value` as JSON under `key` and flush.
    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = encode(key, value)?;
        self.put_raw(key, raw).await
    }

    /// Write the whole map to disk via a temporary file and rename.
    async fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let _guard = self.flush_lock.lock().await;

        let snapshot: BTreeMap<String, String> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let bytes = serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Encode {
            key: "*".to_string(),
            source: e,
        })?;

        let io_err = |source| StoreError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;

        tracing::debug!(path = %path.display(), keys = snapshot.len(), "Flushed store");
        Ok(())
    }
}

/// JSON text for `value`, as stored under `key`.
pub fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Encode {
        key: key.to_string(),
        source: e,
    })
}

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode value for key '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
