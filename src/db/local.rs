// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local key-value storage for user-scoped records.
//!
//! Values are opaque JSON documents under string keys. Reads and writes are
//! synchronous and unlocked: two writers for the same key race and the last
//! one wins. There is no schema migration; readers default missing fields.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::AppError;

/// Local storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored record for '{key}' is unreadable: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

enum Backing {
    Directory(PathBuf),
    Memory(DashMap<String, String>),
}

/// Device-local record store (one JSON file per key, or in memory).
#[derive(Clone)]
pub struct LocalStore {
    backing: Arc<Backing>,
}

impl LocalStore {
    /// Open a directory-backed store, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        tracing::info!(path = %dir.display(), "Opened local store");
        Ok(Self {
            backing: Arc::new(Backing::Directory(dir)),
        })
    }

    /// Volatile store for tests and ephemeral deployments.
    pub fn in_memory() -> Self {
        Self {
            backing: Arc::new(Backing::Memory(DashMap::new())),
        }
    }

    /// Read the raw value stored under `key`.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.backing.as_ref() {
            Backing::Directory(dir) => match fs::read_to_string(file_for(dir, key)) {
                Ok(contents) => Ok(Some(contents)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            },
            Backing::Memory(map) => Ok(map.get(key).map(|v| v.value().clone())),
        }
    }

    /// Replace the value stored under `key`.
    pub fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self.backing.as_ref() {
            Backing::Directory(dir) => fs::write(file_for(dir, key), value)?,
            Backing::Memory(map) => {
                map.insert(key.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    /// Delete `key`. Missing keys are not an error.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.backing.as_ref() {
            Backing::Directory(dir) => match fs::remove_file(file_for(dir, key)) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
            Backing::Memory(map) => {
                map.remove(key);
                Ok(())
            }
        }
    }

    /// Read and deserialize a record.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Serialize and store a record, overwriting any previous value.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }
}

/// Keys may contain characters that are not valid in file names.
fn file_for(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.json", URL_SAFE_NO_PAD.encode(key)))
}
