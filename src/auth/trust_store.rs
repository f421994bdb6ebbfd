// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Server-side set of trusted public keys, indexed by fingerprint.
//!
//! Loaded once at startup from an OpenSSH `authorized_keys` file and
//! read-only afterwards. Restart the server to pick up new keys.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use ssh_key::authorized_keys::Entry;
use ssh_key::PublicKey;
use thiserror::Error;
use tracing::{info, warn};

use super::wire;
use crate::storage;

#[derive(Debug, Error)]
pub enum TrustStoreError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid public key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Default, Clone)]
pub struct TrustStore {
    keys: HashMap<String, PublicKey>,
}

impl TrustStore {
    /// Load `path`. A missing file yields an empty store, which rejects every
    /// request.
    pub fn load(path: &Path) -> Result<Self, TrustStoreError> {
        let contents = match std::fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No authorized_keys file, no client will be accepted");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(TrustStoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let store = Self::parse(&contents);
        info!(path = %path.display(), keys = store.len(), "Loaded authorized keys");
        Ok(store)
    }

    /// Parse `authorized_keys` contents. Blank lines and `#` comments are
    /// ignored; malformed lines (including non-UTF-8 ones) are logged and
    /// skipped.
    pub fn parse(contents: &[u8]) -> Self {
        let mut store = Self::default();
        for (index, raw) in contents.split(|&b| b == b'\n').enumerate() {
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line.trim(),
                Err(_) => {
                    warn!(line = index + 1, "Skipping non-UTF-8 authorized key line");
                    continue;
                }
            };
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.parse::<Entry>() {
                Ok(entry) => {
                    store.insert(entry.public_key().clone());
                }
                Err(e) => warn!(line = index + 1, error = %e, "Skipping unparseable authorized key"),
            }
        }
        store
    }

    /// Trust `key`. Returns its fingerprint.
    pub fn insert(&mut self, key: PublicKey) -> String {
        let fingerprint = wire::fingerprint(&key);
        self.keys.entry(fingerprint.clone()).or_insert(key);
        fingerprint
    }

    pub fn get(&self, fingerprint: &str) -> Option<&PublicKey> {
        self.keys.get(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Validate an `authorized_keys` line and append it to `path`.
///
/// Returns the fingerprint of the added key.
pub fn add_authorized_key(path: &Path, line: &str) -> Result<String, TrustStoreError> {
    let line = line.trim();
    let entry = line
        .parse::<Entry>()
        .map_err(|e| TrustStoreError::InvalidKey(e.to_string()))?;

    storage::append_private(path, format!("{line}\n").as_bytes()).map_err(|source| {
        TrustStoreError::Write {
            path: path.to_path_buf(),
            source,
        }
    })?;

    Ok(wire::fingerprint(entry.public_key()))
}
