// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client signing identity.
//!
//! ## Key Discovery
//!
//! The first existing, parseable key wins:
//!
//! 1. `--key` / `PB_CLIPBOARD_KEY`
//! 2. `~/.config/pb/id_ed25519` (written by `pb key-gen`)
//! 3. `~/.ssh/id_ed25519`, `~/.ssh/id_ecdsa`, `~/.ssh/id_rsa`
//!
//! An explicitly supplied key must load; discovered candidates that fail to
//! parse are skipped with a warning.

use std::io;
use std::path::{Path, PathBuf};

use rand_core::OsRng;
use signature::Signer;
use ssh_key::{Algorithm, LineEnding, PrivateKey, PublicKey, Signature};
use thiserror::Error;
use tracing::{debug, warn};

use super::wire;
use crate::config::ConfigPaths;
use crate::storage;

/// Conventional SSH key names tried in `~/.ssh`, in order.
pub const DEFAULT_KEY_NAMES: [&str; 3] = ["id_ed25519", "id_ecdsa", "id_rsa"];

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(
        "no private key found. Please run 'pb key-gen' to create a new key, or specify one with the --key flag"
    )]
    NoUsableKey,

    #[error("could not read private key at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse private key at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ssh_key::Error,
    },

    #[error("private key is passphrase-protected; use an unencrypted key")]
    Encrypted,

    #[error("could not sign payload: {0}")]
    Sign(String),

    #[error("could not encode key material: {0}")]
    Encode(String),

    #[error("key already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("could not write key to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A loaded private signing key. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct SigningIdentity {
    private_key: PrivateKey,
    fingerprint: String,
}

impl SigningIdentity {
    pub fn from_private_key(private_key: PrivateKey) -> Result<Self, IdentityError> {
        if private_key.is_encrypted() {
            return Err(IdentityError::Encrypted);
        }
        let fingerprint = wire::fingerprint(private_key.public_key());
        Ok(Self {
            private_key,
            fingerprint,
        })
    }

    /// Load an OpenSSH private key file.
    pub fn load(path: &Path) -> Result<Self, IdentityError> {
        let contents = std::fs::read(path).map_err(|source| IdentityError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let private_key =
            PrivateKey::from_openssh(&contents).map_err(|source| IdentityError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_private_key(private_key)
    }

    pub fn public_key(&self) -> &PublicKey {
        self.private_key.public_key()
    }

    /// OpenSSH SHA-256 fingerprint used as the trust store key.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Public key as a single `authorized_keys` line (no trailing newline).
    pub fn authorized_key_line(&self) -> Result<String, IdentityError> {
        self.public_key()
            .to_openssh()
            .map_err(|e| IdentityError::Encode(e.to_string()))
    }

    /// Sign the SHA-256 digest of `payload`.
    pub fn sign(&self, payload: &[u8]) -> Result<Signature, IdentityError> {
        let digest = wire::payload_digest(payload);
        self.private_key
            .try_sign(&digest)
            .map_err(|e| IdentityError::Sign(e.to_string()))
    }

    /// Sign `payload` and encode the result for the signature header.
    pub fn signature_header(&self, payload: &[u8]) -> Result<String, IdentityError> {
        let signature = self.sign(payload)?;
        wire::encode_signature(&signature).map_err(|e| IdentityError::Encode(e.to_string()))
    }
}

/// Ordered search for the client's private key.
#[derive(Debug, Clone)]
pub struct KeyDiscovery {
    explicit: Option<PathBuf>,
    program_key: Option<PathBuf>,
    ssh_dir: Option<PathBuf>,
}

impl KeyDiscovery {
    /// Search the standard locations under the user's home directory.
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            program_key: ConfigPaths::from_home().map(|paths| paths.signing_key()),
            ssh_dir: dirs::home_dir().map(|home| home.join(".ssh")),
        }
    }

    /// Search custom locations (useful for testing).
    pub fn with_locations(
        explicit: Option<PathBuf>,
        program_key: Option<PathBuf>,
        ssh_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            explicit,
            program_key,
            ssh_dir,
        }
    }

    /// Implicit candidates, in priority order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = self.program_key.iter().cloned().collect();
        if let Some(ssh_dir) = &self.ssh_dir {
            candidates.extend(DEFAULT_KEY_NAMES.iter().map(|name| ssh_dir.join(name)));
        }
        candidates
    }

    pub fn discover(&self) -> Result<SigningIdentity, IdentityError> {
        if let Some(path) = &self.explicit {
            return SigningIdentity::load(path);
        }

        for candidate in self.candidates() {
            if !candidate.is_file() {
                continue;
            }
            match SigningIdentity::load(&candidate) {
                Ok(identity) => {
                    debug!(path = %candidate.display(), fingerprint = %identity.fingerprint(), "Using signing key");
                    return Ok(identity);
                }
                Err(e) => warn!(error = %e, "Skipping unusable key"),
            }
        }

        Err(IdentityError::NoUsableKey)
    }
}

/// Generate an ed25519 key pair at `paths.signing_key()` (+ `.pub`).
///
/// Refuses to overwrite an existing key.
pub fn generate_signing_key(paths: &ConfigPaths) -> Result<PathBuf, IdentityError> {
    let key_path = paths.signing_key();
    if key_path.exists() {
        return Err(IdentityError::AlreadyExists(key_path));
    }

    let private_key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519)
        .map_err(|e| IdentityError::Encode(e.to_string()))?;
    let private_pem = private_key
        .to_openssh(LineEnding::LF)
        .map_err(|e| IdentityError::Encode(e.to_string()))?;
    let public_line = private_key
        .public_key()
        .to_openssh()
        .map_err(|e| IdentityError::Encode(e.to_string()))?;

    storage::write_private(&key_path, private_pem.as_bytes()).map_err(|source| {
        IdentityError::Write {
            path: key_path.clone(),
            source,
        }
    })?;

    let pub_path = key_path.with_extension("pub");
    storage::write_with_mode(&pub_path, format!("{public_line}\n").as_bytes(), 0o644).map_err(
        |source| IdentityError::Write {
            path: pub_path.clone(),
            source,
        },
    )?;

    Ok(key_path)
}
