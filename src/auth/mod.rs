// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! SSH-key request signatures.
//!
//! ## Auth Flow
//!
//! 1. Client loads an SSH private key (see [`identity::KeyDiscovery`])
//! 2. Client signs the SHA-256 digest of the request body and sends:
//!    - `X-PB-Key-Fingerprint: SHA256:...`
//!    - `X-PB-Signature: <base64 SSH signature>`
//! 3. Server:
//!    - Looks the fingerprint up in `~/.config/pb/authorized_keys`
//!    - Verifies the signature over the exact body bytes
//!    - Passes the buffered body on to the handler
//!
//! ## Security
//!
//! - Every route requires a valid signature
//! - Unknown fingerprints are rejected before the body is read
//! - Signatures carry no nonce or timestamp, so a captured request can be
//!   replayed; TLS is what keeps them from being captured

pub mod error;
pub mod identity;
pub mod middleware;
pub mod trust_store;
pub mod wire;

pub use error::AuthError;
pub use identity::{generate_signing_key, IdentityError, KeyDiscovery, SigningIdentity};
pub use middleware::{auth_gate, verify_request, VerifiedKey};
pub use trust_store::{add_authorized_key, TrustStore, TrustStoreError};
