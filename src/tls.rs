// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Server TLS material.
//!
//! `pb server` serves HTTPS only, with a self-signed certificate kept in the
//! config directory. It is generated on first start and reused afterwards.
//! Clients do not verify it; request signatures authenticate the client and
//! TLS only protects the payload in transit.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::pki_types::{
    CertificateDer, PrivateKeyDer, PrivatePkcs1KeyDer, PrivatePkcs8KeyDer, PrivateSec1KeyDer,
};
use thiserror::Error;
use tracing::info;

use crate::config::ConfigPaths;
use crate::storage;

const CERT_TAG: &str = "CERTIFICATE";
const PKCS8_TAG: &str = "PRIVATE KEY";

#[derive(Debug, Error)]
pub enum TlsError {
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

    #[error("invalid PEM in {path}: {message}")]
    Pem { path: PathBuf, message: String },

    #[error("could not generate self-signed certificate: {0}")]
    Generate(#[from] rcgen::Error),

    #[error("invalid TLS configuration: {0}")]
    Config(#[from] rustls::Error),
}

/// Certificate chain and private key, ready for rustls.
pub struct TlsCredentials {
    pub certs: Vec<CertificateDer<'static>>,
    pub key: PrivateKeyDer<'static>,
}

/// Load `cert.pem`/`key.pem`, generating both first if the certificate is
/// missing.
pub fn load_or_generate(paths: &ConfigPaths) -> Result<TlsCredentials, TlsError> {
    let cert_path = paths.tls_cert();
    let key_path = paths.tls_key();

    if !cert_path.exists() {
        generate_self_signed(&cert_path, &key_path)?;
        info!(path = %cert_path.display(), "Generated self-signed TLS certificate");
    }

    Ok(TlsCredentials {
        certs: load_certs(&cert_path)?,
        key: load_key(&key_path)?,
    })
}

/// Build the axum-server TLS config from loaded credentials.
pub fn server_config(credentials: TlsCredentials) -> Result<RustlsConfig, TlsError> {
    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(credentials.certs, credentials.key)?;
    Ok(RustlsConfig::from_config(Arc::new(config)))
}

fn generate_self_signed(cert_path: &Path, key_path: &Path) -> Result<(), TlsError> {
    let certified_key = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])?;

    let cert_pem = pem::encode(&pem::Pem::new(CERT_TAG, certified_key.cert.der().to_vec()));
    let key_pem = pem::encode(&pem::Pem::new(
        PKCS8_TAG,
        certified_key.key_pair.serialize_der(),
    ));

    // Key first: a certificate without its key would be reused forever.
    storage::write_private(key_path, key_pem.as_bytes()).map_err(|source| TlsError::Write {
        path: key_path.to_path_buf(),
        source,
    })?;
    storage::write_private(cert_path, cert_pem.as_bytes()).map_err(|source| TlsError::Write {
        path: cert_path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn read_pem(path: &Path) -> Result<Vec<pem::Pem>, TlsError> {
    let contents = std::fs::read(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    pem::parse_many(contents).map_err(|e| TlsError::Pem {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let certs: Vec<CertificateDer<'static>> = read_pem(path)?
        .into_iter()
        .filter(|block| block.tag() == CERT_TAG)
        .map(|block| CertificateDer::from(block.into_contents()))
        .collect();

    if certs.is_empty() {
        return Err(TlsError::Pem {
            path: path.to_path_buf(),
            message: "no CERTIFICATE block".to_string(),
        });
    }
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    for block in read_pem(path)? {
        let tag = block.tag().to_string();
        let key = match tag.as_str() {
            PKCS8_TAG => PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(block.into_contents())),
            "RSA PRIVATE KEY" => {
                PrivateKeyDer::Pkcs1(PrivatePkcs1KeyDer::from(block.into_contents()))
            }
            "EC PRIVATE KEY" => PrivateKeyDer::Sec1(PrivateSec1KeyDer::from(block.into_contents())),
            _ => continue,
        };
        return Ok(key);
    }

    Err(TlsError::Pem {
        path: path.to_path_buf(),
        message: "no private key block".to_string(),
    })
}
