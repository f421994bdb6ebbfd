// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines the constants shared by client and server, the
//! on-disk layout of the config directory, and the resolved settings handed
//! to the server and client at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `PB_CLIPBOARD_SERVER` | Server address used by client commands | `localhost` |
//! | `PB_CLIPBOARD_PORT` | Server port (client and server) | `2850` |
//! | `PB_CLIPBOARD_KEY` | Path to the private signing key | discovered |
//! | `PB_CLIPBOARD_HOST` | Server bind address | `0.0.0.0` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` (server) |

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Program name, used for the config directory and user-facing hints.
pub const PROGRAM_NAME: &str = "pb";

/// Default port for both `pb server` and client commands.
pub const DEFAULT_PORT: u16 = 2850;

/// Default server bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server address for client commands.
pub const DEFAULT_SERVER: &str = "localhost";

pub const SERVER_ENV: &str = "PB_CLIPBOARD_SERVER";
pub const PORT_ENV: &str = "PB_CLIPBOARD_PORT";
pub const KEY_ENV: &str = "PB_CLIPBOARD_KEY";
pub const HOST_ENV: &str = "PB_CLIPBOARD_HOST";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Request header carrying the OpenSSH SHA-256 fingerprint of the signing key.
pub const HEADER_FINGERPRINT: &str = "x-pb-key-fingerprint";

/// Request header carrying the base64 SSH-wire signature of the body digest.
pub const HEADER_SIGNATURE: &str = "x-pb-signature";

pub const ROUTE_COPY: &str = "/copy";
pub const ROUTE_PASTE: &str = "/paste";
pub const ROUTE_OPEN: &str = "/open";
pub const ROUTE_QUIT: &str = "/quit";

/// Client-side copy limit. Bypassed with `--rosebud`.
pub const MAX_CLIPBOARD_SIZE: usize = 200 * 1024 * 1024;

/// Layout of `~/.config/pb/`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    root: PathBuf,
}

impl ConfigPaths {
    /// Create paths rooted at a custom directory (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Resolve `~/.config/pb`. Returns `None` when the home directory is unknown.
    pub fn from_home() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".config").join(PROGRAM_NAME)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn authorized_keys(&self) -> PathBuf {
        self.root.join("authorized_keys")
    }

    /// TLS certificate served by `pb server`.
    pub fn tls_cert(&self) -> PathBuf {
        self.root.join("cert.pem")
    }

    /// Private key matching [`ConfigPaths::tls_cert`].
    pub fn tls_key(&self) -> PathBuf {
        self.root.join("key.pem")
    }

    /// Program-specific signing key written by `pb key-gen`.
    pub fn signing_key(&self) -> PathBuf {
        self.root.join("id_ed25519")
    }
}

/// Settings resolved by the CLI for `pb server`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub paths: ConfigPaths,
    /// Start on the in-memory clipboard and never leave it.
    pub use_fallback: bool,
    /// Use the external command-line tool instead of the native clipboard.
    pub use_external_tool: bool,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Settings resolved by the CLI for client commands.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: String,
    pub port: u16,
    pub key_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Base URL of the remote server, e.g. `https://localhost:2850`.
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.server, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_paths_layout() {
        let paths = ConfigPaths::new("/tmp/pb");
        assert_eq!(paths.authorized_keys(), PathBuf::from("/tmp/pb/authorized_keys"));
        assert_eq!(paths.tls_cert(), PathBuf::from("/tmp/pb/cert.pem"));
        assert_eq!(paths.tls_key(), PathBuf::from("/tmp/pb/key.pem"));
        assert_eq!(paths.signing_key(), PathBuf::from("/tmp/pb/id_ed25519"));
    }

    #[test]
    fn client_base_url() {
        let config = ClientConfig {
            server: "desk.local".to_string(),
            port: DEFAULT_PORT,
            key_path: None,
        };
        assert_eq!(config.base_url(), "https://desk.local:2850");
    }

    #[test]
    fn server_bind_addr() {
        let config = ServerConfig {
            host: DEFAULT_HOST.parse().unwrap(),
            port: 9000,
            paths: ConfigPaths::new("/tmp/pb"),
            use_fallback: false,
            use_external_tool: false,
        };
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:9000");
    }
}
