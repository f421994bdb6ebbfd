// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client side of `pb`: signed requests to a remote server.
//!
//! Every request carries the fingerprint of the client key and a signature
//! over the exact body bytes (empty for `paste`). The server's certificate
//! is self-signed and is not verified.
//!
//! When the remote call fails, `copy` and `paste` can fall back to this
//! machine's clipboard (see [`local_copy`] / [`local_paste`]).

use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::auth::{IdentityError, SigningIdentity};
use crate::clipboard::{ClipboardError, ClipboardManager, ManagerSettings};
use crate::config::{
    ClientConfig, HEADER_FINGERPRINT, HEADER_SIGNATURE, MAX_CLIPBOARD_SIZE, ROUTE_COPY, ROUTE_OPEN,
    ROUTE_PASTE, ROUTE_QUIT,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned non-200 status: {status}\n{body}")]
    Status { status: u16, body: String },

    #[error("data too large: {size} bytes (max {max} bytes, use --rosebud to bypass)")]
    TooLarge { size: usize, max: usize },

    #[error("invalid URL provided: {0}")]
    InvalidUrl(String),

    #[error("no local clipboard available")]
    NoLocalClipboard,

    #[error("local clipboard failed: {0}")]
    Local(#[from] ClipboardError),
}

pub struct SyncClient {
    http: reqwest::Client,
    identity: SigningIdentity,
    base_url: String,
}

impl SyncClient {
    /// Client for `https://<server>:<port>`.
    pub fn new(config: &ClientConfig, identity: SigningIdentity) -> Result<Self, ClientError> {
        Self::with_base_url(config.base_url(), identity)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        identity: SigningIdentity,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            identity,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    pub async fn copy(&self, data: Bytes) -> Result<(), ClientError> {
        self.send(Method::POST, ROUTE_COPY, data).await?;
        Ok(())
    }

    pub async fn paste(&self) -> Result<Bytes, ClientError> {
        self.send(Method::GET, ROUTE_PASTE, Bytes::new()).await
    }

    /// Ask the server to open `url`. The text is validated, then sent exactly
    /// as given rather than in normalized form.
    pub async fn open(&self, url: &str) -> Result<(), ClientError> {
        validate_url(url)?;
        self.send(Method::POST, ROUTE_OPEN, Bytes::from(url.to_owned()))
            .await?;
        Ok(())
    }

    pub async fn quit(&self) -> Result<(), ClientError> {
        self.send(Method::POST, ROUTE_QUIT, Bytes::new()).await?;
        Ok(())
    }

    /// Sign `body`, send it and return the response body of a 200.
    async fn send(&self, method: Method, route: &str, body: Bytes) -> Result<Bytes, ClientError> {
        let signature = self.identity.signature_header(&body)?;
        let url = format!("{}{route}", self.base_url);
        debug!(%method, %url, bytes = body.len(), "Sending signed request");

        let response = self
            .http
            .request(method, &url)
            .header(HEADER_FINGERPRINT, self.identity.fingerprint())
            .header(HEADER_SIGNATURE, signature)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes)
    }
}

/// Refuse oversized payloads unless the user insists.
pub fn check_copy_size(size: usize, rosebud: bool) -> Result<(), ClientError> {
    if size > MAX_CLIPBOARD_SIZE && !rosebud {
        return Err(ClientError::TooLarge {
            size,
            max: MAX_CLIPBOARD_SIZE,
        });
    }
    Ok(())
}

/// Parse a URL for `pb open`. Only absolute URLs are accepted.
pub fn validate_url(text: &str) -> Result<Url, ClientError> {
    Url::parse(text).map_err(|e| ClientError::InvalidUrl(e.to_string()))
}

async fn local_clipboard() -> Result<ClipboardManager, ClientError> {
    let manager = ClipboardManager::detect(ManagerSettings::default(), CancellationToken::new());
    if manager.status().await.primary.is_none() {
        return Err(ClientError::NoLocalClipboard);
    }
    Ok(manager)
}

/// Copy to this machine's clipboard.
pub async fn local_copy(data: Bytes) -> Result<(), ClientError> {
    local_clipboard().await?.copy(data).await?;
    Ok(())
}

/// Read this machine's clipboard.
pub async fn local_paste() -> Result<Vec<u8>, ClientError> {
    Ok(local_clipboard().await?.paste().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::api::router;
    use crate::auth::testing::generate_identity;
    use crate::auth::TrustStore;
    use crate::opener::{OpenError, SystemOpener, UrlOpener};
    use crate::state::AppState;

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
    }

    impl UrlOpener for RecordingOpener {
        fn open(&self, target: &str) -> Result<(), OpenError> {
            self.opened.lock().unwrap().push(target.to_string());
            Ok(())
        }
    }

    /// Serve the router over plain HTTP on an ephemeral port.
    async fn spawn_server(trusted: &SigningIdentity) -> (String, CancellationToken) {
        spawn_server_with(trusted, Arc::new(SystemOpener)).await
    }

    async fn spawn_server_with(
        trusted: &SigningIdentity,
        opener: Arc<dyn UrlOpener>,
    ) -> (String, CancellationToken) {
        let mut trust_store = TrustStore::default();
        trust_store.insert(trusted.public_key().clone());

        let shutdown = CancellationToken::new();
        let clipboard = ClipboardManager::new(None, ManagerSettings::default(), shutdown.clone());
        let state = AppState::new(clipboard, trust_store, opener, shutdown.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let token = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, router(state))
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await
                .unwrap();
        });

        (format!("http://{addr}"), shutdown)
    }

    #[tokio::test]
    async fn copy_and_paste_through_server() {
        let identity = generate_identity();
        let (base_url, _shutdown) = spawn_server(&identity).await;
        let client = SyncClient::with_base_url(base_url, identity).unwrap();

        client
            .copy(Bytes::from_static(b"over the wire\n"))
            .await
            .unwrap();
        assert_eq!(client.paste().await.unwrap(), "over the wire\n");
    }

    #[tokio::test]
    async fn untrusted_client_gets_status_error() {
        let trusted = generate_identity();
        let (base_url, _shutdown) = spawn_server(&trusted).await;
        let client = SyncClient::with_base_url(base_url, generate_identity()).unwrap();

        match client.paste().await {
            Err(ClientError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("unknown_public_key"));
            }
            other => panic!("expected 401, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn open_sends_url_as_typed() {
        let identity = generate_identity();
        let opener = Arc::new(RecordingOpener::default());
        let (base_url, _shutdown) = spawn_server_with(&identity, opener.clone()).await;
        let client = SyncClient::with_base_url(base_url, identity).unwrap();

        client.open("https://example.com").await.unwrap();
        assert!(matches!(
            client.open("not a url").await,
            Err(ClientError::InvalidUrl(_))
        ));
        assert_eq!(*opener.opened.lock().unwrap(), ["https://example.com"]);
    }

    #[tokio::test]
    async fn quit_cancels_server_token() {
        let identity = generate_identity();
        let (base_url, shutdown) = spawn_server(&identity).await;
        let client = SyncClient::with_base_url(base_url, identity).unwrap();

        client.quit().await.unwrap();
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn unreachable_server_is_http_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            SyncClient::with_base_url(format!("http://{addr}"), generate_identity()).unwrap();
        assert!(matches!(
            client.copy(Bytes::from_static(b"x")).await,
            Err(ClientError::Http(_))
        ));
    }

    #[test]
    fn size_guard() {
        assert!(check_copy_size(MAX_CLIPBOARD_SIZE, false).is_ok());
        assert!(matches!(
            check_copy_size(MAX_CLIPBOARD_SIZE + 1, false),
            Err(ClientError::TooLarge { .. })
        ));
        assert!(check_copy_size(MAX_CLIPBOARD_SIZE + 1, true).is_ok());
    }

    #[test]
    fn url_validation() {
        assert_eq!(
            validate_url("https://example.com/a?b=c").unwrap().as_str(),
            "https://example.com/a?b=c"
        );
        assert!(matches!(
            validate_url("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
