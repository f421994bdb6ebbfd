// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `pb server`: HTTPS listener owning the clipboard.
//!
//! ## Startup
//!
//! 1. Install the ring crypto provider for rustls
//! 2. Load `authorized_keys` (missing file = no client accepted)
//! 3. Choose the clipboard backend (flags override detection)
//! 4. Load or generate the TLS certificate
//! 5. Serve until `/quit`, Ctrl-C, or the caller cancels `shutdown`
//!
//! ## Shutdown
//!
//! Cancelling the token stops accepting connections and gives in-flight
//! requests [`SHUTDOWN_GRACE`] to finish. The recovery poller runs on a child
//! token and stops with it.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum_server::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::router;
use crate::auth::TrustStore;
use crate::clipboard::{ClipboardManager, ManagerSettings};
use crate::config::ServerConfig;
use crate::opener::SystemOpener;
use crate::state::AppState;
use crate::tls;

/// How long in-flight requests may run after shutdown starts.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// How long process exit waits for blocking tasks still on the runtime.
pub const RUNTIME_EXIT_GRACE: Duration = Duration::from_secs(1);

/// Run `future` to completion on a new multi-threaded runtime.
///
/// Clipboard calls against a hung backend never return, so the runtime is
/// shut down with a bounded wait instead of being dropped.
pub fn run_to_exit<F: Future>(future: F, grace: Duration) -> io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(grace);
    Ok(output)
}

/// Build the clipboard manager the server flags ask for.
pub async fn build_clipboard(
    config: &ServerConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<ClipboardManager> {
    if config.use_fallback {
        let manager = ClipboardManager::new(None, ManagerSettings::default(), shutdown);
        manager.use_in_memory().await;
        return Ok(manager);
    }

    let manager = ClipboardManager::detect(ManagerSettings::default(), shutdown);
    if config.use_external_tool {
        manager
            .use_external_tool()
            .await
            .context("--use-cli-tool given but no clipboard tool is installed")?;
    }
    Ok(manager)
}

pub async fn serve(config: ServerConfig, shutdown: CancellationToken) -> anyhow::Result<()> {
    // Install the ring crypto provider for rustls (must be done before any TLS operations).
    // Fails only if a provider is already installed, which is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let trust_store = TrustStore::load(&config.paths.authorized_keys())
        .context("could not load authorized keys")?;
    if trust_store.is_empty() {
        warn!("No authorized keys. Use 'pb key-add' to authorize a client");
    }

    let clipboard = build_clipboard(&config, shutdown.clone()).await?;
    let status = clipboard.status().await;
    info!(backend = %status.active, "Clipboard ready");

    let credentials =
        tls::load_or_generate(&config.paths).context("could not prepare TLS certificate")?;
    let tls_config = tls::server_config(credentials)?;

    let state = AppState::new(
        clipboard,
        trust_store,
        Arc::new(SystemOpener),
        shutdown.clone(),
    );
    let app = router(state);

    let handle = Handle::new();
    let drain = handle.clone();
    let cancelled = shutdown.clone();
    tokio::spawn(async move {
        cancelled.cancelled().await;
        info!("Shutting down server");
        drain.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    let addr = config.bind_addr();
    info!(%addr, "pb server listening");

    let result = axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .with_context(|| format!("HTTPS server on {addr} failed"));

    shutdown.cancel();
    info!("pb server stopped");
    result
}

async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Could not listen for Ctrl-C");
                return;
            }
            info!("Ctrl-C received");
            shutdown.cancel();
        }
        _ = shutdown.cancelled() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::BackendKind;
    use crate::config::{ConfigPaths, DEFAULT_HOST, DEFAULT_PORT};
    use tempfile::TempDir;

    fn config(dir: &TempDir, use_fallback: bool) -> ServerConfig {
        ServerConfig {
            host: DEFAULT_HOST.parse().unwrap(),
            port: DEFAULT_PORT,
            paths: ConfigPaths::new(dir.path()),
            use_fallback,
            use_external_tool: false,
        }
    }

    #[test]
    fn exit_does_not_wait_for_hung_blocking_calls() {
        let start = std::time::Instant::now();
        let value = run_to_exit(
            async {
                drop(tokio::task::spawn_blocking(|| {
                    std::thread::sleep(Duration::from_secs(30))
                }));
                7
            },
            Duration::from_millis(100),
        )
        .unwrap();

        assert_eq!(value, 7);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn fallback_flag_pins_memory() {
        let dir = TempDir::new().unwrap();
        let manager = build_clipboard(&config(&dir, true), CancellationToken::new())
            .await
            .unwrap();

        let status = manager.status().await;
        assert_eq!(status.active, BackendKind::InMemory);
        assert_eq!(status.primary, None);
    }
}
