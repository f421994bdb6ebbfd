// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Clipboard Manager
//!
//! Owns the active backend and a dedicated in-memory fallback, and moves
//! between them:
//!
//! - **Primary → Fallback**: a copy/paste against the primary backend does not
//!   finish within the operation timeout. The operation is retried on the
//!   fallback and, for a new episode, a [`RecoveryPoller`] is spawned.
//! - **Fallback → Primary**: only the poller moves back, after a probe read of
//!   the primary completes successfully within the same timeout.
//!
//! While on the fallback, copy/paste skip the timeout path entirely.
//!
//! All transitions happen under the state write lock; the poller is spawned
//! under that lock too, so at most one poller exists per failure episode.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backend::{BackendKind, ClipboardBackend, ClipboardError, ClipboardResult};
use super::external::ExternalBackend;
use super::memory::MemoryBackend;
use super::native::NativeBackend;
use super::recovery::RecoveryPoller;

/// How long a primary backend call may take before failing over.
pub const OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Interval between recovery probes while on the fallback.
pub const RECOVERY_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Timing knobs for the manager.
#[derive(Debug, Clone, Copy)]
pub struct ManagerSettings {
    pub operation_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            operation_timeout: OPERATION_TIMEOUT,
            poll_interval: RECOVERY_POLL_INTERVAL,
        }
    }
}

/// A recovery probe read running on the blocking pool.
pub(crate) type ProbeTask = JoinHandle<ClipboardResult<Vec<u8>>>;

/// Snapshot of the manager's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipboardStatus {
    pub active: BackendKind,
    /// Backend the poller restores; `None` when pinned to memory.
    pub primary: Option<BackendKind>,
    pub using_fallback: bool,
    pub recovering: bool,
    /// Failover episodes since construction.
    pub failovers: u64,
}

struct ClipboardState {
    active: Arc<dyn ClipboardBackend>,
    primary: Option<Arc<dyn ClipboardBackend>>,
    using_fallback: bool,
    /// Cancellation handle of the running poller, if any.
    recovery: Option<CancellationToken>,
    failovers: u64,
}

/// Thread-safe clipboard with timeout-driven failover. Cheap to clone.
#[derive(Clone)]
pub struct ClipboardManager {
    state: Arc<RwLock<ClipboardState>>,
    fallback: Arc<MemoryBackend>,
    settings: ManagerSettings,
    shutdown: CancellationToken,
}

impl ClipboardManager {
    /// Build a manager around an explicit primary backend.
    ///
    /// With no primary the manager stays on the in-memory fallback for good.
    /// Recovery pollers run on child tokens of `shutdown`.
    pub fn new(
        primary: Option<Arc<dyn ClipboardBackend>>,
        settings: ManagerSettings,
        shutdown: CancellationToken,
    ) -> Self {
        let fallback = Arc::new(MemoryBackend::new());
        let (active, using_fallback) = match &primary {
            Some(backend) => (Arc::clone(backend), false),
            None => (fallback.clone() as Arc<dyn ClipboardBackend>, true),
        };

        Self {
            state: Arc::new(RwLock::new(ClipboardState {
                active,
                primary,
                using_fallback,
                recovery: None,
                failovers: 0,
            })),
            fallback,
            settings,
            shutdown,
        }
    }

    /// Probe the host: native clipboard first, then a command-line tool,
    /// then the in-memory store.
    pub fn detect(settings: ManagerSettings, shutdown: CancellationToken) -> Self {
        let primary: Option<Arc<dyn ClipboardBackend>> = match NativeBackend::probe() {
            Ok(native) => {
                info!("Using native system clipboard");
                Some(Arc::new(native))
            }
            Err(native_err) => {
                info!(error = %native_err, "Native clipboard unavailable");
                match ExternalBackend::detect() {
                    Ok(external) => {
                        info!(tool = %external.tool().copy[0], "Falling back to CLI clipboard tool");
                        Some(Arc::new(external))
                    }
                    Err(_) => {
                        warn!("No clipboard utilities available, using in-memory clipboard");
                        None
                    }
                }
            }
        };

        Self::new(primary, settings, shutdown)
    }

    /// Store `data` on the active backend.
    pub async fn copy(&self, data: Bytes) -> ClipboardResult<()> {
        let (active, using_fallback) = self.active().await;
        if using_fallback {
            return active.write(&data);
        }

        let payload = data.clone();
        match self.call_with_timeout(active, move |b| b.write(&payload)).await {
            Some(result) => result,
            None => {
                self.switch_to_fallback().await;
                self.fallback.write(&data)
            }
        }
    }

    /// Read the active backend.
    pub async fn paste(&self) -> ClipboardResult<Vec<u8>> {
        let (active, using_fallback) = self.active().await;
        if using_fallback {
            return active.read();
        }

        match self.call_with_timeout(active, |b| b.read()).await {
            Some(result) => result,
            None => {
                self.switch_to_fallback().await;
                self.fallback.read()
            }
        }
    }

    /// Pin the manager to the in-memory clipboard (explicit configuration).
    ///
    /// Any running poller is stopped and no primary is restored afterwards.
    pub async fn use_in_memory(&self) {
        let mut state = self.state.write().await;
        state.active = self.fallback.clone() as Arc<dyn ClipboardBackend>;
        state.using_fallback = true;
        state.primary = None;
        if let Some(token) = state.recovery.take() {
            token.cancel();
        }
        info!("Switched to in-memory clipboard (manual flag)");
    }

    /// Make the command-line tool backend primary, bypassing native.
    pub async fn use_external_tool(&self) -> ClipboardResult<()> {
        let external = ExternalBackend::detect()?;
        self.replace_primary(Arc::new(external)).await;
        info!("Switched to CLI clipboard tools (manual flag)");
        Ok(())
    }

    /// Make `backend` both primary and active.
    pub async fn replace_primary(&self, backend: Arc<dyn ClipboardBackend>) {
        let mut state = self.state.write().await;
        state.active = Arc::clone(&backend);
        state.primary = Some(backend);
        state.using_fallback = false;
        if let Some(token) = state.recovery.take() {
            token.cancel();
        }
    }

    pub async fn status(&self) -> ClipboardStatus {
        let state = self.state.read().await;
        ClipboardStatus {
            active: state.active.kind(),
            primary: state.primary.as_ref().map(|p| p.kind()),
            using_fallback: state.using_fallback,
            recovering: state.recovery.is_some(),
            failovers: state.failovers,
        }
    }

    async fn active(&self) -> (Arc<dyn ClipboardBackend>, bool) {
        let state = self.state.read().await;
        (Arc::clone(&state.active), state.using_fallback)
    }

    /// Run a backend call on the blocking pool. `None` means it timed out.
    ///
    /// A timed-out call keeps running detached; its result is discarded.
    async fn call_with_timeout<T, F>(
        &self,
        backend: Arc<dyn ClipboardBackend>,
        op: F,
    ) -> Option<ClipboardResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&dyn ClipboardBackend) -> ClipboardResult<T> + Send + 'static,
    {
        let task = tokio::task::spawn_blocking(move || op(backend.as_ref()));
        match tokio::time::timeout(self.settings.operation_timeout, task).await {
            Ok(Ok(result)) => Some(result),
            Ok(Err(join_err)) => Some(Err(ClipboardError::Task(join_err.to_string()))),
            Err(_) => None,
        }
    }

    /// Switch to the fallback and start a poller if this is a new episode.
    pub(crate) async fn switch_to_fallback(&self) {
        let mut state = self.state.write().await;
        let was_using_fallback = state.using_fallback;
        state.active = self.fallback.clone() as Arc<dyn ClipboardBackend>;
        state.using_fallback = true;

        if was_using_fallback || state.recovery.is_some() {
            return;
        }
        let Some(primary) = state.primary.clone() else {
            return;
        };

        let token = self.shutdown.child_token();
        state.recovery = Some(token.clone());
        state.failovers += 1;

        warn!(
            primary = %primary.kind(),
            poll_interval_ms = self.settings.poll_interval.as_millis() as u64,
            "System clipboard unresponsive, switched to in-memory fallback"
        );

        let poller = RecoveryPoller::new(self.clone(), primary, self.settings.poll_interval);
        tokio::spawn(poller.run(token));
    }

    /// Probe read against `primary` under the operation timeout.
    ///
    /// A probe that outlives the timeout is parked in `in_flight`. Until it
    /// finishes, further calls return `false` without starting another read,
    /// so a hung primary pins at most one blocking thread.
    pub(crate) async fn probe(
        &self,
        primary: Arc<dyn ClipboardBackend>,
        in_flight: &mut Option<ProbeTask>,
    ) -> bool {
        if in_flight.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("Previous clipboard probe still running");
            return false;
        }
        *in_flight = None;

        let mut task = tokio::task::spawn_blocking(move || primary.read());
        match tokio::time::timeout(self.settings.operation_timeout, &mut task).await {
            Ok(Ok(Ok(_))) => true,
            Ok(Ok(Err(e))) => {
                debug!(error = %e, "Clipboard probe failed");
                false
            }
            Ok(Err(join_err)) => {
                debug!(error = %join_err, "Clipboard probe task failed");
                false
            }
            Err(_) => {
                *in_flight = Some(task);
                false
            }
        }
    }

    /// Called by the poller after a successful probe.
    ///
    /// Does nothing if the poller was cancelled in the meantime.
    pub(crate) async fn restore_primary(&self, token: &CancellationToken) -> bool {
        let mut state = self.state.write().await;
        if token.is_cancelled() {
            return false;
        }
        state.recovery = None;

        let Some(primary) = state.primary.clone() else {
            return false;
        };
        state.active = primary;
        state.using_fallback = false;
        info!("System clipboard recovered, switched back from fallback");
        true
    }
}
