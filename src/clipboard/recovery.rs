// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Clipboard Recovery Poller
//!
//! Background task spawned when the manager fails over to the in-memory
//! clipboard. Every `poll_interval` it probes the primary backend with a
//! read under the operation timeout; the first successful probe switches the
//! manager back and ends the task. A probe that times out is kept and no new
//! one starts until it returns.
//!
//! ## Shutdown
//!
//! Runs on a child of the server's `CancellationToken`, so it stops on
//! process shutdown or when the manager is pinned to memory.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::backend::ClipboardBackend;
use super::manager::ClipboardManager;

pub struct RecoveryPoller {
    manager: ClipboardManager,
    primary: Arc<dyn ClipboardBackend>,
    poll_interval: Duration,
}

impl RecoveryPoller {
    pub fn new(
        manager: ClipboardManager,
        primary: Arc<dyn ClipboardBackend>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            manager,
            primary,
            poll_interval,
        }
    }

    /// Poll until the primary responds or `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        debug!(
            primary = %self.primary.kind(),
            interval_ms = self.poll_interval.as_millis() as u64,
            "Clipboard recovery poller starting"
        );

        let mut in_flight = None;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = cancel.cancelled() => {
                    info!("Clipboard recovery poller stopped");
                    return;
                }
            }

            if self
                .manager
                .probe(Arc::clone(&self.primary), &mut in_flight)
                .await
            {
                self.manager.restore_primary(&cancel).await;
                return;
            }
            debug!(primary = %self.primary.kind(), "Clipboard still unresponsive");
        }
    }
}
