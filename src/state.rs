// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::TrustStore;
use crate::clipboard::ClipboardManager;
use crate::opener::UrlOpener;

#[derive(Clone)]
pub struct AppState {
    pub clipboard: ClipboardManager,
    pub trust_store: Arc<TrustStore>,
    pub opener: Arc<dyn UrlOpener>,
    /// Cancelled by `/quit` to stop the server.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        clipboard: ClipboardManager,
        trust_store: TrustStore,
        opener: Arc<dyn UrlOpener>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            clipboard,
            trust_store: Arc::new(trust_store),
            opener,
            shutdown,
        }
    }
}
