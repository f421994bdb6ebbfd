// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Host clipboard through `arboard`.

use std::sync::{Mutex, MutexGuard};

use arboard::Clipboard;
use tracing::debug;

use super::backend::{BackendKind, ClipboardBackend, ClipboardError, ClipboardResult};

/// Native clipboard backend.
///
/// Holds one `arboard::Clipboard` for the life of the process. On X11 and
/// Wayland the copied content is only served while a handle is alive.
pub struct NativeBackend {
    clipboard: Mutex<Clipboard>,
}

impl NativeBackend {
    /// Open the platform clipboard; fails when there is no usable display.
    pub fn probe() -> ClipboardResult<Self> {
        let clipboard =
            Clipboard::new().map_err(|e| ClipboardError::NativeUnavailable(e.to_string()))?;
        Ok(Self {
            clipboard: Mutex::new(clipboard),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Clipboard> {
        self.clipboard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The text form of `data`. Bytes that are not valid UTF-8 are refused
/// rather than stored lossily.
fn as_text(data: &[u8]) -> ClipboardResult<&str> {
    std::str::from_utf8(data).map_err(|_| {
        debug!(bytes = data.len(), "Refusing non-UTF-8 data for native clipboard");
        ClipboardError::NotText(data.len())
    })
}

impl ClipboardBackend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn write(&self, data: &[u8]) -> ClipboardResult<()> {
        let text = as_text(data)?;
        self.lock()
            .set_text(text)
            .map_err(|e| ClipboardError::Native(e.to_string()))
    }

    fn read(&self) -> ClipboardResult<Vec<u8>> {
        match self.lock().get_text() {
            Ok(text) => Ok(text.into_bytes()),
            // An empty clipboard reads as no bytes rather than an error.
            Err(arboard::Error::ContentNotAvailable) => Ok(Vec::new()),
            Err(e) => Err(ClipboardError::Native(e.to_string())),
        }
    }
}
