// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory clipboard, the terminal fallback.

use std::sync::RwLock;

use super::backend::{BackendKind, ClipboardBackend, ClipboardResult};

/// A single shared buffer behind a read/write lock. Always available.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: RwLock<Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::InMemory
    }

    fn write(&self, data: &[u8]) -> ClipboardResult<()> {
        // A poisoned lock only means a writer panicked mid-assignment of a
        // whole Vec, so the buffer is still a complete value.
        let mut guard = self.data.write().unwrap_or_else(|e| e.into_inner());
        *guard = data.to_vec();
        Ok(())
    }

    fn read(&self) -> ClipboardResult<Vec<u8>> {
        let guard = self.data.read().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }
}
