// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Clipboard Module
//!
//! Backends behind one `{write, read}` capability, and the manager that
//! fails over between them.
//!
//! ## Backends
//!
//! - `native` - host clipboard via `arboard`
//! - `external` - `wl-copy`/`xclip`/`xsel`/`termux-clipboard-*`
//! - `memory` - process-local buffer, always available
//!
//! The primary backend (native, else external) is chosen once at
//! construction. The in-memory backend is the fallback.

pub mod backend;
pub mod external;
pub mod manager;
pub mod memory;
pub mod native;
pub mod recovery;

pub use backend::{BackendKind, ClipboardBackend, ClipboardError, ClipboardResult};
pub use external::{ExternalBackend, ExternalTool};
pub use manager::{ClipboardManager, ClipboardStatus, ManagerSettings};
pub use memory::MemoryBackend;
pub use native::NativeBackend;
