// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The capability every clipboard implementation provides.

use std::fmt;

use thiserror::Error;

/// Which implementation is behind a [`ClipboardBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Host clipboard through the platform API.
    Native,
    /// A command-line tool such as `wl-copy` or `xclip`.
    External,
    /// Process-local buffer.
    InMemory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Native => write!(f, "native"),
            BackendKind::External => write!(f, "external"),
            BackendKind::InMemory => write!(f, "in-memory"),
        }
    }
}

/// Errors raised by clipboard backends and the manager.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// The native clipboard could not be opened.
    #[error("native clipboard unavailable: {0}")]
    NativeUnavailable(String),

    /// The native clipboard was opened but the operation failed.
    #[error("native clipboard error: {0}")]
    Native(String),

    /// The native clipboard holds text only.
    #[error("native clipboard only accepts UTF-8 text ({0} bytes given)")]
    NotText(usize),

    /// No supported command-line clipboard tool was found on `PATH`.
    #[error(
        "no clipboard utilities available: install xsel, xclip, wl-clipboard, or enable Termux:API"
    )]
    NoExternalTool,

    /// A clipboard tool exited unsuccessfully.
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("clipboard I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking worker running a backend call panicked or was cancelled.
    #[error("clipboard task failed: {0}")]
    Task(String),
}

pub type ClipboardResult<T> = Result<T, ClipboardError>;

/// Uniform `{write, read}` capability over clipboard bytes.
///
/// Implementations may block (process I/O, platform calls); the manager runs
/// them on the blocking pool under a timeout.
pub trait ClipboardBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn write(&self, data: &[u8]) -> ClipboardResult<()>;

    fn read(&self) -> ClipboardResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_display() {
        assert_eq!(BackendKind::Native.to_string(), "native");
        assert_eq!(BackendKind::External.to_string(), "external");
        assert_eq!(BackendKind::InMemory.to_string(), "in-memory");
    }

    #[test]
    fn tool_failed_message_names_tool() {
        let err = ClipboardError::ToolFailed {
            tool: "xclip".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "Error: Can't open display".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "xclip exited with exit status: 1: Error: Can't open display"
        );
    }
}
