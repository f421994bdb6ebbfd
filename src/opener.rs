// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Opening URLs on the server host.
//!
//! The server hands the request body to the platform's default handler
//! without validating it; clients validate URLs before sending.

use std::io;
use std::process::{Command, Stdio};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed { program: String, status: String },
}

/// Capability to open a URL on this host.
pub trait UrlOpener: Send + Sync {
    fn open(&self, target: &str) -> Result<(), OpenError>;
}

/// Default browser via `xdg-open`, `open` or `rundll32`, depending on the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl SystemOpener {
    fn command(target: &str) -> Command {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(target);
            cmd
        } else if cfg!(windows) {
            let mut cmd = Command::new("rundll32");
            cmd.args(["url.dll,FileProtocolHandler", target]);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(target);
            cmd
        }
    }
}

impl UrlOpener for SystemOpener {
    fn open(&self, target: &str) -> Result<(), OpenError> {
        let mut cmd = Self::command(target);
        let program = cmd.get_program().to_string_lossy().into_owned();

        let status = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| OpenError::Spawn {
                program: program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(OpenError::Failed {
                program,
                status: status.to_string(),
            })
        }
    }
}
