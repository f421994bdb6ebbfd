// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Clipboard through an external command-line tool.
//!
//! The tool is chosen once, by probing `PATH`:
//!
//! 1. `wl-copy` / `wl-paste` when `WAYLAND_DISPLAY` is set
//! 2. `xclip`
//! 3. `xsel`
//! 4. `termux-clipboard-set` / `termux-clipboard-get`

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use super::backend::{BackendKind, ClipboardBackend, ClipboardError, ClipboardResult};

/// Copy/paste command lines for one clipboard tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTool {
    pub copy: Vec<String>,
    pub paste: Vec<String>,
}

impl ExternalTool {
    pub fn new(copy: &[&str], paste: &[&str]) -> Self {
        Self {
            copy: copy.iter().map(|s| s.to_string()).collect(),
            paste: paste.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn wl_clipboard() -> Self {
        Self::new(&["wl-copy"], &["wl-paste", "--no-newline"])
    }

    pub fn xclip() -> Self {
        Self::new(
            &["xclip", "-in", "-selection", "clipboard"],
            &["xclip", "-out", "-selection", "clipboard"],
        )
    }

    pub fn xsel() -> Self {
        Self::new(
            &["xsel", "--input", "--clipboard"],
            &["xsel", "--output", "--clipboard"],
        )
    }

    pub fn termux() -> Self {
        Self::new(&["termux-clipboard-set"], &["termux-clipboard-get"])
    }

    /// Pick the first available tool in priority order.
    ///
    /// `has_command` answers whether a program exists on `PATH`.
    pub fn select(wayland: bool, has_command: impl Fn(&str) -> bool) -> Option<Self> {
        if wayland && has_command("wl-copy") && has_command("wl-paste") {
            return Some(Self::wl_clipboard());
        }
        if has_command("xclip") {
            return Some(Self::xclip());
        }
        if has_command("xsel") {
            return Some(Self::xsel());
        }
        if has_command("termux-clipboard-set") && has_command("termux-clipboard-get") {
            return Some(Self::termux());
        }
        None
    }

    /// Probe the current environment.
    pub fn detect() -> Option<Self> {
        let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some_and(|v| !v.is_empty());
        Self::select(wayland, |cmd| which::which(cmd).is_ok())
    }

    fn program(args: &[String]) -> ClipboardResult<&String> {
        args.first().ok_or(ClipboardError::NoExternalTool)
    }
}

/// Backend that shells out to an [`ExternalTool`].
#[derive(Debug, Clone)]
pub struct ExternalBackend {
    tool: ExternalTool,
}

impl ExternalBackend {
    pub fn new(tool: ExternalTool) -> Self {
        Self { tool }
    }

    /// Build from the detected tool. Fails when none is installed.
    pub fn detect() -> ClipboardResult<Self> {
        let tool = ExternalTool::detect().ok_or(ClipboardError::NoExternalTool)?;
        debug!(tool = %tool.copy[0], "Detected external clipboard tool");
        Ok(Self::new(tool))
    }

    pub fn tool(&self) -> &ExternalTool {
        &self.tool
    }
}

fn tool_failed(tool: &str, status: std::process::ExitStatus, stderr: &[u8]) -> ClipboardError {
    ClipboardError::ToolFailed {
        tool: tool.to_string(),
        status: status.to_string(),
        stderr: String::from_utf8_lossy(stderr).trim().to_string(),
    }
}

impl ClipboardBackend for ExternalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::External
    }

    fn write(&self, data: &[u8]) -> ClipboardResult<()> {
        let program = ExternalTool::program(&self.tool.copy)?;
        // xclip and wl-copy fork to keep serving the selection; the forked
        // process inherits our pipes, so only stdin is piped here.
        let mut child = Command::new(program)
            .args(&self.tool.copy[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        // Close stdin and reap the child even when the write fails.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(data),
            None => Ok(()),
        };
        let status = child.wait()?;
        written?;
        if !status.success() {
            return Err(tool_failed(program, status, &[]));
        }
        Ok(())
    }

    fn read(&self) -> ClipboardResult<Vec<u8>> {
        let program = ExternalTool::program(&self.tool.paste)?;
        let output = Command::new(program)
            .args(&self.tool.paste[1..])
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(tool_failed(program, output.status, &output.stderr));
        }
        Ok(output.stdout)
    }
}
