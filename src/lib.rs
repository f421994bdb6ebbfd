// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! pb - Remote Clipboard over HTTPS
//!
//! Copy and paste to a clipboard owned by another machine. Requests are
//! signed with an SSH key and served over TLS.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers (Axum)
//! - `auth` - SSH signature request authentication
//! - `clipboard` - Clipboard backends and the failover manager
//! - `client` - Signed HTTPS client used by the CLI
//! - `server` - HTTPS server startup and shutdown

pub mod api;
pub mod auth;
pub mod client;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod opener;
pub mod server;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod tls;
