// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tracing subscriber setup.
//!
//! Logs go to stderr so `pb paste` output on stdout stays clean.

use tracing_subscriber::EnvFilter;

use crate::config::LOG_FORMAT_ENV;

/// Default filter for `pb server`.
pub const SERVER_FILTER: &str = "info,tower_http=debug";

/// Default filter for client commands.
pub const CLIENT_FILTER: &str = "warn";

/// Filter used by client commands when `--log` is passed.
pub const VERBOSE_FILTER: &str = "debug";

/// Install the global subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    // A second init (e.g. from tests) is not an error worth failing on.
    let _ = if json_output() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn json_output() -> bool {
    std::env::var(LOG_FORMAT_ENV)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
