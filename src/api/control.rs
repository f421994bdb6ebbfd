// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode};
use tracing::{info, warn};

use crate::{error::ApiError, state::AppState};

/// `POST /open`: open the body (a URL) with the host's default handler.
pub async fn open(State(state): State<AppState>, body: Bytes) -> Result<StatusCode, ApiError> {
    let target = String::from_utf8(body.to_vec())
        .map_err(|_| ApiError::bad_request("URL must be valid UTF-8"))?;
    info!(url = %target, "Open request received");

    let opener = Arc::clone(&state.opener);
    let result = tokio::task::spawn_blocking(move || opener.open(&target))
        .await
        .map_err(|e| ApiError::internal(format!("Open task failed: {e}")))?;

    result.map_err(|e| {
        warn!(error = %e, "Open failed");
        ApiError::internal("Failed to open URL")
    })?;
    Ok(StatusCode::OK)
}

/// `POST /quit`: acknowledge, then stop the server gracefully.
pub async fn quit(State(state): State<AppState>) -> StatusCode {
    info!("Shutdown requested by client");
    state.shutdown.cancel();
    StatusCode::OK
}
