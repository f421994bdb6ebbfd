// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use tracing::{info, warn};

use crate::{error::ApiError, state::AppState};

/// `POST /copy`: replace the clipboard with the raw request body.
pub async fn copy(State(state): State<AppState>, body: Bytes) -> Result<StatusCode, ApiError> {
    let len = body.len();
    state.clipboard.copy(body).await.map_err(|e| {
        warn!(error = %e, "Copy failed");
        ApiError::internal("Failed to write to clipboard")
    })?;

    info!(bytes = len, "Copy request handled");
    Ok(StatusCode::OK)
}

/// `GET /paste`: return the clipboard as raw bytes.
pub async fn paste(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let content = state.clipboard.paste().await.map_err(|e| {
        warn!(error = %e, "Paste failed");
        ApiError::internal("Failed to read from clipboard")
    })?;

    info!(bytes = content.len(), "Paste request handled");
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        content,
    ))
}
