// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Why a request was rejected by the auth gate.
#[derive(Debug)]
pub enum AuthError {
    /// Fingerprint or signature header absent (or not ASCII)
    MissingAuthHeaders,
    /// Fingerprint not in the trust store
    UnknownPublicKey,
    /// Body could not be read
    BodyRead(String),
    /// Signature header is not base64
    InvalidSignatureEncoding,
    /// Signature bytes are not an SSH signature
    InvalidSignatureFormat,
    /// Signature does not match the body
    VerificationFailed,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeaders => "missing_auth_headers",
            AuthError::UnknownPublicKey => "unknown_public_key",
            AuthError::BodyRead(_) => "body_read_error",
            AuthError::InvalidSignatureEncoding => "invalid_signature_encoding",
            AuthError::InvalidSignatureFormat => "invalid_signature_format",
            AuthError::VerificationFailed => "signature_verification_failed",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeaders
            | AuthError::UnknownPublicKey
            | AuthError::VerificationFailed => StatusCode::UNAUTHORIZED,
            AuthError::InvalidSignatureEncoding | AuthError::InvalidSignatureFormat => {
                StatusCode::BAD_REQUEST
            }
            AuthError::BodyRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeaders => write!(f, "Missing authentication headers"),
            AuthError::UnknownPublicKey => write!(f, "Unauthorized public key"),
            AuthError::BodyRead(msg) => write!(f, "Cannot read body: {msg}"),
            AuthError::InvalidSignatureEncoding => write!(f, "Invalid signature encoding"),
            AuthError::InvalidSignatureFormat => write!(f, "Invalid signature format"),
            AuthError::VerificationFailed => write!(f, "Signature verification failed"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
