// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request signature gate for Axum.
//!
//! Applied to every route with `route_layer`, so unknown paths still get a
//! plain 404. The gate buffers the whole body, verifies the signature over
//! it and hands the same bytes on to the handler.
//!
//! ## Check Order
//!
//! 1. Both headers present, else 401
//! 2. Fingerprint trusted, else 401
//! 3. Body readable, else 500
//! 4. Signature header decodes, else 400
//! 5. Signature verifies over the body, else 401

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::trust_store::TrustStore;
use super::wire::{self, SignatureDecodeError};
use super::AuthError;
use crate::config::{HEADER_FINGERPRINT, HEADER_SIGNATURE};

/// Authenticated caller, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct VerifiedKey {
    pub fingerprint: String,
}

/// Middleware function; use with `from_fn_with_state`.
pub async fn auth_gate(
    State(trust_store): State<Arc<TrustStore>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let Some((fingerprint, signature)) = auth_headers(&parts.headers) else {
        debug!(path = %parts.uri.path(), "Request without auth headers");
        return AuthError::MissingAuthHeaders.into_response();
    };

    // Unknown keys are rejected before the body is read.
    if trust_store.get(&fingerprint).is_none() {
        warn!(%fingerprint, "Request signed by unknown key");
        return AuthError::UnknownPublicKey.into_response();
    }

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => return AuthError::BodyRead(e.to_string()).into_response(),
    };

    if let Err(e) = verify_request(&trust_store, &fingerprint, &signature, &bytes) {
        warn!(%fingerprint, error_code = e.error_code(), "Rejected request signature");
        return e.into_response();
    }

    parts.extensions.insert(VerifiedKey { fingerprint });
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn auth_headers(headers: &HeaderMap) -> Option<(String, String)> {
    let fingerprint = headers.get(HEADER_FINGERPRINT)?.to_str().ok()?;
    let signature = headers.get(HEADER_SIGNATURE)?.to_str().ok()?;
    if fingerprint.is_empty() || signature.is_empty() {
        return None;
    }
    Some((fingerprint.to_string(), signature.to_string()))
}

/// Check `signature` (header text) for `body` against the key named by
/// `fingerprint`.
pub fn verify_request(
    trust_store: &TrustStore,
    fingerprint: &str,
    signature: &str,
    body: &Bytes,
) -> Result<(), AuthError> {
    let key = trust_store
        .get(fingerprint)
        .ok_or(AuthError::UnknownPublicKey)?;

    let signature = wire::decode_signature(signature).map_err(|e| match e {
        SignatureDecodeError::Encoding => AuthError::InvalidSignatureEncoding,
        SignatureDecodeError::Format(_) => AuthError::InvalidSignatureFormat,
    })?;

    wire::verify_payload(key, body, &signature).map_err(|_| AuthError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::generate_identity;

    fn store_with(identity: &crate::auth::SigningIdentity) -> TrustStore {
        let mut store = TrustStore::default();
        store.insert(identity.public_key().clone());
        store
    }

    #[test]
    fn valid_signature_passes() {
        let identity = generate_identity();
        let store = store_with(&identity);
        let body = Bytes::from_static(b"payload");
        let header = identity.signature_header(&body).unwrap();

        verify_request(&store, identity.fingerprint(), &header, &body).unwrap();
    }

    #[test]
    fn empty_body_is_signed_too() {
        let identity = generate_identity();
        let store = store_with(&identity);
        let header = identity.signature_header(b"").unwrap();

        verify_request(&store, identity.fingerprint(), &header, &Bytes::new()).unwrap();
        assert!(matches!(
            verify_request(&store, identity.fingerprint(), &header, &Bytes::from_static(b"x")),
            Err(AuthError::VerificationFailed)
        ));
    }

    #[test]
    fn unknown_fingerprint_is_rejected() {
        let trusted = generate_identity();
        let stranger = generate_identity();
        let store = store_with(&trusted);
        let header = stranger.signature_header(b"payload").unwrap();

        assert!(matches!(
            verify_request(
                &store,
                stranger.fingerprint(),
                &header,
                &Bytes::from_static(b"payload")
            ),
            Err(AuthError::UnknownPublicKey)
        ));
    }

    #[test]
    fn signature_by_other_key_under_trusted_fingerprint_fails() {
        let trusted = generate_identity();
        let stranger = generate_identity();
        let store = store_with(&trusted);
        let header = stranger.signature_header(b"payload").unwrap();

        assert!(matches!(
            verify_request(
                &store,
                trusted.fingerprint(),
                &header,
                &Bytes::from_static(b"payload")
            ),
            Err(AuthError::VerificationFailed)
        ));
    }

    #[test]
    fn malformed_headers_map_to_bad_request_variants() {
        let identity = generate_identity();
        let store = store_with(&identity);
        let body = Bytes::from_static(b"payload");

        assert!(matches!(
            verify_request(&store, identity.fingerprint(), "%%%", &body),
            Err(AuthError::InvalidSignatureEncoding)
        ));
        assert!(matches!(
            verify_request(&store, identity.fingerprint(), "AAAA", &body),
            Err(AuthError::InvalidSignatureFormat)
        ));
    }

    #[test]
    fn headers_must_both_be_present() {
        let mut headers = HeaderMap::new();
        assert!(auth_headers(&headers).is_none());

        headers.insert(HEADER_FINGERPRINT, "SHA256:abc".parse().unwrap());
        assert!(auth_headers(&headers).is_none());

        headers.insert(HEADER_SIGNATURE, "c2ln".parse().unwrap());
        assert_eq!(
            auth_headers(&headers),
            Some(("SHA256:abc".to_string(), "c2ln".to_string()))
        );
    }
}
