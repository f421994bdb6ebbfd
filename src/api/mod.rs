// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    auth::auth_gate,
    config::{ROUTE_COPY, ROUTE_OPEN, ROUTE_PASTE, ROUTE_QUIT},
    state::AppState,
};

pub mod clipboard;
pub mod control;

/// Every route sits behind the signature gate. Request bodies are unbounded.
pub fn router(state: AppState) -> Router {
    let gate = middleware::from_fn_with_state(state.trust_store.clone(), auth_gate);

    Router::new()
        .route(ROUTE_COPY, post(clipboard::copy))
        .route(ROUTE_PASTE, get(clipboard::paste))
        .route(ROUTE_OPEN, post(control::open))
        .route(ROUTE_QUIT, post(control::quit))
        .route_layer(gate)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::auth::testing::generate_identity;
    use crate::auth::{SigningIdentity, TrustStore};
    use crate::clipboard::{ClipboardManager, ManagerSettings};
    use crate::config::{HEADER_FINGERPRINT, HEADER_SIGNATURE};
    use crate::opener::{OpenError, UrlOpener};

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
        fail: bool,
    }

    impl UrlOpener for RecordingOpener {
        fn open(&self, target: &str) -> Result<(), OpenError> {
            if self.fail {
                return Err(OpenError::Failed {
                    program: "xdg-open".to_string(),
                    status: "exit status: 3".to_string(),
                });
            }
            self.opened.lock().unwrap().push(target.to_string());
            Ok(())
        }
    }

    struct Harness {
        app: Router,
        identity: SigningIdentity,
        opener: Arc<RecordingOpener>,
        shutdown: CancellationToken,
    }

    fn harness_with(opener: RecordingOpener) -> Harness {
        let identity = generate_identity();
        let mut trust_store = TrustStore::default();
        trust_store.insert(identity.public_key().clone());

        let shutdown = CancellationToken::new();
        let clipboard = ClipboardManager::new(None, ManagerSettings::default(), shutdown.clone());
        let opener = Arc::new(opener);
        let state = AppState::new(clipboard, trust_store, opener.clone(), shutdown.clone());

        Harness {
            app: router(state),
            identity,
            opener,
            shutdown,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingOpener::default())
    }

    fn signed(identity: &SigningIdentity, method: Method, uri: &str, body: &[u8]) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(HEADER_FINGERPRINT, identity.fingerprint())
            .header(HEADER_SIGNATURE, identity.signature_header(body).unwrap())
            .body(Body::from(body.to_vec()))
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn copy_then_paste_round_trips_binary() {
        let h = harness();
        let data = b"\x00binary\xff clipboard".to_vec();

        let response = h
            .app
            .clone()
            .oneshot(signed(&h.identity, Method::POST, "/copy", &data))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = h
            .app
            .oneshot(signed(&h.identity, Method::GET, "/paste", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "application/octet-stream"
        );
        assert_eq!(body_bytes(response).await, data);
    }

    #[tokio::test]
    async fn large_bodies_are_accepted() {
        let h = harness();
        let data = vec![b'x'; 4 * 1024 * 1024];

        let response = h
            .app
            .oneshot(signed(&h.identity, Method::POST, "/copy", &data))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_headers_are_unauthorized() {
        let h = harness();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/copy")
            .body(Body::from("hello"))
            .unwrap();

        let response = h.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_key_is_unauthorized() {
        let h = harness();
        let stranger = generate_identity();

        let response = h
            .app
            .oneshot(signed(&stranger, Method::POST, "/copy", b"hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["error_code"], "unknown_public_key");
    }

    #[tokio::test]
    async fn bad_signature_encoding_is_bad_request() {
        let h = harness();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/copy")
            .header(HEADER_FINGERPRINT, h.identity.fingerprint())
            .header(HEADER_SIGNATURE, "!!not-base64!!")
            .body(Body::from("hello"))
            .unwrap();

        let response = h.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tampered_body_is_rejected_and_not_copied() {
        let h = harness();
        let mut request = signed(&h.identity, Method::POST, "/copy", b"original");
        *request.body_mut() = Body::from("tampered");

        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = h
            .app
            .oneshot(signed(&h.identity, Method::GET, "/paste", b""))
            .await
            .unwrap();
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn open_passes_url_to_opener() {
        let h = harness();
        let response = h
            .app
            .oneshot(signed(
                &h.identity,
                Method::POST,
                "/open",
                b"https://example.com/page",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *h.opener.opened.lock().unwrap(),
            vec!["https://example.com/page".to_string()]
        );
    }

    #[tokio::test]
    async fn open_failure_is_internal_error() {
        let h = harness_with(RecordingOpener {
            fail: true,
            ..Default::default()
        });
        let response = h
            .app
            .oneshot(signed(&h.identity, Method::POST, "/open", b"https://example.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn quit_acknowledges_and_cancels() {
        let h = harness();
        assert!(!h.shutdown.is_cancelled());

        let response = h
            .app
            .oneshot(signed(&h.identity, Method::POST, "/quit", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(h.shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn unsigned_quit_does_nothing() {
        let h = harness();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/quit")
            .body(Body::empty())
            .unwrap();

        let response = h.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!h.shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let h = harness();
        let response = h
            .app
            .oneshot(signed(&h.identity, Method::GET, "/nope", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
