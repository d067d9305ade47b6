// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request builders and response helpers.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use mcp_gateway::signature::{sign, SIGNATURE_HEADER, TIMESTAMP_HEADER};

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// A request signed with `secret` at timestamp `ts`.
pub fn signed_at(method: Method, uri: &str, secret: &str, body: &str, ts: i64) -> Request<Body> {
    let ts = ts.to_string();
    let signature = sign(secret, &ts, body.as_bytes());
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header(TIMESTAMP_HEADER, ts)
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// A request signed with `secret` right now.
pub fn signed(method: Method, uri: &str, secret: &str, body: &str) -> Request<Body> {
    signed_at(method, uri, secret, body, now())
}

/// A request without auth headers.
pub fn unsigned(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Send a request through the router.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("infallible router")
}

/// Send and decode a JSON response.
pub async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = send(app, request).await;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json response")
    };
    (status, json)
}

/// Send and return the body as text.
pub async fn send_text(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = send(app, request).await;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    (status, String::from_utf8_lossy(&bytes).into_owned())
}
