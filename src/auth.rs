// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Signature middleware for the `/mcp/v1` routes.
//!
//! Loads the settings record once, buffers the raw body, verifies the
//! signature and hands both the settings snapshot and the body bytes on to
//! the handler through request extensions.

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::mapper::MapError;
use crate::settings::Settings;
use crate::signature::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Raw request body as it was signed.
#[derive(Debug, Clone)]
pub struct RawBody(pub Bytes);

/// Settings snapshot for the current request.
#[derive(Debug, Clone)]
pub struct SettingsSnapshot(pub Arc<Settings>);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Buffer at most `limit` bytes of `body`.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    to_bytes(body, limit).await.map_err(|err| {
        if exceeds_limit(&err) {
            ApiError::BodyTooLarge(limit)
        } else {
            debug!(error = %err, "Failed to read request body");
            ApiError::Validation(MapError::UnreadableBody)
        }
    })
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Reject requests whose signature does not verify.
pub async fn require_signature(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let settings = state.settings.load()?;

    let (mut parts, body) = request.into_parts();
    let bytes = read_body(body, state.config.auth.max_body_bytes).await?;

    let verifier = SignatureVerifier::new(&settings.secret_token)
        .with_window(state.config.auth.signature_window_secs);
    let now = chrono::Utc::now().timestamp();

    if let Err(err) = verifier.verify(
        header(&parts.headers, TIMESTAMP_HEADER),
        header(&parts.headers, SIGNATURE_HEADER),
        &bytes,
        now,
    ) {
        state.metrics.record_auth_failure(err.reason());
        if err.is_config_fault() {
            warn!(path = %parts.uri.path(), "Rejecting request: secret token not configured");
        } else {
            warn!(path = %parts.uri.path(), reason = err.reason(), "Rejecting unsigned or mis-signed request");
        }
        return Err(err.into());
    }

    debug!(path = %parts.uri.path(), body_len = bytes.len(), "Signature verified");

    parts.extensions.insert(SettingsSnapshot(Arc::new(settings)));
    parts.extensions.insert(RawBody(bytes.clone()));
    let request = Request::from_parts(parts, Body::from(bytes));

    Ok(next.run(request).await)
}
