// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers and the route table.
//!
//! Routes under `/mcp/v1` sit behind [`require_signature`]; health,
//! discovery and metrics are open.

use axum::{
    extract::{MatchedPath, Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{require_signature, RawBody, SettingsSnapshot};
use crate::backend::{ContentStore, FormField, FormIntegration, MediaStore};
use crate::blocks::parse_blocks;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::mapper::{map_submission, payload_from_json};
use crate::metrics::Metrics;
use crate::reports::{extract_files, list_reports, FileReference, Report};
use crate::settings::SettingsStore;

/// Prefix of the signed API.
pub const API_PREFIX: &str = "/mcp/v1";

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub settings: Arc<dyn SettingsStore>,
    pub forms: FormIntegration,
    pub content: Arc<dyn ContentStore>,
    pub media: Arc<dyn MediaStore>,
    pub metrics: Metrics,
    discovery_url: String,
}

impl AppState {
    pub fn new(
        config: Config,
        settings: Arc<dyn SettingsStore>,
        forms: FormIntegration,
        content: Arc<dyn ContentStore>,
        media: Arc<dyn MediaStore>,
    ) -> anyhow::Result<Self> {
        let discovery_url = discovery_url(&config.public_base_url)?;
        Ok(Self {
            config,
            settings,
            forms,
            content,
            media,
            metrics: Metrics::new()?,
            discovery_url,
        })
    }

    /// Absolute URL of the signed API root.
    pub fn discovery_url(&self) -> &str {
        &self.discovery_url
    }
}

fn discovery_url(base: &str) -> anyhow::Result<String> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join("mcp/v1/")?.to_string())
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Successful inquiry response.
#[derive(Debug, Serialize)]
pub struct InquiryResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Build the full route table.
pub fn router(state: Arc<AppState>) -> Router {
    let signed = Router::new()
        .route("/inquiry/schema", post(inquiry_schema).fallback(no_route))
        .route("/inquiry", post(submit_inquiry).fallback(no_route))
        .route("/reports", get(reports_list).fallback(no_route))
        .route("/reports/:id", get(report_files).fallback(no_route))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_signature,
        ));

    let mut app = Router::new()
        .route("/", get(discovery).fallback(no_route))
        .route("/health", get(health).fallback(no_route))
        .route("/healthz", get(health).fallback(no_route))
        .nest(API_PREFIX, signed);

    if state.config.metrics.enabled {
        app = app.route(
            &state.config.metrics.path,
            get(metrics_endpoint).fallback(no_route),
        );
    }

    // Unknown paths and wrong methods both answer `rest_no_route`.
    app.fallback(no_route)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(state.clone(), track_requests)),
        )
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "mcp-gateway",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Discovery document advertising the API root.
pub async fn discovery(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html><head>\n<link rel=\"mcp-protocol\" href=\"{}\" />\n</head><body></body></html>\n",
        state.discovery_url()
    ))
}

/// Prometheus scrape endpoint.
pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn no_route() -> ApiError {
    ApiError::NoRoute
}

/// Count every response by matched route and status.
async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let response = next.run(request).await;
    state
        .metrics
        .record_request(&route, response.status().as_u16());
    response
}

/// Form id named in a schema request body, if any.
///
/// The body is optional and may carry the id as a number or a string.
fn requested_form_id(body: &[u8]) -> Option<u64> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let id = match value.get("form_id")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (id != 0).then_some(id)
}

/// `POST /mcp/v1/inquiry/schema`: field schema of a form.
pub async fn inquiry_schema(
    State(state): State<Arc<AppState>>,
    Extension(SettingsSnapshot(settings)): Extension<SettingsSnapshot>,
    Extension(RawBody(body)): Extension<RawBody>,
) -> Result<Json<Vec<FormField>>> {
    let backend = state.forms.backend().ok_or(ApiError::UpstreamUnavailable)?;

    let form_id = requested_form_id(&body)
        .or_else(|| settings.form_id())
        .ok_or(ApiError::MissingFormId)?;

    let fields = backend.fields(form_id)?;
    debug!(form_id, fields = fields.len(), "Serving form schema");
    Ok(Json(fields))
}

/// `POST /mcp/v1/inquiry`: submit an inquiry to the configured form.
pub async fn submit_inquiry(
    State(state): State<Arc<AppState>>,
    Extension(SettingsSnapshot(settings)): Extension<SettingsSnapshot>,
    Extension(RawBody(body)): Extension<RawBody>,
) -> Result<Json<InquiryResponse>> {
    let backend = state.forms.backend().ok_or(ApiError::UpstreamUnavailable)?;
    let form_id = settings
        .form_id()
        .ok_or_else(|| ApiError::Config("Form ID is not configured.".to_string()))?;

    let payload = payload_from_json(&body).map_err(|e| {
        state.metrics.record_inquiry("invalid");
        e
    })?;

    let fields = backend.fields(form_id)?;
    let values = map_submission(
        &payload,
        fields.iter().map(|f| f.key.as_str()),
        &settings.field_mappings,
    );

    if let Err(e) = backend.save_submission(form_id, &values) {
        state.metrics.record_inquiry("failed");
        return Err(e.into());
    }

    state.metrics.record_inquiry("saved");
    info!(
        form_id,
        received = payload.len(),
        stored = values.len(),
        "Inquiry submitted"
    );

    Ok(Json(InquiryResponse {
        status: "success",
        message: "Inquiry submitted successfully.",
    }))
}

/// `GET /mcp/v1/reports`: published reports for the configured term.
pub async fn reports_list(
    State(state): State<Arc<AppState>>,
    Extension(SettingsSnapshot(settings)): Extension<SettingsSnapshot>,
) -> Result<Json<Vec<Report>>> {
    let (taxonomy, term_id) = settings
        .report_source()
        .ok_or_else(|| ApiError::Config("Report listing is not configured.".to_string()))?;

    Ok(Json(list_reports(state.content.as_ref(), taxonomy, term_id)))
}

/// `GET /mcp/v1/reports/:id`: files attached to one report.
pub async fn report_files(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FileReference>>> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::NoRoute);
    }
    let id: u64 = id.parse().map_err(|_| ApiError::NotFound)?;

    let post = state
        .content
        .post(id)
        .filter(|p| p.is_published())
        .ok_or(ApiError::NotFound)?;

    let files = extract_files(&parse_blocks(&post.content), state.media.as_ref());
    if files.is_empty() {
        debug!(post_id = id, "Report has no resolvable files");
        return Err(ApiError::NoFilesFound);
    }

    Ok(Json(files))
}
