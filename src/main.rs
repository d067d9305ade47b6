// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! MCP Gateway Service
//!
//! Serves the signed `/mcp/v1` API for AI agents:
//!
//! - `POST /mcp/v1/inquiry/schema`: form field schema
//! - `POST /mcp/v1/inquiry`: inquiry submission
//! - `GET /mcp/v1/reports`: report listing
//! - `GET /mcp/v1/reports/:id`: files of one report
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `SETTINGS_PATH`: Settings record (default: mcp-settings.json). Created
//!   with a fresh secret token when missing.
//! - `SITE_DATA_PATH`: JSON fixture with forms, posts and attachments
//! - `PUBLIC_BASE_URL`: Base URL advertised by the discovery document
//! - `SIGNATURE_WINDOW_SECS`: Allowed clock skew (default: 300)
//! - `MAX_BODY_BYTES`: Largest accepted request body (default: 1 MiB)
//! - `METRICS_ENABLED`: Serve `/metrics` (default: true)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mcp_gateway::{
    config::Config,
    handlers::{router, AppState},
    settings::{JsonFileSettingsStore, Settings, SettingsStore},
    site::{MemorySite, SiteData},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        settings_path = %config.settings_path.display(),
        signature_window_secs = config.auth.signature_window_secs,
        metrics_enabled = config.metrics.enabled,
        "Starting MCP gateway"
    );

    let settings = JsonFileSettingsStore::new(&config.settings_path);
    if !settings.exists() {
        settings.save(&Settings::bootstrap())?;
        info!(
            path = %settings.path().display(),
            "Created settings record with a generated secret token"
        );
    }

    let site = Arc::new(match &config.site_data_path {
        Some(path) => MemorySite::load(path)?,
        None => {
            warn!("SITE_DATA_PATH not set; serving an empty site without a form backend");
            MemorySite::new(SiteData::default())
        }
    });

    let forms = site.form_integration();
    if !forms.is_available() {
        warn!("Form backend not available; inquiry routes will answer 501");
    }

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(settings),
        forms,
        site.clone(),
        site,
    )?);
    info!(discovery_url = %state.discovery_url(), "API root");

    let app = router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
