// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! MCP Gateway
//!
//! A signed REST surface that lets an external AI agent talk to a site:
//!
//! - Discover the field schema of the configured inquiry form
//! - Submit inquiries, translating agent keys into form field keys
//! - List published reports and fetch their attached files
//!
//! Every `/mcp/v1` route is gated by a timestamped HMAC-SHA256 signature
//! over the raw request body (see [`signature`]). Storage lives behind the
//! collaborator traits in [`backend`].

pub mod auth;
pub mod backend;
pub mod blocks;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mapper;
pub mod metrics;
pub mod reports;
pub mod settings;
pub mod signature;
pub mod site;

pub use config::Config;
pub use error::ApiError;
pub use handlers::{router, AppState};
pub use mapper::{map_submission, FieldMapping};
pub use reports::{extract_files, FileReference, Report};
pub use settings::Settings;
pub use signature::{sign, verify, SignatureError};
