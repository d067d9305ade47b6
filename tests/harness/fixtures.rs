// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixture sites and gateway wiring.

use axum::Router;
use std::sync::Arc;

use mcp_gateway::{
    config::Config,
    handlers::{router, AppState},
    mapper::FieldMapping,
    settings::{MemorySettingsStore, Settings},
    site::{MemorySite, SiteData},
};

pub const SECRET: &str = "0f1e2d3c4b5a69788796a5b4c3d2e1f00f1e2d3c4b5a69788796a5b4c3d2e1f0";
pub const FORM_ID: u64 = 3;
pub const TAXONOMY: &str = "category";
pub const REPORT_TERM: u64 = 4;

/// Settings pointing at the fixture form and report term.
pub fn settings() -> Settings {
    Settings {
        secret_token: SECRET.to_string(),
        form_id: FORM_ID,
        field_mappings: vec![
            FieldMapping::new("user_name", "name"),
            FieldMapping::new("", ""),
            FieldMapping::new("body", "message"),
        ],
        report_taxonomy: TAXONOMY.to_string(),
        report_term_id: REPORT_TERM,
    }
}

/// A small site: one contact form, a handful of posts, three attachments.
///
/// Posts:
/// - 10: published report with files 5 and 6 (6 has no URL)
/// - 11: published, tagged, but no file block
/// - 12: published file post under another term
/// - 13: published, tagged, only an unresolvable file
/// - 42: draft report with file 5
/// - 50: published report whose file sits inside a group block
pub fn site_data() -> SiteData {
    serde_json::from_value(serde_json::json!({
        "forms": [{
            "id": FORM_ID,
            "title": "Contact",
            "fields": [
                {"key": "name", "label": "Name", "type": "textbox", "required": "1"},
                {"key": "email", "label": "Email", "type": "email", "required": true,
                 "desc_text": "We reply here"},
                {"key": "message", "label": "Message", "type": "textarea", "required": 0}
            ]
        }],
        "posts": [
            {
                "id": 10, "title": "Q1 Report", "permalink": "https://example.com/q1-report/",
                "status": "publish", "modified": "2024-04-02T08:00:00+09:00",
                "terms": [{"taxonomy": TAXONOMY, "term_id": REPORT_TERM}],
                "content": "<!-- wp:paragraph --><p>Summary</p><!-- /wp:paragraph -->\n<!-- wp:file {\"id\":5} --><div class=\"wp-block-file\"></div><!-- /wp:file -->\n<!-- wp:file {\"id\":6} --><div class=\"wp-block-file\"></div><!-- /wp:file -->"
            },
            {
                "id": 11, "title": "Announcement", "permalink": "https://example.com/news/",
                "status": "publish", "modified": "2024-04-03T00:00:00+00:00",
                "terms": [{"taxonomy": TAXONOMY, "term_id": REPORT_TERM}],
                "content": "<!-- wp:paragraph --><p>No files here</p><!-- /wp:paragraph -->"
            },
            {
                "id": 12, "title": "Other", "permalink": "https://example.com/other/",
                "status": "publish", "modified": "2024-04-04T00:00:00+00:00",
                "terms": [{"taxonomy": TAXONOMY, "term_id": 99}],
                "content": "<!-- wp:file {\"id\":5} /-->"
            },
            {
                "id": 13, "title": "Broken", "permalink": "https://example.com/broken/",
                "status": "publish", "modified": "2024-04-05T00:00:00+00:00",
                "terms": [{"taxonomy": TAXONOMY, "term_id": REPORT_TERM}],
                "content": "<!-- wp:file {\"id\":6} /-->"
            },
            {
                "id": 42, "title": "Draft", "permalink": "https://example.com/?p=42",
                "status": "draft", "modified": "2024-04-06T00:00:00+00:00",
                "terms": [{"taxonomy": TAXONOMY, "term_id": REPORT_TERM}],
                "content": "<!-- wp:file {\"id\":5} /-->"
            },
            {
                "id": 50, "title": "Annual Report", "permalink": "https://example.com/annual/",
                "status": "publish", "modified": "2024-12-31T23:59:59+00:00",
                "terms": [{"taxonomy": TAXONOMY, "term_id": REPORT_TERM}],
                "content": "<!-- wp:group --><div><!-- wp:file {\"id\":7} /--></div><!-- /wp:group -->"
            }
        ],
        "attachments": [
            {"id": 5, "title": "q1-results.pdf", "url": "https://example.com/uploads/q1-results.pdf",
             "mime_type": "application/pdf"},
            {"id": 6, "title": "missing.xlsx", "url": null,
             "mime_type": "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"},
            {"id": 7, "title": "annual.pdf", "url": "https://example.com/uploads/annual.pdf",
             "mime_type": "application/pdf"}
        ]
    }))
    .expect("fixture site data")
}

/// A running gateway over a fixture site.
pub struct Gateway {
    pub app: Router,
    pub site: Arc<MemorySite>,
    pub settings: Arc<MemorySettingsStore>,
    pub state: Arc<AppState>,
}

/// Wire the router over `data` with `settings`.
pub fn gateway_with(settings: Settings, data: SiteData) -> Gateway {
    let site = Arc::new(MemorySite::new(data));
    let store = Arc::new(MemorySettingsStore::new(settings));
    let config = Config {
        public_base_url: "https://example.com/".to_string(),
        ..Config::default()
    };
    let state = Arc::new(
        AppState::new(
            config,
            store.clone(),
            site.form_integration(),
            site.clone(),
            site.clone(),
        )
        .expect("app state"),
    );
    Gateway {
        app: router(state.clone()),
        site,
        settings: store,
        state,
    }
}

/// The standard fixture gateway.
pub fn gateway() -> Gateway {
    gateway_with(settings(), site_data())
}
