// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Collaborator interfaces.
//!
//! The gateway owns no data. Forms, posts and attachments live in systems
//! reached through these traits; [`crate::site`] provides an in-memory
//! implementation of all of them.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::reports::FileReference;

/// Errors raised by collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Form {0} does not exist")]
    UnknownForm(u64),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// One field of a form as reported by the form backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub required: bool,
    #[serde(default, alias = "desc_text")]
    pub description: String,
}

/// Form storage.
pub trait FormBackend: Send + Sync {
    /// Fields of `form_id` in display order. Unknown forms have no fields.
    fn fields(&self, form_id: u64) -> Result<Vec<FormField>, BackendError>;

    /// Persist one submission for `form_id`.
    fn save_submission(
        &self,
        form_id: u64,
        values: &BTreeMap<String, String>,
    ) -> Result<(), BackendError>;
}

/// Whether a form backend is installed. Decided once at startup.
#[derive(Clone, Default)]
pub enum FormIntegration {
    Available(Arc<dyn FormBackend>),
    #[default]
    Unavailable,
}

impl FormIntegration {
    pub fn backend(&self) -> Option<&Arc<dyn FormBackend>> {
        match self {
            FormIntegration::Available(backend) => Some(backend),
            FormIntegration::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend().is_some()
    }
}

impl std::fmt::Debug for FormIntegration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormIntegration::Available(_) => write!(f, "FormIntegration::Available"),
            FormIntegration::Unavailable => write!(f, "FormIntegration::Unavailable"),
        }
    }
}

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Publish,
    Draft,
    Pending,
    Private,
    Future,
    Trash,
}

/// A taxonomy term attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRef {
    pub taxonomy: String,
    pub term_id: u64,
}

/// A content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub permalink: String,
    pub status: PostStatus,
    #[serde(default = "default_post_type")]
    pub post_type: String,
    /// Serialized block markup
    #[serde(default)]
    pub content: String,
    pub modified: DateTime<FixedOffset>,
    #[serde(default)]
    pub terms: Vec<TermRef>,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Publish
    }

    pub fn has_term(&self, taxonomy: &str, term_id: u64) -> bool {
        self.terms
            .iter()
            .any(|t| t.taxonomy == taxonomy && t.term_id == term_id)
    }
}

fn default_post_type() -> String {
    "post".to_string()
}

/// Post storage.
pub trait ContentStore: Send + Sync {
    fn post(&self, id: u64) -> Option<Post>;

    /// Posts of any status carrying `term_id` in `taxonomy`.
    fn posts_with_term(&self, taxonomy: &str, term_id: u64) -> Vec<Post>;
}

/// Attachment storage.
pub trait MediaStore: Send + Sync {
    /// Resolve an attachment id. `None` when it has no downloadable URL.
    fn resolve_attachment(&self, id: u64) -> Option<FileReference>;
}

/// Truthiness of a stored flag.
///
/// Form builders store the required flag as whatever their UI produced.
/// Every non-empty string other than `"0"` is set, including `"false"`.
pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        serde_json::Value::String(s) => !matches!(s.as_str(), "" | "0"),
        serde_json::Value::Null => false,
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    })
}
