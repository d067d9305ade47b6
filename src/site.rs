// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! In-memory site: forms, posts and attachments.
//!
//! Backs the binary when pointed at a JSON fixture and gives the HTTP tests
//! a host to talk to. A fixture without a `forms` section models a site
//! where the form plugin is not installed.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::info;

use crate::backend::{
    BackendError, ContentStore, FormBackend, FormField, FormIntegration, MediaStore, Post,
};
use crate::reports::FileReference;

/// A form and its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

/// A media library entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub mime_type: String,
}

/// A stored submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub form_id: u64,
    pub values: BTreeMap<String, String>,
}

/// Fixture file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteData {
    #[serde(default)]
    pub forms: Option<Vec<Form>>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// In-memory implementation of every content collaborator.
#[derive(Debug, Default)]
pub struct MemorySite {
    forms: Option<BTreeMap<u64, Form>>,
    posts: Vec<Post>,
    attachments: HashMap<u64, Attachment>,
    submissions: RwLock<Vec<Submission>>,
}

impl MemorySite {
    pub fn new(data: SiteData) -> Self {
        Self {
            forms: data
                .forms
                .map(|forms| forms.into_iter().map(|f| (f.id, f)).collect()),
            posts: data.posts,
            attachments: data
                .attachments
                .into_iter()
                .map(|a| (a.id, a))
                .collect(),
            submissions: RwLock::new(Vec::new()),
        }
    }

    /// Load a fixture file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)?;
        let data: SiteData = serde_json::from_slice(&bytes)?;
        info!(
            path = %path.display(),
            forms = ?data.forms.as_ref().map(Vec::len),
            posts = data.posts.len(),
            attachments = data.attachments.len(),
            "Loaded site data"
        );
        Ok(Self::new(data))
    }

    /// The form integration this site offers.
    pub fn form_integration(self: &Arc<Self>) -> FormIntegration {
        if self.forms.is_some() {
            FormIntegration::Available(self.clone())
        } else {
            FormIntegration::Unavailable
        }
    }

    /// Submissions received so far, oldest first.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl FormBackend for MemorySite {
    fn fields(&self, form_id: u64) -> Result<Vec<FormField>, BackendError> {
        let forms = self
            .forms
            .as_ref()
            .ok_or_else(|| BackendError::Unavailable("no form plugin".to_string()))?;
        Ok(forms
            .get(&form_id)
            .map(|form| form.fields.clone())
            .unwrap_or_default())
    }

    fn save_submission(
        &self,
        form_id: u64,
        values: &BTreeMap<String, String>,
    ) -> Result<(), BackendError> {
        let forms = self
            .forms
            .as_ref()
            .ok_or_else(|| BackendError::Unavailable("no form plugin".to_string()))?;
        if !forms.contains_key(&form_id) {
            return Err(BackendError::UnknownForm(form_id));
        }

        let mut submissions = self
            .submissions
            .write()
            .map_err(|_| BackendError::Unavailable("submission log poisoned".to_string()))?;
        submissions.push(Submission {
            form_id,
            values: values.clone(),
        });
        Ok(())
    }
}

impl ContentStore for MemorySite {
    fn post(&self, id: u64) -> Option<Post> {
        self.posts.iter().find(|p| p.id == id).cloned()
    }

    fn posts_with_term(&self, taxonomy: &str, term_id: u64) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|p| p.has_term(taxonomy, term_id))
            .cloned()
            .collect()
    }
}

impl MediaStore for MemorySite {
    fn resolve_attachment(&self, id: u64) -> Option<FileReference> {
        let attachment = self.attachments.get(&id)?;
        let url = attachment.url.as_deref().filter(|u| !u.is_empty())?;
        Some(FileReference {
            id,
            file_name: attachment.title.clone(),
            url: url.to_string(),
            mime_type: attachment.mime_type.clone(),
        })
    }
}
