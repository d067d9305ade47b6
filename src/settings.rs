// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Administrator-managed settings record.
//!
//! The record is read fresh for every request so edits take effect without
//! a restart. Field names match the option keys of the settings screen so an
//! exported option can be dropped in as-is.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::mapper::FieldMapping;
use crate::signature::generate_secret_token;

/// Settings storage errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed settings record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Settings lock poisoned")]
    Poisoned,
}

/// The persisted settings record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "mcp_server_secret_token", default)]
    pub secret_token: String,

    /// 0 means unset.
    #[serde(rename = "mcp_ninja_form_id", default, deserialize_with = "lenient_id")]
    pub form_id: u64,

    #[serde(rename = "mcp_ninja_field_mappings", default)]
    pub field_mappings: Vec<FieldMapping>,

    #[serde(rename = "mcp_report_taxonomy", default)]
    pub report_taxonomy: String,

    /// 0 means unset.
    #[serde(rename = "mcp_report_term", default, deserialize_with = "lenient_id")]
    pub report_term_id: u64,
}

impl Settings {
    /// Fresh settings with a generated secret and one blank mapping row.
    pub fn bootstrap() -> Self {
        Self {
            secret_token: generate_secret_token(),
            field_mappings: vec![FieldMapping::default()],
            ..Default::default()
        }
    }

    pub fn form_id(&self) -> Option<u64> {
        (self.form_id != 0).then_some(self.form_id)
    }

    /// Taxonomy and term of the report listing, when both are set.
    pub fn report_source(&self) -> Option<(&str, u64)> {
        if self.report_taxonomy.is_empty() || self.report_term_id == 0 {
            None
        } else {
            Some((self.report_taxonomy.as_str(), self.report_term_id))
        }
    }
}

/// Accept ids stored as numbers, numeric strings, or empty strings.
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(0),
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom(format!("invalid id {n}"))),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(0),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid id {s:?}"))),
        other => Err(de::Error::custom(format!("invalid id {other}"))),
    }
}

/// Persistent home of the settings record.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Settings, SettingsError>;
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Settings kept in a JSON file. A missing file reads as default settings.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn io_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Settings file missing, using defaults");
                Ok(Settings::default())
            }
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let json = serde_json::to_vec_pretty(settings)?;
        // Write then rename so readers never see a half-written record.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

/// Settings held in memory.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    inner: RwLock<Settings>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        self.inner
            .read()
            .map(|s| s.clone())
            .map_err(|_| SettingsError::Poisoned)
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let mut guard = self.inner.write().map_err(|_| SettingsError::Poisoned)?;
        *guard = settings.clone();
        Ok(())
    }
}
