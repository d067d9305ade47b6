// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Translation of agent payloads into form field values.
//!
//! An agent posts a flat JSON object. Keys that already match a form field
//! key are copied straight through; configured mapping rules then translate
//! agent keys into form keys, overriding any direct copy of the same field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Flat key/value payload as supplied by the caller.
pub type Payload = BTreeMap<String, String>;

/// Request body errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("Invalid JSON data.")]
    InvalidJson,

    #[error("Request body could not be read.")]
    UnreadableBody,
}

/// A rule translating an agent key into a form field key.
///
/// Serialized with the `ai_key`/`nf_key` names used by stored settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(rename = "ai_key", default)]
    pub external_key: String,

    #[serde(rename = "nf_key", default)]
    pub internal_key: String,
}

impl FieldMapping {
    pub fn new(external_key: impl Into<String>, internal_key: impl Into<String>) -> Self {
        Self {
            external_key: external_key.into(),
            internal_key: internal_key.into(),
        }
    }

    /// Rules with either side blank are placeholders from the settings form.
    pub fn is_active(&self) -> bool {
        !self.external_key.is_empty() && !self.internal_key.is_empty()
    }
}

/// Build the form field values for a submission.
///
/// `direct_keys` are the form's own field keys. Mapping rules are applied
/// after direct copies, in order, so the last rule targeting a field wins.
pub fn map_submission<I, S>(payload: &Payload, direct_keys: I, rules: &[FieldMapping]) -> Payload
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut values = Payload::new();

    for key in direct_keys {
        let key = key.as_ref();
        if let Some(value) = payload.get(key) {
            values.insert(key.to_string(), sanitize_text_field(value));
        }
    }

    for rule in rules.iter().filter(|r| r.is_active()) {
        if let Some(value) = payload.get(&rule.external_key) {
            debug!(from = %rule.external_key, to = %rule.internal_key, "Applying field mapping");
            values.insert(rule.internal_key.clone(), sanitize_text_field(value));
        }
    }

    values
}

/// Decode a request body into a flat payload.
///
/// The body must be a non-empty JSON object. Strings pass through, numbers
/// and booleans are stringified, everything else is dropped.
pub fn payload_from_json(body: &[u8]) -> Result<Payload, MapError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| MapError::InvalidJson)?;
    let object = match value {
        Value::Object(map) if !map.is_empty() => map,
        _ => return Err(MapError::InvalidJson),
    };

    Ok(object
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => return None,
            };
            Some((key, value))
        })
        .collect())
}

/// Reduce user input to a single line of plain text.
///
/// - Markup tags are removed, along with `script` and `style` contents
/// - A `<` that does not open a tag becomes `&lt;`
/// - Control characters are dropped and runs of ASCII spaces, tabs and
///   line breaks collapse to a single space; other whitespace is kept
/// - Percent-encoded octets such as `%3C` are removed
pub fn sanitize_text_field(input: &str) -> String {
    let stripped = if input.contains('<') {
        strip_tags(input)
    } else {
        input.to_string()
    };

    let mut text = collapse_whitespace(&stripped);

    // Removing one octet can expose another (`%%4141`), so repeat.
    loop {
        let next = remove_percent_octets(&text);
        if next == text {
            break;
        }
        text = next;
    }

    collapse_whitespace(&text)
}

fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos..];

        let opens_tag = after[1..]
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
            .unwrap_or(false);

        match after.find('>') {
            Some(end) if opens_tag => {
                let tag = &after[1..end];
                rest = &after[end + 1..];
                if let Some(name) = raw_text_element(tag) {
                    rest = skip_past_closing(rest, name);
                }
            }
            _ => {
                out.push_str("&lt;");
                rest = &after[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// `script` and `style` have their contents removed along with the tags.
fn raw_text_element(tag: &str) -> Option<&'static str> {
    let name: String = tag
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    match name.as_str() {
        "script" => Some("script"),
        "style" => Some("style"),
        _ => None,
    }
}

fn skip_past_closing<'a>(rest: &'a str, name: &str) -> &'a str {
    let closing = format!("</{name}");
    let lower = rest.to_ascii_lowercase();
    match lower.find(&closing) {
        Some(start) => match rest[start..].find('>') {
            Some(end) => &rest[start + end + 1..],
            None => "",
        },
        None => "",
    }
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for c in input.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r') {
            pending_space = true;
        } else if c.is_control() {
            continue;
        } else {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        }
    }

    out
}

fn remove_percent_octets(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            i += 3;
            continue;
        }
        // Safe to step by char: '%' and hex digits are single-byte.
        let ch = input[i..].chars().next().unwrap_or_default();
        out.push(ch);
        i += ch.len_utf8().max(1);
    }

    out
}
