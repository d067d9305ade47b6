// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Parser for serialized block markup.
//!
//! Post content stores blocks as HTML comment delimiters:
//!
//! ```text
//! <!-- wp:file {"id":42,"href":"..."} -->
//! <div class="wp-block-file">...</div>
//! <!-- /wp:file -->
//! <!-- wp:separator /-->
//! ```
//!
//! Only the block tree is recovered; the HTML between delimiters is not kept.

use serde_json::{Map, Value};
use tracing::debug;

/// Block type holding a file attachment.
pub const FILE_BLOCK: &str = "core/file";

/// A parsed block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    /// Fully qualified name, e.g. `core/file`
    pub name: String,
    /// Attribute object from the opening delimiter
    pub attrs: Map<String, Value>,
    /// Nested blocks in document order
    pub inner_blocks: Vec<Block>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// The `id` attribute as a positive integer, if it is one.
    ///
    /// Numeric strings are accepted since some editors store ids that way.
    pub fn positive_id(&self) -> Option<u64> {
        match self.attrs.get("id")? {
            Value::Number(n) => n.as_u64().filter(|id| *id > 0),
            Value::String(s) => s.trim().parse::<u64>().ok().filter(|id| *id > 0),
            _ => None,
        }
    }
}

enum Delimiter<'a> {
    Open { name: String, attrs: &'a str },
    Void { name: String, attrs: &'a str },
    Close { name: String },
}

/// Parse top-level blocks from serialized content.
pub fn parse_blocks(content: &str) -> Vec<Block> {
    let mut output = Vec::new();
    let mut stack: Vec<Block> = Vec::new();
    let mut rest = content;

    while let Some(start) = rest.find("<!--") {
        let after = &rest[start + 4..];
        let Some(end) = after.find("-->") else {
            break;
        };
        let comment = &after[..end];
        rest = &after[end + 3..];

        match parse_delimiter(comment) {
            Some(Delimiter::Open { name, attrs }) => {
                stack.push(Block {
                    name,
                    attrs: parse_attrs(attrs),
                    inner_blocks: Vec::new(),
                });
            }
            Some(Delimiter::Void { name, attrs }) => {
                let block = Block {
                    name,
                    attrs: parse_attrs(attrs),
                    inner_blocks: Vec::new(),
                };
                attach(&mut stack, &mut output, block);
            }
            Some(Delimiter::Close { name }) => {
                if stack.last().map(|b| b.name == name).unwrap_or(false) {
                    if let Some(block) = stack.pop() {
                        attach(&mut stack, &mut output, block);
                    }
                } else {
                    debug!(block = %name, "Ignoring unbalanced closing delimiter");
                }
            }
            None => {}
        }
    }

    // Close whatever is still open, innermost first.
    while let Some(block) = stack.pop() {
        attach(&mut stack, &mut output, block);
    }

    output
}

/// True when a block named `name` appears anywhere in the tree.
pub fn has_block(blocks: &[Block], name: &str) -> bool {
    blocks
        .iter()
        .any(|b| b.name == name || has_block(&b.inner_blocks, name))
}

fn attach(stack: &mut [Block], output: &mut Vec<Block>, block: Block) {
    match stack.last_mut() {
        Some(parent) => parent.inner_blocks.push(block),
        None => output.push(block),
    }
}

fn parse_delimiter(comment: &str) -> Option<Delimiter<'_>> {
    let body = comment.trim();

    if let Some(name) = body.strip_prefix("/wp:") {
        let name = block_name(name.trim())?;
        return Some(Delimiter::Close { name });
    }

    let body = body.strip_prefix("wp:")?;
    let name_len = name_end(body)?;
    let name = block_name(&body[..name_len])?;

    let tail = body[name_len..].trim();
    match tail.strip_suffix('/') {
        Some(attrs) => Some(Delimiter::Void {
            name,
            attrs: attrs.trim(),
        }),
        None => Some(Delimiter::Open { name, attrs: tail }),
    }
}

/// Length of the block name at the start of `body`: `[a-z][a-z0-9_-]*`,
/// optionally followed by `/[a-z][a-z0-9_-]*`.
fn name_end(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let segment = |from: usize| -> Option<usize> {
        let first = *bytes.get(from)?;
        if !first.is_ascii_lowercase() {
            return None;
        }
        let mut i = from + 1;
        while i < bytes.len()
            && (bytes[i].is_ascii_lowercase()
                || bytes[i].is_ascii_digit()
                || bytes[i] == b'_'
                || bytes[i] == b'-')
        {
            i += 1;
        }
        Some(i)
    };

    let end = segment(0)?;
    if bytes.get(end) == Some(&b'/') {
        if let Some(ns_end) = segment(end + 1) {
            return Some(ns_end);
        }
    }
    Some(end)
}

fn block_name(raw: &str) -> Option<String> {
    let end = name_end(raw)?;
    if end != raw.len() {
        return None;
    }
    if raw.contains('/') {
        Some(raw.to_string())
    } else {
        Some(format!("core/{raw}"))
    }
}

fn parse_attrs(raw: &str) -> Map<String, Value> {
    if raw.is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => {
            debug!(attrs = %raw, "Discarding unparseable block attributes");
            Map::new()
        }
    }
}
