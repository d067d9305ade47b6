// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Report listing and file extraction.
//!
//! A report is a published post carrying the configured taxonomy term and
//! at least one file block. Its files are the attachments those blocks
//! point at.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::{ContentStore, MediaStore, Post};
use crate::blocks::{has_block, parse_blocks, Block, FILE_BLOCK};

/// A report as listed to agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: u64,
    pub title: String,
    pub permalink: String,
    /// ISO-8601 with numeric offset, e.g. `2024-05-01T09:30:00+00:00`
    pub modified_date: String,
}

impl From<&Post> for Report {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            permalink: post.permalink.clone(),
            modified_date: post.modified.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }
}

/// A downloadable file attached to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub id: u64,
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub url: String,
    pub mime_type: String,
}

/// Extract file references from top-level blocks, in document order.
///
/// Blocks whose attachment cannot be resolved are skipped.
pub fn extract_files(blocks: &[Block], media: &dyn MediaStore) -> Vec<FileReference> {
    blocks
        .iter()
        .filter(|block| block.name == FILE_BLOCK)
        .filter_map(|block| block.positive_id())
        .filter_map(|id| {
            let resolved = media.resolve_attachment(id);
            if resolved.is_none() {
                warn!(attachment_id = id, "Skipping file block with unresolvable attachment");
            }
            resolved
        })
        .collect()
}

/// Published posts with the given term that contain a file block.
pub fn list_reports(content: &dyn ContentStore, taxonomy: &str, term_id: u64) -> Vec<Report> {
    let reports: Vec<Report> = content
        .posts_with_term(taxonomy, term_id)
        .iter()
        .filter(|post| post.is_published() && post.post_type == "post")
        .filter(|post| has_block(&parse_blocks(&post.content), FILE_BLOCK))
        .map(Report::from)
        .collect();

    debug!(taxonomy, term_id, count = reports.len(), "Listed reports");
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeMedia(HashMap<u64, FileReference>);

    impl MediaStore for FakeMedia {
        fn resolve_attachment(&self, id: u64) -> Option<FileReference> {
            self.0.get(&id).cloned()
        }
    }

    fn file(id: u64) -> FileReference {
        FileReference {
            id,
            file_name: format!("file-{id}"),
            url: format!("https://example.com/uploads/{id}.pdf"),
            mime_type: "application/pdf".to_string(),
        }
    }

    fn media(ids: &[u64]) -> FakeMedia {
        FakeMedia(ids.iter().map(|id| (*id, file(*id))).collect())
    }

    #[test]
    fn test_empty_blocks() {
        assert!(extract_files(&[], &media(&[1])).is_empty());
    }

    #[test]
    fn test_unresolvable_attachment_skipped() {
        let blocks = vec![Block::new(FILE_BLOCK).with_attr("id", 5)];
        assert!(extract_files(&blocks, &media(&[])).is_empty());
    }

    #[test]
    fn test_document_order_and_filtering() {
        let blocks = vec![
            Block::new(FILE_BLOCK).with_attr("id", 3),
            Block::new("core/paragraph").with_attr("id", 1),
            Block::new(FILE_BLOCK),
            Block::new(FILE_BLOCK).with_attr("id", 0),
            Block::new(FILE_BLOCK).with_attr("id", 9),
            Block::new(FILE_BLOCK).with_attr("id", 2),
        ];
        let files = extract_files(&blocks, &media(&[1, 2, 3]));
        let ids: Vec<u64> = files.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_file_reference_wire_names() {
        let json = serde_json::to_value(file(4)).unwrap();
        assert_eq!(json["fileName"], "file-4");
        assert_eq!(json["mime_type"], "application/pdf");
        assert!(json.get("file_name").is_none());
    }

    #[test]
    fn test_report_date_format() {
        let post: Post = serde_json::from_str(
            r#"{"id":8,"title":"Q1","permalink":"https://example.com/q1","status":"publish",
                "modified":"2024-05-01T09:30:00Z"}"#,
        )
        .unwrap();
        let report = Report::from(&post);
        assert_eq!(report.modified_date, "2024-05-01T09:30:00+00:00");
    }
}
