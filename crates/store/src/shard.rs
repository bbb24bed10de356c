//! The persisted unit of memory.

use memshard_resolver::HealthState;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::StoreError;

/// Unix epoch milliseconds.
pub fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Stable shard identifier derived from the anchor triple, so re-creating
/// at the same location upserts rather than duplicates.
pub fn shard_id(file: &str, from_text: &str, to_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file.as_bytes());
    hasher.update([0u8]);
    hasher.update(from_text.as_bytes());
    hasher.update([0u8]);
    hasher.update(to_text.as_bytes());
    let digest = hasher.finalize();
    let mut id = hex_encode_lower(&digest);
    id.truncate(16);
    id
}

/// Full sha256 hex of a span, used as a fast identity check before running
/// the similarity scorer.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex_encode_lower(&hasher.finalize())
}

pub fn hex_encode_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len().saturating_mul(2));
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shard {
    pub id: String,
    /// Path relative to the project root, `/`-separated.
    pub file: String,
    pub from_text: String,
    pub to_text: String,
    /// Exact original text between and including the anchors, captured at
    /// creation/refresh time. The baseline for similarity comparison.
    pub captured_span: String,
    pub captured_hash: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub health_score: f64,
    #[serde(default)]
    pub health_state: HealthState,
    #[serde(default)]
    pub stale_view_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_anchor: Option<String>,
    /// 1-indexed line range of the last resolution.
    pub start_line: u32,
    pub end_line: u32,
    /// Byte offset of the last resolved span start; locator tie-break hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_start: Option<u64>,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_viewed_at: Option<u64>,
}

impl Shard {
    /// Build a freshly captured shard. Health starts at the top state; the
    /// id is derived from the anchor triple. Fails on an empty tag set.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        file: String,
        from_text: String,
        to_text: String,
        captured_span: String,
        tags: Vec<String>,
        summary: Option<String>,
        function_anchor: Option<String>,
        start_line: u32,
        end_line: u32,
        start_offset: u64,
    ) -> Result<Self, StoreError> {
        let tags = dedup_tags(tags);
        if tags.is_empty() {
            return Err(StoreError::EmptyTags);
        }
        let now = unix_ms();
        let captured_hash = content_hash(&captured_span);
        Ok(Self {
            id: shard_id(&file, &from_text, &to_text),
            file,
            from_text,
            to_text,
            captured_span,
            captured_hash,
            tags,
            summary,
            health_score: 1.0,
            health_state: HealthState::Healthy,
            stale_view_count: 0,
            function_anchor,
            start_line,
            end_line,
            last_start: Some(start_offset),
            created_at: now,
            updated_at: now,
            last_viewed_at: None,
        })
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn matches_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}

/// Drop duplicate and blank tags, preserving first-seen order.
fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if tag.is_empty() || out.contains(&tag) {
            continue;
        }
        out.push(tag);
    }
    out
}
