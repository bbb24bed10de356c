//! `create_shard`: capture a fresh span between two anchors and upsert it.

use memshard_resolver::{detect_function_name, locate};
use memshard_store::{Shard, ShardStore};
use std::path::Path;

use super::schemas::create_shard::{CreateShardRequest, CreateShardResult};
use super::util::{normalize_relative_path, truncate_to_chars};

pub(super) fn compute_create_shard_result(
    root: &Path,
    store: &ShardStore,
    request: &CreateShardRequest,
) -> Result<CreateShardResult, String> {
    if request.tags.iter().all(|t| t.trim().is_empty()) {
        return Err("create_shard requires at least one non-empty tag".to_string());
    }
    if request.from_text.trim().is_empty() || request.to_text.trim().is_empty() {
        return Err("create_shard requires non-empty from_text and to_text".to_string());
    }

    let file = normalize_relative_path(&request.file);
    let full_path = root.join(&file);
    let text = match std::fs::read_to_string(&full_path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(format!("File not found: {file}"));
        }
        Err(err) => return Err(format!("Could not read {file}: {err}")),
    };

    // Creation captures the exact region; approximate matching is a view-time
    // concern. A start anchor the file does not contain is anchor-not-found;
    // an end anchor that never follows the start is an anchor-order error.
    if !text.contains(&request.from_text) {
        return Err(format!(
            "Start anchor not found in {file}: '{}' does not appear in the file",
            truncate_to_chars(&request.from_text, 50)
        ));
    }
    let span = match locate(&text, &request.from_text, &request.to_text, None) {
        Ok(span) => span,
        Err(err) => return Err(format!("Could not resolve region in {file}: {err}")),
    };
    if span.truncated_end || span.approximate_end {
        return Err(format!(
            "Invalid anchor order in {file}: to_text '{}' does not follow from_text",
            truncate_to_chars(&request.to_text, 50)
        ));
    }

    let start_line_text = span.text.lines().next().unwrap_or_default();
    let function_anchor = detect_function_name(start_line_text);

    let shard = Shard::new(
        file.clone(),
        request.from_text.clone(),
        request.to_text.clone(),
        span.text,
        request.tags.clone(),
        request.summary.clone(),
        function_anchor,
        span.start_line,
        span.end_line,
        span.start as u64,
    )
    .map_err(|err| err.to_string())?;

    let (shard, outcome) = store.upsert(shard).map_err(|err| err.to_string())?;

    Ok(CreateShardResult {
        status: "ok".to_string(),
        action: outcome.into(),
        shard_id: shard.id,
        file,
        lines: format!("{}-{}", shard.start_line, shard.end_line),
        tags: shard.tags,
        has_summary: shard.summary.is_some(),
        function_anchor: shard.function_anchor,
    })
}
