//! `delete_tag`: strip a tag from every shard carrying it; shards left
//! tagless are deleted as orphans.

use memshard_store::ShardStore;

use super::schemas::tags::{DeleteTagRequest, DeleteTagResult};

pub(super) fn compute_delete_tag_result(
    store: &ShardStore,
    request: &DeleteTagRequest,
) -> Result<DeleteTagResult, String> {
    let tag = request.tag.trim();
    if tag.is_empty() {
        return Err("delete_tag requires a non-empty tag".to_string());
    }

    let removal = store.remove_tag(tag).map_err(|err| err.to_string())?;
    let status = if removal.modified > 0 { "ok" } else { "not_found" };

    if removal.orphans_deleted > 0 {
        log::info!(
            "delete_tag('{tag}') removed {} orphaned shard(s)",
            removal.orphans_deleted
        );
    }

    Ok(DeleteTagResult {
        status: status.to_string(),
        tag: tag.to_string(),
        modified: removal.modified,
        orphans_deleted: removal.orphans_deleted,
    })
}
