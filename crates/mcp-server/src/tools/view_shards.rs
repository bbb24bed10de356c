//! `view_shards`: resolve each shard on the requested page against current
//! file content, rescore it, advance its lifecycle, and return the
//! (possibly degraded) content.

use memshard_resolver::{
    locate, similarity, Disposition, HealthState, LifecycleEngine, LocateError, Observation,
    ResolvedSpan,
};
use memshard_store::{content_hash, Shard, ShardFilter, ShardStore, ViewUpdate};
use std::path::Path;

use super::schemas::view_shards::{
    HealthView, ShardView, ViewShardsRequest, ViewShardsResult, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use super::util::normalize_relative_path;

pub(super) fn compute_view_shards_result(
    root: &Path,
    store: &ShardStore,
    engine: &LifecycleEngine,
    request: &ViewShardsRequest,
) -> Result<ViewShardsResult, String> {
    let filter = ShardFilter {
        tags: request.tags.clone().filter(|t| !t.is_empty()),
        file: request
            .file
            .as_deref()
            .map(normalize_relative_path)
            .filter(|f| !f.is_empty()),
    };
    if filter.is_empty() {
        return Err(
            "view_shards requires at least one filter: pass `tags` and/or `file`".to_string(),
        );
    }

    let limit = request
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = request.offset.unwrap_or(0);
    let raw = request.raw.unwrap_or(false);

    let matching = store.list(&filter).map_err(|err| err.to_string())?;
    let total = matching.len();
    let page: Vec<Shard> = matching.into_iter().skip(offset).take(limit).collect();

    let mut views = Vec::with_capacity(page.len());
    let mut updates: Vec<ViewUpdate> = Vec::new();
    let mut expired: Vec<String> = Vec::new();
    let mut flagged: Vec<String> = Vec::new();

    for shard in &page {
        let resolution = resolve_shard(root, shard);
        let score = match &resolution {
            Resolution::Found { score, .. } => *score,
            // Lost anchors and deleted files are total loss, not "not
            // computed" - they flow through the normal stale path.
            Resolution::AnchorLost | Resolution::FileMissing => 0.0,
        };

        let observation = engine.observe(shard.health_state, shard.stale_view_count, score);

        match observation.disposition {
            Disposition::Expire => expired.push(shard.id.clone()),
            Disposition::Keep => {
                let (start_line, end_line, last_start) = match &resolution {
                    Resolution::Found { span, .. } => {
                        (span.start_line, span.end_line, Some(span.start as u64))
                    }
                    _ => (shard.start_line, shard.end_line, shard.last_start),
                };
                if observation.state == HealthState::Stale {
                    flagged.push(shard.id.clone());
                }
                updates.push(ViewUpdate {
                    id: shard.id.clone(),
                    health_score: observation.score,
                    health_state: observation.state,
                    stale_view_count: observation.stale_view_count,
                    start_line,
                    end_line,
                    last_start,
                });
            }
        }

        views.push(build_view(shard, &resolution, &observation, engine, raw));
    }

    store
        .apply_view(&updates, &expired)
        .map_err(|err| err.to_string())?;

    let returned = views.len();
    Ok(ViewShardsResult {
        shards: views,
        total,
        returned,
        offset,
        limit,
        truncated: offset + returned < total,
        attention: (!flagged.is_empty()).then(|| {
            format!(
                "Shards [{}] have low confidence and will be deleted soon unless you re-create them with create_shard.",
                flagged.join(", ")
            )
        }),
        deleted: (!expired.is_empty()).then(|| {
            format!(
                "Shards [{}] were expired and have been deleted. Re-explore these areas and create new shards if still needed.",
                expired.join(", ")
            )
        }),
    })
}

enum Resolution {
    Found { span: ResolvedSpan, score: f64 },
    AnchorLost,
    FileMissing,
}

fn resolve_shard(root: &Path, shard: &Shard) -> Resolution {
    let full_path = root.join(&shard.file);
    let text = match std::fs::read_to_string(&full_path) {
        Ok(text) => text,
        Err(err) => {
            log::debug!("shard {}: cannot read {}: {err}", shard.id, shard.file);
            return Resolution::FileMissing;
        }
    };

    let last_start = shard.last_start.map(|offset| offset as usize);
    match locate(&text, &shard.from_text, &shard.to_text, last_start) {
        Ok(span) => {
            let score = if content_hash(&span.text) == shard.captured_hash {
                1.0
            } else {
                similarity(&shard.captured_span, &span.text)
            };
            Resolution::Found { span, score }
        }
        Err(LocateError::AnchorNotFound) => Resolution::AnchorLost,
    }
}

fn build_view(
    shard: &Shard,
    resolution: &Resolution,
    observation: &Observation,
    engine: &LifecycleEngine,
    raw: bool,
) -> ShardView {
    let expired = observation.disposition == Disposition::Expire;
    let (lines, content) = match resolution {
        Resolution::Found { span, .. } => (
            Some(format!("{}-{}", span.start_line, span.end_line)),
            Some(span.text.clone()),
        ),
        _ => (None, None),
    };

    let message = health_message(shard, resolution, observation, engine);
    let mut view = ShardView {
        shard_id: shard.id.clone(),
        file: shard.file.clone(),
        lines,
        tags: shard.tags.clone(),
        health: HealthView {
            score: observation.score,
            status: if expired {
                "expired".to_string()
            } else {
                observation.state.as_str().to_string()
            },
            message,
        },
        summary: None,
        content: None,
        note: None,
        expired,
    };

    if expired {
        // The caller is told the shard is gone instead of being shown
        // stale content again.
        return view;
    }

    if raw || !observation.state.shows_summary() {
        view.content = Some(content.unwrap_or_else(|| "[could not resolve]".to_string()));
        if shard.summary.is_some() && !raw {
            view.note =
                Some("Summary bypassed due to low health; showing raw content".to_string());
        }
    } else if let Some(summary) = &shard.summary {
        view.summary = Some(summary.clone());
    } else {
        view.content = Some(content.unwrap_or_else(|| "[could not resolve]".to_string()));
    }

    view
}

fn health_message(
    shard: &Shard,
    resolution: &Resolution,
    observation: &Observation,
    engine: &LifecycleEngine,
) -> String {
    match resolution {
        Resolution::FileMissing => return format!("File not found: {}", shard.file),
        Resolution::AnchorLost => {
            return format!("Could not resolve the region in {}", shard.file)
        }
        Resolution::Found { .. } => {}
    }

    if observation.disposition == Disposition::Expire {
        return "Major changes detected. This shard has expired and has been deleted. Re-create it to keep it alive.".to_string();
    }
    match observation.state {
        HealthState::Healthy if observation.score >= 1.0 => "Unchanged".to_string(),
        HealthState::Healthy => "Minor changes, summary still valid".to_string(),
        HealthState::Degraded => {
            "Notable changes detected; showing raw content instead of summary".to_string()
        }
        HealthState::Stale => format!(
            "Major changes detected. Will be deleted after {} more view(s) unless re-created.",
            engine.views_remaining(observation.stale_view_count)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SOURCE: &str = "\
def process_upload(file_data, user_id):
    validated = validate_file(file_data)
    result = save_to_storage(validated, user_id)
    return result
";

    fn create(dir: &TempDir, store: &ShardStore, tags: &[&str], summary: Option<&str>) {
        std::fs::write(dir.path().join("example.py"), SOURCE).unwrap();
        let req = super::super::schemas::create_shard::CreateShardRequest {
            file: "example.py".to_string(),
            from_text: "def process_upload(".to_string(),
            to_text: "return result".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            summary: summary.map(|s| s.to_string()),
            path: None,
        };
        super::super::create_shard::compute_create_shard_result(dir.path(), store, &req).unwrap();
    }

    fn view(dir: &TempDir, store: &ShardStore, raw: bool) -> ViewShardsResult {
        let request = ViewShardsRequest {
            tags: Some(vec!["upload".to_string()]),
            file: None,
            raw: Some(raw),
            limit: None,
            offset: None,
            path: None,
        };
        compute_view_shards_result(dir.path(), store, &LifecycleEngine::default(), &request)
            .unwrap()
    }

    #[test]
    fn filterless_views_are_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ShardStore::open(dir.path()).unwrap();
        let request = ViewShardsRequest {
            tags: None,
            file: None,
            raw: None,
            limit: None,
            offset: None,
            path: None,
        };
        let err =
            compute_view_shards_result(dir.path(), &store, &LifecycleEngine::default(), &request)
                .unwrap_err();
        assert!(err.contains("at least one filter"));
    }

    #[test]
    fn healthy_shard_shows_summary() {
        let dir = TempDir::new().unwrap();
        let store = ShardStore::open(dir.path()).unwrap();
        create(&dir, &store, &["upload"], Some("Uploads: validate, store."));

        let result = view(&dir, &store, false);
        assert_eq!(result.total, 1);
        let entry = &result.shards[0];
        assert_eq!(entry.health.status, "healthy");
        assert_eq!(entry.health.score, 1.0);
        assert_eq!(entry.summary.as_deref(), Some("Uploads: validate, store."));
        assert!(entry.content.is_none());

        // The view is bookkept.
        let stored = &store.all().unwrap()[0];
        assert!(stored.last_viewed_at.is_some());
    }

    #[test]
    fn raw_flag_bypasses_the_summary() {
        let dir = TempDir::new().unwrap();
        let store = ShardStore::open(dir.path()).unwrap();
        create(&dir, &store, &["upload"], Some("A summary."));

        let result = view(&dir, &store, true);
        let entry = &result.shards[0];
        assert!(entry.summary.is_none());
        assert!(entry.content.as_deref().unwrap().contains("def process_upload"));
    }

    #[test]
    fn internal_rename_stays_healthy() {
        let dir = TempDir::new().unwrap();
        let store = ShardStore::open(dir.path()).unwrap();
        create(&dir, &store, &["upload"], Some("A summary."));

        let edited = SOURCE.replace("validated", "checked");
        std::fs::write(dir.path().join("example.py"), edited).unwrap();

        let result = view(&dir, &store, false);
        let entry = &result.shards[0];
        assert!(entry.health.score >= 0.8, "score {}", entry.health.score);
        assert_eq!(entry.health.status, "healthy");
        assert!(entry.summary.is_some());
    }

    #[test]
    fn notable_drift_degrades_and_bypasses_the_summary() {
        let dir = TempDir::new().unwrap();
        let store = ShardStore::open(dir.path()).unwrap();
        create(&dir, &store, &["upload"], Some("A summary."));

        let drifted = "\
def process_upload(request):
    async with DatabaseSession() as db:
        record = await db.create_upload(request.body)
        await EventBus.publish(record)
        return JSONResponse(record.to_dict())
";
        std::fs::write(dir.path().join("example.py"), drifted).unwrap();

        let result = view(&dir, &store, false);
        let entry = &result.shards[0];
        assert_eq!(entry.health.status, "degraded");
        assert!(entry.health.score >= 0.4 && entry.health.score < 0.8);
        assert!(entry.summary.is_none());
        assert!(entry.content.is_some());
        assert!(entry.note.as_deref().unwrap().contains("Summary bypassed"));
    }

    #[test]
    fn rewrite_goes_stale_and_expires_on_the_third_view() {
        let dir = TempDir::new().unwrap();
        let store = ShardStore::open(dir.path()).unwrap();
        create(&dir, &store, &["upload"], Some("A summary."));

        let rewrite = "\
class UploadPipeline:
    def __init__(self, bus, store):
        self.bus = bus
        self.store = store

    async def ingest(self, payload):
        row = await self.store.insert(payload)
        await self.bus.emit(\"ingested\", row.key)
        return row
";
        std::fs::write(dir.path().join("example.py"), rewrite).unwrap();

        let first = view(&dir, &store, false);
        let entry = &first.shards[0];
        assert!(entry.health.score < 0.4, "score {}", entry.health.score);
        assert_eq!(entry.health.status, "stale");
        // Low health bypasses the summary.
        assert!(entry.summary.is_none());
        assert!(first.attention.is_some());

        let second = view(&dir, &store, false);
        assert_eq!(second.shards[0].health.status, "stale");

        let third = view(&dir, &store, false);
        assert!(third.shards[0].expired);
        assert_eq!(third.shards[0].health.status, "expired");
        assert!(third.deleted.is_some());
        assert_eq!(store.all().unwrap().len(), 0);

        let after = view(&dir, &store, false);
        assert_eq!(after.total, 0);
    }

    #[test]
    fn refresh_before_expiry_resets_the_counter() {
        let dir = TempDir::new().unwrap();
        let store = ShardStore::open(dir.path()).unwrap();
        create(&dir, &store, &["upload"], None);

        std::fs::write(dir.path().join("example.py"), "nothing alike at all\n").unwrap();
        view(&dir, &store, false);
        view(&dir, &store, false);
        assert_eq!(store.all().unwrap()[0].stale_view_count, 2);

        // Re-create against restored content: back to healthy, counter
        // cleared.
        create(&dir, &store, &["upload"], None);
        let stored = &store.all().unwrap()[0];
        assert_eq!(stored.stale_view_count, 0);
        assert_eq!(stored.health_state, HealthState::Healthy);
    }

    #[test]
    fn deleted_file_follows_the_stale_path() {
        let dir = TempDir::new().unwrap();
        let store = ShardStore::open(dir.path()).unwrap();
        create(&dir, &store, &["upload"], None);

        std::fs::remove_file(dir.path().join("example.py")).unwrap();
        let result = view(&dir, &store, false);
        let entry = &result.shards[0];
        assert_eq!(entry.health.score, 0.0);
        assert_eq!(entry.health.status, "stale");
        assert!(entry.health.message.starts_with("File not found"));
    }

    #[test]
    fn pagination_is_oldest_first_and_bounded() {
        let dir = TempDir::new().unwrap();
        let store = ShardStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("example.py"), SOURCE).unwrap();

        for i in 0..3 {
            let req = super::super::schemas::create_shard::CreateShardRequest {
                file: "example.py".to_string(),
                from_text: "def process_upload(".to_string(),
                to_text: match i {
                    0 => "validate_file(file_data)".to_string(),
                    1 => "save_to_storage(validated, user_id)".to_string(),
                    _ => "return result".to_string(),
                },
                tags: vec!["upload".to_string()],
                summary: None,
                path: None,
            };
            super::super::create_shard::compute_create_shard_result(dir.path(), &store, &req)
                .unwrap();
        }

        let request = ViewShardsRequest {
            tags: Some(vec!["upload".to_string()]),
            file: None,
            raw: None,
            limit: Some(2),
            offset: Some(0),
            path: None,
        };
        let page = compute_view_shards_result(
            dir.path(),
            &store,
            &LifecycleEngine::default(),
            &request,
        )
        .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.returned, 2);
        assert!(page.truncated);

        let request = ViewShardsRequest {
            offset: Some(2),
            ..request
        };
        let rest = compute_view_shards_result(
            dir.path(),
            &store,
            &LifecycleEngine::default(),
            &request,
        )
        .unwrap();
        assert_eq!(rest.returned, 1);
        assert!(!rest.truncated);
    }
}
