//! Durable keyed storage: one structured JSON file per project holding all
//! shards, guarded by an exclusive lock file around every
//! load-mutate-persist cycle.

use fs2::FileExt;
use memshard_resolver::HealthState;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::shard::{unix_ms, Shard};

pub const STORE_DIR_NAME: &str = ".memshard";
const STORE_FILE_NAME: &str = "shards_v1.json";
const LOCK_FILE_NAME: &str = "shards.lock";
const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    shards: Vec<Shard>,
}

/// Whether a create call inserted a new shard or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Refreshed,
}

/// View filter. At least one field must be set; the transport validates
/// that before reaching the store.
#[derive(Debug, Clone, Default)]
pub struct ShardFilter {
    /// Match shards carrying ANY of these tags.
    pub tags: Option<Vec<String>>,
    /// Match shards anchored in this file.
    pub file: Option<String>,
}

impl ShardFilter {
    pub fn is_empty(&self) -> bool {
        self.tags.as_ref().map_or(true, |t| t.is_empty()) && self.file.is_none()
    }

    fn matches(&self, shard: &Shard) -> bool {
        if let Some(tags) = &self.tags {
            if !tags.is_empty() && !shard.matches_any_tag(tags) {
                return false;
            }
        }
        if let Some(file) = &self.file {
            if &shard.file != file {
                return false;
            }
        }
        true
    }
}

/// Post-resolution bookkeeping for one shard that survived a view.
#[derive(Debug, Clone)]
pub struct ViewUpdate {
    pub id: String,
    pub health_score: f64,
    pub health_state: HealthState,
    pub stale_view_count: u32,
    pub start_line: u32,
    pub end_line: u32,
    pub last_start: Option<u64>,
}

/// Result of removing a tag across the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRemoval {
    /// Shards that carried the tag (including the ones deleted as orphans).
    pub modified: usize,
    /// Shards deleted because the removal emptied their tag set.
    pub orphans_deleted: usize,
}

pub struct ShardStore {
    root: PathBuf,
    store_path: PathBuf,
    lock_path: PathBuf,
}

struct StoreLock {
    #[allow(dead_code)]
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl ShardStore {
    /// Open (and bootstrap) the store for a project root.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        let dir = root.join(STORE_DIR_NAME);
        std::fs::create_dir_all(&dir)?;

        let store = Self {
            root: root.to_path_buf(),
            store_path: dir.join(STORE_FILE_NAME),
            lock_path: dir.join(LOCK_FILE_NAME),
        };

        if !store.store_path.exists() {
            store.write_shards(&[])?;
        }
        store.seed_gitignore();
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Append the store directory to an existing `.gitignore` once. Purely
    /// best-effort; a project without git stays untouched.
    fn seed_gitignore(&self) {
        let gitignore = self.root.join(".gitignore");
        let Ok(content) = std::fs::read_to_string(&gitignore) else {
            return;
        };
        if content.contains(STORE_DIR_NAME) {
            return;
        }
        let result = OpenOptions::new()
            .append(true)
            .open(&gitignore)
            .and_then(|mut f| writeln!(f, "\n# Memshard memory shards\n{STORE_DIR_NAME}/"));
        if let Err(err) = result {
            log::warn!("could not append {STORE_DIR_NAME}/ to .gitignore: {err}");
        }
    }

    fn lock(&self) -> Result<StoreLock, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)?;
        file.lock_exclusive()?;
        Ok(StoreLock { file })
    }

    fn read_shards(&self) -> Result<Vec<Shard>, StoreError> {
        if !self.store_path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.store_path)?;
        let parsed: StoreFile =
            serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: self.store_path.clone(),
                source,
            })?;
        Ok(parsed.shards)
    }

    fn write_shards(&self, shards: &[Shard]) -> Result<(), StoreError> {
        let file = StoreFile {
            version: STORE_VERSION,
            shards: shards.to_vec(),
        };
        let bytes = serde_json::to_vec_pretty(&file).map_err(|source| StoreError::Corrupt {
            path: self.store_path.clone(),
            source,
        })?;
        self.write_atomic(&bytes)
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let parent = self
            .store_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let tmp = parent.join(format!(".{STORE_FILE_NAME}.tmp-{}", std::process::id()));
        {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.store_path)?;
        Ok(())
    }

    /// All shards, oldest-created-first (ties by id for determinism).
    pub fn all(&self) -> Result<Vec<Shard>, StoreError> {
        let _lock = self.lock()?;
        let mut shards = self.read_shards()?;
        sort_oldest_first(&mut shards);
        Ok(shards)
    }

    /// Single-shard lookup by id.
    pub fn get(&self, id: &str) -> Result<Option<Shard>, StoreError> {
        let _lock = self.lock()?;
        Ok(self.read_shards()?.into_iter().find(|shard| shard.id == id))
    }

    /// Shards matching a filter, oldest-created-first.
    pub fn list(&self, filter: &ShardFilter) -> Result<Vec<Shard>, StoreError> {
        let _lock = self.lock()?;
        let mut shards: Vec<Shard> = self
            .read_shards()?
            .into_iter()
            .filter(|shard| filter.matches(shard))
            .collect();
        sort_oldest_first(&mut shards);
        Ok(shards)
    }

    /// Insert or fully replace the shard with the same id. A refresh keeps
    /// the original creation time, replaces captured span, summary and
    /// tags, and resets health to the top state.
    pub fn upsert(&self, mut shard: Shard) -> Result<(Shard, UpsertOutcome), StoreError> {
        let _lock = self.lock()?;
        let mut shards = self.read_shards()?;

        for existing in shards.iter_mut() {
            if existing.id == shard.id {
                shard.created_at = existing.created_at;
                shard.updated_at = unix_ms();
                shard.health_score = 1.0;
                shard.health_state = HealthState::Healthy;
                shard.stale_view_count = 0;
                *existing = shard.clone();
                self.write_shards(&shards)?;
                return Ok((shard, UpsertOutcome::Refreshed));
            }
        }

        shards.push(shard.clone());
        self.write_shards(&shards)?;
        Ok((shard, UpsertOutcome::Inserted))
    }

    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _lock = self.lock()?;
        let mut shards = self.read_shards()?;
        let before = shards.len();
        shards.retain(|shard| shard.id != id);
        if shards.len() == before {
            return Ok(false);
        }
        self.write_shards(&shards)?;
        Ok(true)
    }

    /// Apply the outcome of one view pass: health bookkeeping for the
    /// survivors, deletion for the expired, a view timestamp for both.
    pub fn apply_view(&self, updates: &[ViewUpdate], expired: &[String]) -> Result<(), StoreError> {
        if updates.is_empty() && expired.is_empty() {
            return Ok(());
        }
        let _lock = self.lock()?;
        let mut shards = self.read_shards()?;
        let now = unix_ms();

        for shard in shards.iter_mut() {
            let Some(update) = updates.iter().find(|u| u.id == shard.id) else {
                continue;
            };
            shard.health_score = update.health_score;
            shard.health_state = update.health_state;
            shard.stale_view_count = update.stale_view_count;
            shard.start_line = update.start_line;
            shard.end_line = update.end_line;
            shard.last_start = update.last_start;
            shard.last_viewed_at = Some(now);
        }

        if !expired.is_empty() {
            shards.retain(|shard| !expired.contains(&shard.id));
        }

        self.write_shards(&shards)
    }

    /// Strip a tag from every shard carrying it; shards whose tag set
    /// becomes empty are deleted outright (orphans).
    pub fn remove_tag(&self, tag: &str) -> Result<TagRemoval, StoreError> {
        let _lock = self.lock()?;
        let mut shards = self.read_shards()?;

        let mut modified = 0usize;
        let mut orphans = 0usize;
        shards.retain_mut(|shard| {
            if !shard.has_tag(tag) {
                return true;
            }
            modified += 1;
            shard.tags.retain(|t| t != tag);
            if shard.tags.is_empty() {
                orphans += 1;
                log::debug!("orphan shard {} deleted with tag '{tag}'", shard.id);
                return false;
            }
            shard.updated_at = unix_ms();
            true
        });

        if modified > 0 {
            self.write_shards(&shards)?;
        }
        Ok(TagRemoval {
            modified,
            orphans_deleted: orphans,
        })
    }
}

fn sort_oldest_first(shards: &mut [Shard]) {
    shards.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
