//! Project-root resolution for tool calls.
//!
//! Precedence: explicit `path` argument on the call, then the
//! `MEMSHARD_ROOT` / `MEMSHARD_PROJECT_ROOT` environment overrides, then
//! the process working directory.

use std::path::PathBuf;

const ROOT_ENV_VARS: &[&str] = &["MEMSHARD_ROOT", "MEMSHARD_PROJECT_ROOT"];

pub(super) fn resolve_root(raw_path: Option<&str>) -> Result<(PathBuf, String), String> {
    let candidate = raw_path
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .or_else(env_root)
        .unwrap_or_else(|| ".".to_string());

    let path = PathBuf::from(&candidate);
    let root = path
        .canonicalize()
        .map_err(|err| format!("Missing project root: cannot resolve '{candidate}': {err}"))?;
    if !root.is_dir() {
        return Err(format!(
            "Missing project root: '{candidate}' is not a directory"
        ));
    }
    let display = root.to_string_lossy().to_string();
    Ok((root, display))
}

fn env_root() -> Option<String> {
    for var in ROOT_ENV_VARS {
        if let Ok(value) = std::env::var(var) {
            let value = value.trim().to_string();
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}
