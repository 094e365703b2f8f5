//! Mapping directory loading and reload.
//!
//! Walks a directory of `*.json` mapping files, parses each, feeds the
//! trees through [`crate::mappings::read_mappings`] and registers the
//! survivors. A bad file only fails to contribute: it is logged and
//! skipped, never fatal to the load. Runs off the match hot path (startup
//! or an explicit reload command).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use conduit_engine::registry::{DispatchIndex, DispatchRegistry, IndexBuilder};

/// Build a dispatch index from every mapping file in `dir`.
///
/// Only I/O-level problems (unreadable directory) are errors; malformed
/// files and rejected definitions are logged and skipped.
pub fn load_directory(dir: &Path) -> Result<DispatchIndex> {
    let mut builder = IndexBuilder::new();
    for file in mapping_files(dir)? {
        match load_file(&file, &mut builder) {
            Ok(count) => {
                tracing::info!("Loaded {} definitions from {}", count, file.display());
            }
            Err(e) => {
                tracing::error!("Skipping mapping file {}: {:#}", file.display(), e);
            }
        }
    }
    let index = builder.build();
    if index.is_empty() {
        tracing::warn!("No custom item definitions loaded from {}", dir.display());
    } else {
        tracing::info!("Registered {} custom item definitions", index.definition_count());
    }
    Ok(index)
}

/// Rebuild the whole index from `dir` and publish it atomically. In-flight
/// matches keep the snapshot they hold; there is no partially-reloaded
/// state to observe.
pub fn reload(registry: &DispatchRegistry, dir: &Path) -> Result<usize> {
    let index = load_directory(dir)?;
    let count = index.definition_count();
    registry.publish(index);
    Ok(count)
}

/// The `*.json` files in `dir`, sorted by name so load order (and with it
/// the registration-order tie-break) is reproducible across runs.
fn mapping_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        tracing::warn!("Mappings directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir)
        .with_context(|| format!("reading mappings directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("reading mappings directory {}", dir.display()))?
            .path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Register one file's definitions. Definitions rejected by the registry
/// (duplicate target, duplicate fallback) are logged and skipped so one
/// conflict does not discard the rest of the file.
fn load_file(file: &Path, builder: &mut IndexBuilder) -> Result<usize> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("reading mapping file {}", file.display()))?;
    let root: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing mapping file {}", file.display()))?;
    let definitions = crate::mappings::read_mappings(&root)?;

    let mut registered = 0;
    for (origin_item, definition) in definitions {
        let target = definition.target().clone();
        match builder.register(origin_item, definition) {
            Ok(()) => registered += 1,
            Err(e) => {
                tracing::error!("Skipping definition {} in {}: {}", target, file.display(), e);
            }
        }
    }
    Ok(registered)
}
