//! One function per subcommand. Thin glue: validates CLI-level input,
//! calls into `Engine`, and renders output — no core logic lives here.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::engine::Engine;
use crate::index::RecordFilter;
use crate::walker;

use super::display;

/// Collapses `.`/`..`/duplicate separators in a logical (always
/// forward-slash) path, mirroring `os.path.normpath` (SPEC_FULL.md §4).
fn normalize_logical_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

pub fn list(engine: &Engine, verbose: bool) -> Result<()> {
    let mut records = engine.list()?;
    records.sort_by(|a, b| a.path.cmp(&b.path));

    if verbose {
        display::print_verbose(&records);
    } else {
        display::print_table(&records);
    }
    Ok(())
}

/// Returns `true` on full success, `false` when the command should exit 1
/// without having hit a surfaced engine error (e.g. "already exists").
pub fn backup(engine: &mut Engine, local: &Path, cloud: Option<String>) -> Result<bool> {
    if !local.exists() {
        bail!("no such file or directory: {}", local.display());
    }

    if local.is_dir() {
        return backup_directory(engine, local, cloud);
    }

    let logical_path = cloud.unwrap_or_else(|| local.to_string_lossy().into_owned());

    if already_exists(engine, &logical_path)? {
        eprintln!("already exists: {logical_path}");
        return Ok(false);
    }

    engine
        .store_from_filename(local, &logical_path)
        .with_context(|| format!("backup failed for {}", local.display()))?;

    println!("backed up: {} -> {logical_path}", local.display());
    Ok(true)
}

fn backup_directory(engine: &mut Engine, root: &Path, cloud_prefix: Option<String>) -> Result<bool> {
    let prefix = cloud_prefix.unwrap_or_else(|| root.to_string_lossy().into_owned());
    let entries = walker::walk(root)?;

    let mut any_skipped = false;
    for entry in entries {
        let logical_path = format!("{}/{}", prefix.trim_end_matches('/'), entry.logical_path);

        if already_exists(engine, &logical_path)? {
            eprintln!("already exists: {logical_path}");
            any_skipped = true;
            continue;
        }

        engine
            .store_from_filename(&entry.local_path, &logical_path)
            .with_context(|| format!("backup failed for {}", entry.local_path.display()))?;
        println!("backed up: {} -> {logical_path}", entry.local_path.display());
    }

    Ok(!any_skipped)
}

fn already_exists(engine: &Engine, logical_path: &str) -> Result<bool> {
    Ok(engine
        .find_one(&RecordFilter { path: Some(logical_path.to_owned()), ..Default::default() })?
        .is_some())
}

/// Retrieves the exact logical path, or every record whose path starts with
/// `cloud/` when no exact match exists. Returns `false` (exit 1) when
/// nothing matched.
pub fn restore(engine: &mut Engine, cloud: &str, local: Option<PathBuf>) -> Result<bool> {
    let cloud = normalize_logical_path(cloud);

    if let Some(record) = engine.find_one(&RecordFilter { path: Some(cloud.clone()), ..Default::default() })? {
        let destination = local.unwrap_or_else(|| PathBuf::from(&record.path));
        engine
            .retrieve_to_filename(&record, &destination)
            .with_context(|| format!("restore failed for {}", record.path))?;
        println!("restored: {} -> {}", record.path, destination.display());
        return Ok(true);
    }

    let prefix = format!("{}/", cloud.trim_end_matches('/'));
    let records = engine.find(&RecordFilter { path_prefix: Some(prefix), ..Default::default() })?;
    if records.is_empty() {
        eprintln!("not found: {cloud}");
        return Ok(false);
    }

    for record in &records {
        let relative = record.path.strip_prefix(&format!("{}/", cloud.trim_end_matches('/'))).unwrap_or(&record.path);
        let destination = match &local {
            Some(base) => base.join(relative),
            None => PathBuf::from(&record.path),
        };
        engine
            .retrieve_to_filename(record, &destination)
            .with_context(|| format!("restore failed for {}", record.path))?;
        println!("restored: {} -> {}", record.path, destination.display());
    }

    Ok(true)
}

/// Deletes the exact logical path, or every record under `cloud/`. Returns
/// `false` (exit 1) when nothing matched.
pub fn remove(engine: &mut Engine, cloud: &str) -> Result<bool> {
    let cloud = normalize_logical_path(cloud);

    if let Some(record) = engine.find_one(&RecordFilter { path: Some(cloud.clone()), ..Default::default() })? {
        engine.delete(&record).with_context(|| format!("remove failed for {}", record.path))?;
        println!("removed: {}", record.path);
        return Ok(true);
    }

    let prefix = format!("{}/", cloud.trim_end_matches('/'));
    let records = engine.find(&RecordFilter { path_prefix: Some(prefix), ..Default::default() })?;
    if records.is_empty() {
        eprintln!("not found: {cloud}");
        return Ok(false);
    }

    for record in &records {
        engine.delete(record).with_context(|| format!("remove failed for {}", record.path))?;
        println!("removed: {}", record.path);
    }

    Ok(true)
}

pub fn sync(engine: &mut Engine) -> Result<()> {
    engine.sync()?;
    list(engine, false)
}

pub fn list_cloud_keys(engine: &mut Engine) -> Result<()> {
    let (metadata_keys, data_keys) = engine.list_cloud_keys()?;

    display::print_banner("metadata", engine.back_end_id());
    for key in metadata_keys.keys() {
        println!("{key}");
    }
    println!();

    display::print_banner("data", engine.back_end_id());
    for key in data_keys.keys() {
        println!("{key}");
    }

    Ok(())
}

pub fn list_cloud_data(engine: &mut Engine) -> Result<()> {
    let (metadata_blobs, data_blobs) = engine.list_cloud_data()?;

    display::print_banner("metadata", engine.back_end_id());
    for (key, bytes) in &metadata_blobs {
        println!("{key}: {} bytes", bytes.len());
    }
    println!();

    display::print_banner("data", engine.back_end_id());
    for (key, bytes) in &data_blobs {
        println!("{key}: {} bytes", bytes.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dot_and_dotdot_segments() {
        assert_eq!(normalize_logical_path("a/./b/../c"), "a/c");
        assert_eq!(normalize_logical_path("//a//b/"), "a/b");
        assert_eq!(normalize_logical_path("a/b"), "a/b");
    }

    #[test]
    fn normalizes_leading_dotdot_to_empty_prefix() {
        assert_eq!(normalize_logical_path("../a"), "a");
    }
}
