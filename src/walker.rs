//! Recursive directory walk for `backup <dir>` (external collaborator).
//!
//! Mirrors `os.walk`: only files are visited, empty directories are never
//! emitted (SPEC_FULL.md §5).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// One file discovered under a backup root, paired with the logical path
/// it should be stored under (root-relative, forward-slash separated).
pub struct WalkEntry {
    pub local_path: PathBuf,
    pub logical_path: String,
}

pub fn walk(root: &Path) -> Result<Vec<WalkEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).into_iter() {
        let entry = entry.with_context(|| format!("failed to read entry under {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("{} is not under {}", entry.path().display(), root.display()))?;

        let logical_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        entries.push(WalkEntry {
            local_path: entry.path().to_path_buf(),
            logical_path,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn visits_only_files_and_uses_forward_slash_logical_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/x.txt"), b"x").unwrap();
        fs::write(dir.path().join("a/b/y.txt"), b"y").unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();

        let mut entries = walk(dir.path()).unwrap();
        entries.sort_by(|a, b| a.logical_path.cmp(&b.logical_path));

        let paths: Vec<_> = entries.iter().map(|e| e.logical_path.clone()).collect();
        assert_eq!(paths, vec!["a/b/y.txt".to_string(), "a/x.txt".to_string()]);
    }
}
