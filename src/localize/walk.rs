// SPDX-License-Identifier: PMPL-1.0-or-later

//! Tree enumeration

use crate::paths::TreeEntry;
use crate::types::FileFailure;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Entries under `root` (root itself excluded), sorted by relative path.
///
/// `exclude` (typically an output directory inside the root) is skipped
/// together with everything below it. Unreadable entries are reported as
/// failures and the walk continues.
pub fn enumerate(
    root: &Path,
    recursive: bool,
    exclude: Option<&Path>,
) -> (Vec<TreeEntry>, Vec<FileFailure>) {
    let excluded: Option<PathBuf> = exclude.and_then(|p| fs::canonicalize(p).ok());
    let mut walker = WalkDir::new(root).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut entries = Vec::new();
    let mut failures = Vec::new();
    let walk = walker.into_iter().filter_entry(|entry| match &excluded {
        Some(excluded) => fs::canonicalize(entry.path())
            .map(|p| &p != excluded)
            .unwrap_or(true),
        None => true,
    });
    for item in walk {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                warn!(path = %path.display(), error = %e, "cannot read entry");
                failures.push(FileFailure {
                    path,
                    error: e.to_string(),
                });
                continue;
            }
        };
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        entries.push(if entry.file_type().is_dir() {
            TreeEntry::directory(rel)
        } else {
            TreeEntry::file(rel)
        });
    }
    entries.sort();
    (entries, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn depth_and_exclusion() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::create_dir_all(dir.path().join("out")).unwrap();
        fs::write(dir.path().join("index.html"), "").unwrap();
        fs::write(dir.path().join("a/b/page.html"), "").unwrap();
        fs::write(dir.path().join("out/copy.html"), "").unwrap();

        let out = dir.path().join("out");
        let (entries, failures) = enumerate(dir.path(), true, Some(&out));
        assert!(failures.is_empty());
        let rels: Vec<PathBuf> = entries.iter().map(|e| e.rel.clone()).collect();
        assert_eq!(
            rels,
            vec![
                PathBuf::from("a"),
                PathBuf::from("a/b"),
                PathBuf::from("a/b/page.html"),
                PathBuf::from("index.html"),
            ]
        );

        let (shallow, _) = enumerate(dir.path(), false, None);
        assert_eq!(shallow.len(), 3);
    }
}
