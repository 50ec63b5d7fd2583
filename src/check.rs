// SPDX-License-Identifier: PMPL-1.0-or-later

//! Label coverage check
//!
//! Every page stem under a directory should have a non-empty label in the
//! identifier table for the checked language.

use crate::config::LocalizeConfig;
use crate::error::LocalizeError;
use crate::localize::enumerate;
use crate::normalize;
use crate::paths::split_extension;
use crate::table::TableFile;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Page stems with no matching label
    pub missing_files: BTreeSet<String>,
    /// Table row numbers (header = 1) with an empty label
    pub empty_rows: Vec<usize>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.missing_files.is_empty() && self.empty_rows.is_empty()
    }
}

pub fn check_labels(
    config: &LocalizeConfig,
    root: &Path,
    lang: &str,
    labels_path: &Path,
    recursive: bool,
) -> Result<CheckReport, LocalizeError> {
    if !root.is_dir() {
        return Err(LocalizeError::NotADirectory(root.to_path_buf()));
    }
    let table = TableFile::read(labels_path)?;
    let column = table.require(labels_path, lang)?;

    let mut report = CheckReport::default();
    let mut known = HashSet::new();
    for (i, row) in table.rows.iter().enumerate() {
        let label = TableFile::cell(row, column);
        if label.is_empty() {
            report.empty_rows.push(i + 2);
        } else {
            known.insert(normalize::fold(label));
        }
    }

    let (entries, _) = enumerate(root, recursive, None);
    for entry in entries.iter().filter(|e| !e.is_dir() && config.is_page(&e.rel)) {
        let Some(name) = entry.rel.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let stem = split_extension(name).0;
        if !known.contains(&normalize::fold(stem)) {
            report.missing_files.insert(stem.to_string());
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn reports_unlabelled_pages_and_empty_cells() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("Paris.html"), "").unwrap();
        fs::write(dir.path().join("lyon.html"), "").unwrap();
        fs::write(dir.path().join("sub/Berlin.html"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let labels = dir.path().join("labels.csv");
        fs::write(&labels, "identifier,en,fr\nQ90,Paris,Paris\nQ64,Berlin,\nQ456,Lyon,Lyon\n").unwrap();

        let config = LocalizeConfig::default();
        let shallow = check_labels(&config, dir.path(), "fr", &labels, false).unwrap();
        assert!(shallow.missing_files.is_empty());
        assert_eq!(shallow.empty_rows, vec![3]);

        let deep = check_labels(&config, dir.path(), "fr", &labels, true).unwrap();
        assert_eq!(deep.missing_files.iter().collect::<Vec<_>>(), vec!["Berlin"]);
        assert!(!deep.is_clean());
    }

    #[test]
    fn unknown_language_is_structural() {
        let dir = TempDir::new().unwrap();
        let labels = dir.path().join("labels.csv");
        fs::write(&labels, "identifier,en\n").unwrap();
        assert!(matches!(
            check_labels(&LocalizeConfig::default(), dir.path(), "fr", &labels, true),
            Err(LocalizeError::MissingColumn { .. })
        ));
    }
}
