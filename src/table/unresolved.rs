// SPDX-License-Identifier: PMPL-1.0-or-later

//! Labels that still have no concept identifier
//!
//! A single-column table (header = source language). Runs only ever append
//! to it, never duplicating an entry whose folded form is present; entries
//! leave the file only once a resolver confirms them.

use super::TableFile;
use crate::error::LocalizeError;
use crate::normalize;
use crate::types::ConceptId;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct UnresolvedConcepts {
    path: PathBuf,
    column: String,
    labels: Vec<String>,
    known: HashSet<String>,
    pending: Vec<String>,
}

impl UnresolvedConcepts {
    /// Read `path`; a missing file is an empty queue.
    pub fn load(path: &Path, column: &str) -> Result<Self, LocalizeError> {
        let mut queue = Self {
            path: path.to_path_buf(),
            column: column.to_string(),
            labels: Vec::new(),
            known: HashSet::new(),
            pending: Vec::new(),
        };
        if !path.is_file() {
            return Ok(queue);
        }
        let file = TableFile::read(path)?;
        let index = file.require(path, column)?;
        for row in &file.rows {
            let label = TableFile::cell(row, index);
            if !label.is_empty() && queue.known.insert(normalize::fold(label)) {
                queue.labels.push(label.to_string());
            }
        }
        Ok(queue)
    }

    /// Queue `label` for resolution. Blank labels, concept identifiers and
    /// labels already present (case-insensitively) are ignored.
    pub fn queue(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || ConceptId::is_concept_id(label) {
            return false;
        }
        if !self.known.insert(normalize::fold(label)) {
            return false;
        }
        self.labels.push(label.to_string());
        self.pending.push(label.to_string());
        true
    }

    /// Append queued labels to the file, creating it with a header if needed.
    pub fn persist(&mut self) -> io::Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let new_file = !self.path.exists();
        let handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::Writer::from_writer(handle);
        if new_file {
            writer.write_record([self.column.as_str()])?;
        }
        for label in &self.pending {
            writer.write_record([label.as_str()])?;
        }
        writer.flush()?;
        let written = self.pending.len();
        self.pending.clear();
        Ok(written)
    }

    /// Rewrite the file without the given labels (matched case-insensitively).
    pub fn retain_unresolved(&mut self, resolved: &[String]) -> io::Result<()> {
        let drop: HashSet<String> = resolved.iter().map(|l| normalize::fold(l.trim())).collect();
        self.labels.retain(|l| !drop.contains(&normalize::fold(l)));
        self.pending.retain(|l| !drop.contains(&normalize::fold(l)));
        self.known.retain(|k| !drop.contains(k));

        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record([self.column.as_str()])?;
        for label in &self.labels {
            writer.write_record([label.as_str()])?;
        }
        writer.flush()?;
        self.pending.clear();
        Ok(())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
