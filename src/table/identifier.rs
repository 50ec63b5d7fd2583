// SPDX-License-Identifier: PMPL-1.0-or-later

//! Concept identifier <-> label table
//!
//! Rows carry a concept identifier plus one label per language column.
//! Labels are indexed by the trimmed, case-folded source-language label;
//! the first row for a label wins, and tables loaded earlier shadow later
//! ones.

use super::TableFile;
use crate::error::LocalizeError;
use crate::normalize;
use crate::types::ConceptId;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const IDENTIFIER_COLUMN: &str = "identifier";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierRow {
    pub id: ConceptId,
    /// Language code -> non-empty label
    pub labels: BTreeMap<String, String>,
}

impl IdentifierRow {
    pub fn new(id: ConceptId) -> Self {
        Self {
            id,
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, lang: &str, label: &str) -> Self {
        let label = label.trim();
        if !label.is_empty() {
            self.labels.insert(lang.to_string(), label.to_string());
        }
        self
    }

    pub fn label(&self, lang: &str) -> Option<&str> {
        self.labels.get(lang).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IdentifierTable {
    source_lang: String,
    rows: Vec<IdentifierRow>,
    by_id: HashMap<ConceptId, usize>,
    by_label: HashMap<String, usize>,
}

impl IdentifierTable {
    pub fn new(source_lang: &str) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            ..Self::default()
        }
    }

    pub fn from_rows(source_lang: &str, rows: impl IntoIterator<Item = IdentifierRow>) -> Self {
        let mut table = Self::new(source_lang);
        for row in rows {
            table.insert(row);
        }
        table
    }

    /// Add a row unless its identifier is already present.
    ///
    /// The row's source label is indexed only if no earlier row owns it.
    pub fn insert(&mut self, row: IdentifierRow) -> bool {
        if self.by_id.contains_key(&row.id) {
            return false;
        }
        let index = self.rows.len();
        self.by_id.insert(row.id.clone(), index);
        if let Some(label) = row.label(&self.source_lang) {
            let key = label_key(label);
            if !key.is_empty() {
                self.by_label.entry(key).or_insert(index);
            }
        }
        self.rows.push(row);
        true
    }

    /// Read an `identifier,<lang>,<lang>...` table.
    pub fn from_csv(path: &Path, source_lang: &str) -> Result<Self, LocalizeError> {
        let mut table = Self::new(source_lang);
        table.merge_csv(path)?;
        Ok(table)
    }

    /// Load several tables; earlier paths take precedence, absent ones are skipped.
    pub fn load_all(paths: &[PathBuf], source_lang: &str) -> Result<Self, LocalizeError> {
        let mut table = Self::new(source_lang);
        let mut found = false;
        for path in paths {
            if !path.is_file() {
                warn!(path = %path.display(), "identifier table not found, skipping");
                continue;
            }
            found = true;
            let added = table.merge_csv(path)?;
            info!(path = %path.display(), rows = added, "loaded identifier table");
        }
        if !found {
            let first = paths.first().cloned().unwrap_or_default();
            return Err(LocalizeError::TableNotFound(first));
        }
        Ok(table)
    }

    fn merge_csv(&mut self, path: &Path) -> Result<usize, LocalizeError> {
        let file = TableFile::read(path)?;
        let id_column = file.require(path, IDENTIFIER_COLUMN)?;
        let languages: Vec<(usize, String)> = file
            .headers
            .iter()
            .enumerate()
            .filter(|(i, header)| *i != id_column && !header.is_empty())
            .map(|(i, header)| (i, header.clone()))
            .collect();

        let mut added = 0;
        for (line, record) in file.rows.iter().enumerate() {
            let raw_id = TableFile::cell(record, id_column);
            let id = match raw_id.parse::<ConceptId>() {
                Ok(id) => id,
                Err(_) => {
                    warn!(
                        path = %path.display(),
                        row = line + 2,
                        identifier = raw_id,
                        "skipping row with invalid identifier"
                    );
                    continue;
                }
            };
            let row = languages
                .iter()
                .fold(IdentifierRow::new(id), |row, (i, lang)| {
                    row.with_label(lang, TableFile::cell(record, *i))
                });
            if self.insert(row) {
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn by_identifier(&self, id: &str) -> Option<&IdentifierRow> {
        let id: ConceptId = id.parse().ok()?;
        self.by_id.get(&id).map(|&i| &self.rows[i])
    }

    /// Row whose source-language label matches `label` (trimmed, case-insensitive).
    pub fn by_label(&self, label: &str) -> Option<&IdentifierRow> {
        self.by_label.get(&label_key(label)).map(|&i| &self.rows[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn label_key(label: &str) -> String {
    normalize::fold(label.trim())
}
