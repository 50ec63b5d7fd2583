// SPDX-License-Identifier: PMPL-1.0-or-later

//! Lookup tables loaded once per run
//!
//! - [`TranslationTable`]: source text -> translated text for one language
//! - [`IdentifierTable`]: concept identifier <-> per-language labels
//! - [`UnresolvedConcepts`]: labels still waiting for an identifier
//!
//! Tables are read-only after loading; every run borrows them immutably.

pub mod identifier;
pub mod translation;
pub mod unresolved;

pub use identifier::{IdentifierRow, IdentifierTable, IDENTIFIER_COLUMN};
pub use translation::TranslationTable;
pub use unresolved::UnresolvedConcepts;

use crate::error::LocalizeError;
use std::path::Path;

/// Header-aware view over a UTF-8 table file.
pub(crate) struct TableFile {
    pub headers: Vec<String>,
    pub rows: Vec<csv::StringRecord>,
}

impl TableFile {
    pub fn read(path: &Path) -> Result<Self, LocalizeError> {
        if !path.is_file() {
            return Err(LocalizeError::TableNotFound(path.to_path_buf()));
        }
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| LocalizeError::table_read(path, e))?;
        let headers = reader
            .headers()
            .map_err(|e| LocalizeError::table_read(path, e))?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();
        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LocalizeError::table_read(path, e))?;
        Ok(Self { headers, rows })
    }

    /// Index of `column`, matching headers case-insensitively.
    pub fn column(&self, column: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(column))
    }

    pub fn require(&self, path: &Path, column: &str) -> Result<usize, LocalizeError> {
        self.column(column)
            .ok_or_else(|| LocalizeError::missing_column(path, column))
    }

    /// Trimmed cell, empty when the row is short.
    pub fn cell<'r>(row: &'r csv::StringRecord, index: usize) -> &'r str {
        row.get(index).map(str::trim).unwrap_or("")
    }
}
