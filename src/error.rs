// SPDX-License-Identifier: PMPL-1.0-or-later

//! Structural errors
//!
//! Only problems that make a run impossible live here: a missing input
//! directory, an unreadable or malformed table, a contradictory job. They
//! are raised before anything on disk is touched. Resolution gaps,
//! rename collisions and per-file IO failures are not errors; they are
//! recorded in the [`RunReport`](crate::types::RunReport).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocalizeError {
    #[error("directory does not exist or is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("required table not found: {0}")]
    TableNotFound(PathBuf),

    #[error("table {path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("failed to read table {path}: {source}")]
    TableRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write table {path}: {source}")]
    TableWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("no translations found for language '{lang}' (looked in {dir})")]
    NoTranslations { lang: String, dir: PathBuf },

    #[error("renaming requires an output directory or an explicit in-place request")]
    RenameNeedsDestination,

    #[error("output directory must differ from the input directory: {0}")]
    OutputIsSource(PathBuf),

    #[error("nothing to do: the job neither translates content nor renames paths")]
    NothingToDo,

    #[error("invalid concept identifier: '{0}' (expected Q followed by digits)")]
    InvalidIdentifier(String),

    #[error("output file already exists (use append or overwrite): {0}")]
    OutputExists(PathBuf),

    #[error("invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl LocalizeError {
    pub(crate) fn table_read(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::TableRead {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn table_write(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::TableWrite {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn missing_column(path: impl Into<PathBuf>, column: &str) -> Self {
        Self::MissingColumn {
            path: path.into(),
            column: column.to_string(),
        }
    }
}

pub type Result<T, E = LocalizeError> = std::result::Result<T, E>;
