// SPDX-License-Identifier: PMPL-1.0-or-later

//! Core type definitions for site-localize

use crate::error::LocalizeError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

static CONCEPT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Q[1-9][0-9]*$").unwrap());

/// Stable, language-neutral concept identifier (`Q` + digits, no leading zero)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConceptId(String);

impl ConceptId {
    /// Whether `value` has the syntactic shape of a concept identifier.
    pub fn is_concept_id(value: &str) -> bool {
        CONCEPT_ID.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ConceptId {
    type Err = LocalizeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if Self::is_concept_id(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(LocalizeError::InvalidIdentifier(value.to_string()))
        }
    }
}

impl TryFrom<String> for ConceptId {
    type Error = LocalizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConceptId> for String {
    fn from(id: ConceptId) -> Self {
        id.0
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Distinct, case-preserved strings that no table entry resolved.
///
/// Ordered so reports are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissingSet(BTreeSet<String>);

impl MissingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a gap. Blank strings are ignored.
    pub fn insert(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text.trim().is_empty() {
            return false;
        }
        self.0.insert(text)
    }

    pub fn merge(&mut self, other: MissingSet) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, text: &str) -> bool {
        self.0.contains(text)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for MissingSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = MissingSet::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

/// How path segments are renamed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameMode {
    /// Through the translation table (copy mode only)
    Translate,
    /// Human-readable label -> concept identifier
    LabelToIdentifier,
    /// Concept identifier -> label in the given language
    IdentifierToLabel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum MoveStatus {
    /// Computed but not executed (dry run, or not yet applied)
    Planned,
    Applied,
    /// The wanted target already exists or is claimed by another entry. In
    /// place the entry is left alone; in a copy it is written under its
    /// original name, which is what `to` then holds.
    Collision(PathBuf),
    Failed(String),
}

/// One entry of a rewrite plan: original path -> new path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMove {
    pub from: PathBuf,
    pub to: PathBuf,
    pub kind: EntryKind,
    #[serde(flatten)]
    pub status: MoveStatus,
}

impl PlannedMove {
    pub fn is_collision(&self) -> bool {
        matches!(self.status, MoveStatus::Collision(_))
    }
}

/// A file that could not be read or written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub pages_processed: usize,
    pub pages_changed: usize,
    pub files_copied: usize,
    pub files_renamed: usize,
    pub directories_renamed: usize,
    pub collisions: usize,
    pub failures: usize,
}

/// Outcome of one orchestration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub created_at: String,
    pub root: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename_mode: Option<RenameMode>,
    pub dry_run: bool,
    pub statistics: RunStatistics,
    pub moves: Vec<PlannedMove>,
    pub failures: Vec<FileFailure>,
    pub missing_text: MissingSet,
    pub missing_segments: MissingSet,
    /// Labels newly queued into the unresolved-concepts file
    pub queued_concepts: Vec<String>,
}

impl RunReport {
    pub fn new(root: PathBuf, output: Option<PathBuf>, dry_run: bool) -> Self {
        Self {
            created_at: chrono::Utc::now().to_rfc3339(),
            root,
            output,
            rename_mode: None,
            dry_run,
            statistics: RunStatistics::default(),
            moves: Vec::new(),
            failures: Vec::new(),
            missing_text: MissingSet::new(),
            missing_segments: MissingSet::new(),
            queued_concepts: Vec::new(),
        }
    }

    pub fn collisions(&self) -> impl Iterator<Item = &PlannedMove> {
        self.moves.iter().filter(|m| m.is_collision())
    }
}
