// SPDX-License-Identifier: PMPL-1.0-or-later

//! Path and link synchronization
//!
//! File and directory names are mapped by one [`SegmentRule`] into a
//! [`RewritePlan`]. Internal links are rewritten through a [`LinkMap`] built
//! from that plan: a link to an entry of the tree follows exactly the rename
//! that happened to it, and a link to something absent is named by the same
//! rule.

pub mod href;
pub mod plan;
pub mod segment;

pub use href::{rewrite_href, LinkMap, LinkRule};
pub use plan::{apply_plan, plan_copy, plan_in_place, RewritePlan};
pub use segment::{map_entry_name, plan_segment, split_extension, SegmentOutcome};

use crate::table::{IdentifierTable, TranslationTable};
use crate::types::{EntryKind, RenameMode};
use std::path::PathBuf;

/// How a single segment is renamed
#[derive(Debug, Clone)]
pub enum SegmentRule<'t> {
    /// Through the translation table
    Translate(&'t TranslationTable),
    /// Source-language label -> concept identifier
    LabelToIdentifier(&'t IdentifierTable),
    /// Concept identifier -> label in `lang`; other names are left alone
    IdentifierToLabel { table: &'t IdentifierTable, lang: String },
}

impl SegmentRule<'_> {
    pub fn mode(&self) -> RenameMode {
        match self {
            SegmentRule::Translate(_) => RenameMode::Translate,
            SegmentRule::LabelToIdentifier(_) => RenameMode::LabelToIdentifier,
            SegmentRule::IdentifierToLabel { lang, .. } => RenameMode::IdentifierToLabel(lang.clone()),
        }
    }
}

/// An entry under the run root, by relative path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TreeEntry {
    pub rel: PathBuf,
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn file(rel: impl Into<PathBuf>) -> Self {
        Self {
            rel: rel.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(rel: impl Into<PathBuf>) -> Self {
        Self {
            rel: rel.into(),
            kind: EntryKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn depth(&self) -> usize {
        self.rel.components().count()
    }
}
