// SPDX-License-Identifier: PMPL-1.0-or-later

//! Rename plans
//!
//! A plan is computed in full before anything on disk changes. Collisions
//! are checked against the live tree and against targets claimed earlier in
//! the same plan, so a half-applied rename can never feed a wrong path into
//! a later computation.

use super::segment::map_entry_name;
use super::{SegmentRule, TreeEntry};
use crate::types::{EntryKind, MissingSet, MoveStatus, PlannedMove};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Ordered moves, built before any mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewritePlan {
    pub moves: Vec<PlannedMove>,
}

impl RewritePlan {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn collisions(&self) -> usize {
        self.moves.iter().filter(|m| m.is_collision()).count()
    }

    /// Moves of `kind` that were executed.
    pub fn applied(&self, kind: EntryKind) -> usize {
        self.moves
            .iter()
            .filter(|m| m.kind == kind && m.status == MoveStatus::Applied)
            .count()
    }
}

/// Plan renames of the tree under `root`, in place.
///
/// Files go first (shallowest first), then directories (deepest first).
/// Every move renames one entry inside its original parent, which is still
/// valid at that point because all of its descendants were planned first.
pub fn plan_in_place(
    root: &Path,
    entries: &[TreeEntry],
    rule: &SegmentRule<'_>,
    page_extensions: &[String],
    missing: &mut MissingSet,
) -> RewritePlan {
    let mut files: Vec<&TreeEntry> = entries.iter().filter(|e| !e.is_dir()).collect();
    let mut dirs: Vec<&TreeEntry> = entries.iter().filter(|e| e.is_dir()).collect();
    files.sort_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.rel.cmp(&b.rel)));
    dirs.sort_by(|a, b| b.depth().cmp(&a.depth()).then_with(|| a.rel.cmp(&b.rel)));

    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut plan = RewritePlan::default();

    for entry in files.into_iter().chain(dirs) {
        let Some(name) = entry.rel.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let outcome = map_entry_name(name, entry.is_dir(), rule, page_extensions);
        let new_name = outcome.apply(name, missing);
        if new_name == name {
            continue;
        }
        let from = root.join(&entry.rel);
        let to = from.with_file_name(&new_name);

        let status = if claimed.contains(&to) || occupied_by_other(&from, &to) {
            warn!(from = %from.display(), to = %to.display(), "rename target exists, skipping");
            MoveStatus::Collision(to.clone())
        } else {
            claimed.insert(to.clone());
            MoveStatus::Planned
        };
        plan.moves.push(PlannedMove {
            from,
            to,
            kind: entry.kind,
            status,
        });
    }
    plan
}

/// Whether `to` exists and is not `from` itself (case-only renames on
/// case-insensitive file systems resolve to the same entry).
fn occupied_by_other(from: &Path, to: &Path) -> bool {
    if fs::symlink_metadata(to).is_err() {
        return false;
    }
    match (fs::canonicalize(from), fs::canonicalize(to)) {
        (Ok(a), Ok(b)) => a != b,
        _ => true,
    }
}

/// Plan the destination of every entry when writing a copy to `output`.
///
/// Without a rule every entry keeps its relative path. Entries are placed
/// one depth level at a time under their parent's destination. Within a
/// level every entry's own name is reserved first, so a renamed entry never
/// displaces one that keeps its name. A renamed entry whose target is taken
/// is a collision and is still copied under its original name.
pub fn plan_copy(
    root: &Path,
    output: &Path,
    entries: &[TreeEntry],
    rule: Option<&SegmentRule<'_>>,
    page_extensions: &[String],
    missing: &mut MissingSet,
) -> RewritePlan {
    let mut sorted: Vec<&TreeEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.rel.cmp(&b.rel)));

    // Original relative path -> relative destination
    let mut placed: HashMap<&Path, PathBuf> = HashMap::new();
    let mut plan = RewritePlan::default();

    for level in sorted.chunk_by(|a, b| a.depth() == b.depth()) {
        let mut slots: Vec<(&TreeEntry, PathBuf, PathBuf)> = Vec::with_capacity(level.len());
        for &entry in level {
            let Some(name) = entry.rel.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let parent = match entry.rel.parent() {
                Some(parent) => placed.get(parent).cloned().unwrap_or_else(|| parent.to_path_buf()),
                None => PathBuf::new(),
            };
            let new_name = match rule {
                Some(rule) => map_entry_name(name, entry.is_dir(), rule, page_extensions).apply(name, missing),
                None => name.to_string(),
            };
            slots.push((entry, parent.join(name), parent.join(new_name)));
        }

        let mut claimed: HashSet<PathBuf> = slots.iter().map(|(_, own, _)| own.clone()).collect();
        for (entry, own, wanted) in slots {
            let (dest, status) = if wanted == own {
                (own, MoveStatus::Planned)
            } else if claimed.insert(wanted.clone()) {
                (wanted, MoveStatus::Planned)
            } else {
                warn!(
                    from = %entry.rel.display(),
                    to = %wanted.display(),
                    "destination already taken, copying under the original name"
                );
                (own, MoveStatus::Collision(output.join(&wanted)))
            };
            plan.moves.push(PlannedMove {
                from: root.join(&entry.rel),
                to: output.join(&dest),
                kind: entry.kind,
                status,
            });
            placed.insert(entry.rel.as_path(), dest);
        }
    }
    plan.moves.sort_by(|a, b| a.from.cmp(&b.from));
    plan
}

/// Execute an in-place plan in order.
///
/// Collisions are skipped. An IO failure is recorded on its move and the
/// remaining moves still run. A dry run leaves every move `Planned`.
pub fn apply_plan(plan: &mut RewritePlan, dry_run: bool) {
    if dry_run {
        return;
    }
    for planned in plan.moves.iter_mut() {
        if planned.status != MoveStatus::Planned {
            continue;
        }
        planned.status = match fs::rename(&planned.from, &planned.to) {
            Ok(()) => {
                debug!(from = %planned.from.display(), to = %planned.to.display(), "renamed");
                MoveStatus::Applied
            }
            Err(e) => {
                warn!(from = %planned.from.display(), error = %e, "rename failed");
                MoveStatus::Failed(e.to_string())
            }
        };
    }
}
