// SPDX-License-Identifier: PMPL-1.0-or-later

//! Tree orchestration
//!
//! A run validates the job, enumerates the tree and plans every rename
//! before anything changes. In place, the renames are applied first (strictly
//! in plan order) and pages are then rewritten where they ended up; a copy
//! reads every page from the untouched source. Either way links are
//! rewritten from the plan's outcome, so they follow exactly the renames
//! that happened. Page rewrites are pure and run in parallel; their results
//! are written sequentially.

mod extract;
mod walk;

pub use extract::{extract_tree, ExtractOptions, ExtractSummary, WriteMode};
pub use walk::enumerate;

use crate::config::LocalizeConfig;
use crate::error::LocalizeError;
use crate::markup::{self, Rewrite, Substitutions};
use crate::paths::{apply_plan, plan_copy, plan_in_place, LinkMap, RewritePlan, SegmentRule};
use crate::table::{TranslationTable, UnresolvedConcepts};
use crate::types::{EntryKind, FileFailure, MoveStatus, RunReport};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where a run writes its results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Rewrite and rename inside the source tree
    InPlace,
    /// Write a transformed copy of the tree to this directory
    Copy(PathBuf),
}

/// One orchestration request
#[derive(Debug, Clone)]
pub struct Job<'t> {
    pub root: PathBuf,
    pub recursive: bool,
    pub dry_run: bool,
    /// Table for text and attribute substitution
    pub content: Option<&'t TranslationTable>,
    /// Rule for renaming entries and rewriting internal links
    pub paths: Option<SegmentRule<'t>>,
    /// Must be given explicitly when `paths` is set; content-only jobs
    /// default to in place
    pub destination: Option<Destination>,
}

impl<'t> Job<'t> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            dry_run: false,
            content: None,
            paths: None,
            destination: None,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn translate_content(mut self, table: &'t TranslationTable) -> Self {
        self.content = Some(table);
        self
    }

    pub fn rename(mut self, rule: SegmentRule<'t>) -> Self {
        self.paths = Some(rule);
        self
    }

    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }
}

/// Result of rewriting one page
struct PageOutcome {
    /// Original path relative to the root
    rel: PathBuf,
    /// Where the page was read from
    path: PathBuf,
    result: Result<Rewrite, String>,
}

pub struct Localizer {
    config: LocalizeConfig,
}

impl Localizer {
    pub fn new(config: LocalizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocalizeConfig {
        &self.config
    }

    /// Run `job`. Structural problems are errors raised before anything on
    /// disk changes; everything else ends up in the report.
    pub fn run(&self, job: &Job<'_>) -> Result<RunReport, LocalizeError> {
        let destination = self.validate(job)?;
        let output = match &destination {
            Destination::Copy(dir) => Some(dir.clone()),
            Destination::InPlace => None,
        };
        let mut unresolved = match &job.paths {
            Some(SegmentRule::LabelToIdentifier(_)) if !job.dry_run => Some(UnresolvedConcepts::load(
                &self.config.unresolved_path,
                &self.config.source_lang,
            )?),
            _ => None,
        };

        let mut report = RunReport::new(job.root.clone(), output.clone(), job.dry_run);
        report.rename_mode = job.paths.as_ref().map(SegmentRule::mode);

        let (entries, failures) = enumerate(&job.root, job.recursive, output.as_deref());
        report.failures.extend(failures);
        info!(
            root = %job.root.display(),
            entries = entries.len(),
            dry_run = job.dry_run,
            "localizing tree"
        );

        let extensions = &self.config.page_extensions;
        let mut plan = match (&destination, &job.paths) {
            (Destination::Copy(out), rule) => plan_copy(
                &job.root,
                out,
                &entries,
                rule.as_ref(),
                extensions,
                &mut report.missing_segments,
            ),
            (Destination::InPlace, Some(rule)) => plan_in_place(
                &job.root,
                &entries,
                rule,
                extensions,
                &mut report.missing_segments,
            ),
            (Destination::InPlace, None) => RewritePlan::default(),
        };

        if !plan.is_empty() {
            info!(
                moves = plan.len(),
                collisions = plan.collisions(),
                "planned renames"
            );
        }
        if destination == Destination::InPlace {
            apply_plan(&mut plan, job.dry_run);
            debug!(
                files = plan.applied(EntryKind::File),
                directories = plan.applied(EntryKind::Directory),
                "renames applied"
            );
        }

        let links = job.paths.as_ref().map(|rule| {
            LinkMap::from_plan(&job.root, &plan, &entries, job.recursive, rule, extensions)
        });
        let pages: Vec<(PathBuf, PathBuf)> = entries
            .iter()
            .filter(|e| !e.is_dir() && self.config.is_page(&e.rel))
            .map(|e| {
                let current = match (&destination, &links) {
                    (Destination::InPlace, Some(links)) if !job.dry_run => links.final_path(&e.rel),
                    _ => e.rel.clone(),
                };
                (e.rel.clone(), job.root.join(current))
            })
            .collect();
        let outcomes = rewrite_pages(&pages, job.content, links.as_ref());
        report.statistics.pages_processed = pages.len();

        match &destination {
            Destination::InPlace => self.write_in_place(job, outcomes, &mut report),
            Destination::Copy(_) => self.write_copy(job, &plan, outcomes, &mut report),
        }
        self.record_plan(&destination, plan, &mut report);

        if let Some(queue) = unresolved.as_mut() {
            for label in report.missing_segments.iter() {
                if queue.queue(label) {
                    report.queued_concepts.push(label.to_string());
                }
            }
            match queue.persist() {
                Ok(0) => {}
                Ok(written) => info!(
                    path = %queue.path().display(),
                    labels = written,
                    "queued unresolved concepts"
                ),
                Err(e) => {
                    warn!(path = %queue.path().display(), error = %e, "cannot write unresolved concepts");
                    report.failures.push(FileFailure {
                        path: queue.path().to_path_buf(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report.statistics.failures = report.failures.len();
        Ok(report)
    }

    fn validate(&self, job: &Job<'_>) -> Result<Destination, LocalizeError> {
        if !job.root.is_dir() {
            return Err(LocalizeError::NotADirectory(job.root.clone()));
        }
        if job.content.is_none() && job.paths.is_none() {
            return Err(LocalizeError::NothingToDo);
        }
        let destination = match (&job.destination, &job.paths) {
            (Some(destination), _) => destination.clone(),
            (None, Some(_)) => return Err(LocalizeError::RenameNeedsDestination),
            (None, None) => Destination::InPlace,
        };
        if let Destination::Copy(out) = &destination {
            if same_location(out, &job.root) {
                return Err(LocalizeError::OutputIsSource(out.clone()));
            }
        }
        Ok(destination)
    }

    fn write_in_place(&self, job: &Job<'_>, outcomes: Vec<PageOutcome>, report: &mut RunReport) {
        for outcome in outcomes {
            let path = outcome.path;
            let rewrite = match outcome.result {
                Ok(rewrite) => rewrite,
                Err(error) => {
                    report.failures.push(FileFailure { path, error });
                    continue;
                }
            };
            merge_gaps(report, &rewrite);
            if !rewrite.changed {
                continue;
            }
            report.statistics.pages_changed += 1;
            if job.dry_run {
                debug!(path = %path.display(), "would rewrite");
                continue;
            }
            if let Err(e) = fs::write(&path, rewrite.html) {
                warn!(path = %path.display(), error = %e, "cannot write page");
                report.failures.push(FileFailure {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    /// Write every planned entry to its destination. Collisions still land
    /// in the copy, under their original names.
    fn write_copy(
        &self,
        job: &Job<'_>,
        plan: &RewritePlan,
        outcomes: Vec<PageOutcome>,
        report: &mut RunReport,
    ) {
        let mut pages: HashMap<PathBuf, PageOutcome> = outcomes
            .into_iter()
            .map(|outcome| (outcome.rel.clone(), outcome))
            .collect();
        for planned in &plan.moves {
            let rel = planned.from.strip_prefix(&job.root).unwrap_or(&planned.from);
            let page = pages.remove(rel);
            let written = match (planned.kind, page) {
                (EntryKind::Directory, _) => {
                    if job.dry_run {
                        Ok(())
                    } else {
                        fs::create_dir_all(&planned.to)
                    }
                }
                (EntryKind::File, Some(page)) => match page.result {
                    Ok(rewrite) => {
                        merge_gaps(report, &rewrite);
                        if rewrite.changed {
                            report.statistics.pages_changed += 1;
                        }
                        write_file(&planned.to, rewrite.html.as_bytes(), job.dry_run)
                    }
                    Err(error) => {
                        report.failures.push(FileFailure {
                            path: planned.from.clone(),
                            error,
                        });
                        continue;
                    }
                },
                (EntryKind::File, None) => {
                    report.statistics.files_copied += 1;
                    copy_file(&planned.from, &planned.to, job.dry_run)
                }
            };
            if let Err(e) = written {
                warn!(path = %planned.to.display(), error = %e, "cannot write output");
                report.failures.push(FileFailure {
                    path: planned.to.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Move renames and collisions into the report.
    fn record_plan(&self, destination: &Destination, plan: RewritePlan, report: &mut RunReport) {
        let output = match destination {
            Destination::Copy(out) => Some(out.as_path()),
            Destination::InPlace => None,
        };
        for planned in plan.moves {
            let renamed = match output {
                Some(out) => {
                    planned.from.strip_prefix(&report.root).ok()
                        != planned.to.strip_prefix(out).ok()
                }
                None => true,
            };
            if !renamed && !planned.is_collision() {
                continue;
            }
            let done = matches!(planned.status, MoveStatus::Applied)
                || (matches!(planned.status, MoveStatus::Planned) && (report.dry_run || output.is_some()));
            match (&planned.status, planned.kind) {
                (MoveStatus::Collision(_), _) => report.statistics.collisions += 1,
                (MoveStatus::Failed(error), _) => report.failures.push(FileFailure {
                    path: planned.from.clone(),
                    error: error.clone(),
                }),
                (_, EntryKind::File) if done => report.statistics.files_renamed += 1,
                (_, EntryKind::Directory) if done => report.statistics.directories_renamed += 1,
                _ => {}
            }
            report.moves.push(planned);
        }
    }
}

fn rewrite_pages(
    pages: &[(PathBuf, PathBuf)],
    text: Option<&TranslationTable>,
    links: Option<&LinkMap<'_>>,
) -> Vec<PageOutcome> {
    pages
        .par_iter()
        .map(|(rel, path)| {
            let subs = Substitutions {
                text,
                links: links.map(|map| map.for_page(rel)),
            };
            let result = fs::read(path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| {
                    markup::decode_document(bytes)
                        .ok_or_else(|| "neither UTF-8 nor Windows-1252".to_string())
                })
                .map(|html| markup::rewrite(&html, &subs));
            if let Err(error) = &result {
                warn!(path = %path.display(), %error, "cannot read page");
            }
            PageOutcome {
                rel: rel.clone(),
                path: path.clone(),
                result,
            }
        })
        .collect()
}

fn merge_gaps(report: &mut RunReport, rewrite: &Rewrite) {
    report.missing_text.merge(rewrite.missing_text.clone());
    report.missing_segments.merge(rewrite.missing_segments.clone());
}

fn write_file(to: &Path, contents: &[u8], dry_run: bool) -> std::io::Result<()> {
    if dry_run {
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(to, contents)
}

fn copy_file(from: &Path, to: &Path, dry_run: bool) -> std::io::Result<()> {
    if dry_run {
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to).map(|_| ())
}

fn same_location(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
