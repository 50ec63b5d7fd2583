// SPDX-License-Identifier: PMPL-1.0-or-later

//! Concept resolution
//!
//! Turns queued labels into identifier-table rows. The lookup service and
//! the choice between ambiguous candidates are supplied by the caller;
//! nothing here talks to the network or prompts.

use crate::error::LocalizeError;
use crate::table::{IdentifierRow, IdentifierTable, TableFile, UnresolvedConcepts, IDENTIFIER_COLUMN};
use crate::types::ConceptId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{info, warn};

/// One search hit for a label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: ConceptId,
    pub label: Option<String>,
    pub description: Option<String>,
}

impl Candidate {
    pub fn new(id: ConceptId) -> Self {
        Self {
            id,
            label: None,
            description: None,
        }
    }
}

/// Lookup service for concept identifiers
pub trait ConceptResolver {
    /// Candidates for a source-language label.
    fn search(&self, label: &str) -> anyhow::Result<Vec<Candidate>>;

    /// Labels of `id` in each of `langs` (absent languages may be omitted).
    fn labels(&self, id: &ConceptId, langs: &[String]) -> anyhow::Result<BTreeMap<String, String>>;
}

/// Picks an identifier for a label, or declines
pub trait AmbiguityStrategy {
    fn choose(&mut self, label: &str, candidates: &[Candidate]) -> Option<ConceptId>;
}

/// Batch strategy: never guesses between several candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive {
    /// Take a sole candidate without confirmation
    pub accept_single: bool,
}

impl AmbiguityStrategy for NonInteractive {
    fn choose(&mut self, _label: &str, candidates: &[Candidate]) -> Option<ConceptId> {
        match candidates {
            [only] if self.accept_single => Some(only.id.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    /// Label -> chosen identifier, appended to the identifier table
    pub resolved: Vec<(String, ConceptId)>,
    /// Labels that already had a row
    pub already_known: Vec<String>,
    /// Labels left in the unresolved file
    pub kept: Vec<String>,
    /// Label -> search error
    pub errors: Vec<(String, String)>,
}

/// Resolve every queued label.
///
/// Labels already in the identifier table leave the queue. A search error
/// or a declined choice keeps the label queued. A resolved label becomes a
/// new identifier-table row, with the queued label standing in for an empty
/// source-language label. Only confirmed labels are removed from the queue.
pub fn resolve_unresolved(
    unresolved: &mut UnresolvedConcepts,
    identifier_table: &Path,
    source_lang: &str,
    langs: &[String],
    resolver: &dyn ConceptResolver,
    strategy: &mut dyn AmbiguityStrategy,
) -> Result<ResolveReport, LocalizeError> {
    let mut table = if identifier_table.is_file() {
        IdentifierTable::from_csv(identifier_table, source_lang)?
    } else {
        IdentifierTable::new(source_lang)
    };
    let mut languages: Vec<String> = vec![source_lang.to_string()];
    languages.extend(langs.iter().filter(|l| *l != source_lang).cloned());

    let mut report = ResolveReport::default();
    let mut new_rows: Vec<(ConceptId, BTreeMap<String, String>)> = Vec::new();

    for label in unresolved.labels().to_vec() {
        if table.by_label(&label).is_some() {
            report.already_known.push(label);
            continue;
        }
        let candidates = match resolver.search(&label) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(%label, error = %e, "concept search failed");
                report.errors.push((label.clone(), e.to_string()));
                report.kept.push(label);
                continue;
            }
        };
        let Some(id) = strategy.choose(&label, &candidates) else {
            report.kept.push(label);
            continue;
        };
        if table.by_identifier(id.as_str()).is_some() {
            warn!(%label, %id, "identifier already present, keeping label queued");
            report.kept.push(label);
            continue;
        }

        let mut labels = resolver.labels(&id, &languages).unwrap_or_else(|e| {
            warn!(%id, error = %e, "cannot fetch labels");
            BTreeMap::new()
        });
        let source = labels.entry(source_lang.to_string()).or_default();
        if source.trim().is_empty() {
            *source = label.clone();
        }
        let row = languages
            .iter()
            .fold(IdentifierRow::new(id.clone()), |row, lang| {
                row.with_label(lang, labels.get(lang).map(String::as_str).unwrap_or(""))
            });
        table.insert(row);
        info!(%label, %id, "resolved concept");
        new_rows.push((id.clone(), labels));
        report.resolved.push((label, id));
    }

    append_rows(identifier_table, &languages, &new_rows)?;
    let confirmed: Vec<String> = report
        .resolved
        .iter()
        .map(|(label, _)| label.clone())
        .chain(report.already_known.iter().cloned())
        .collect();
    if !confirmed.is_empty() {
        unresolved
            .retain_unresolved(&confirmed)
            .map_err(|e| LocalizeError::table_write(unresolved.path(), e.into()))?;
    }
    Ok(report)
}

/// Append rows in the column order of the existing file (or a new header).
fn append_rows(
    path: &Path,
    languages: &[String],
    rows: &[(ConceptId, BTreeMap<String, String>)],
) -> Result<(), LocalizeError> {
    if rows.is_empty() {
        return Ok(());
    }
    let existing_header = if path.is_file() {
        let file = TableFile::read(path)?;
        (!file.headers.iter().all(String::is_empty)).then_some(file.headers)
    } else {
        None
    };
    let write_header = existing_header.is_none();
    let header = existing_header.unwrap_or_else(|| {
        std::iter::once(IDENTIFIER_COLUMN.to_string())
            .chain(languages.iter().cloned())
            .collect()
    });

    let handle = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LocalizeError::table_write(path, e.into()))?;
    let mut writer = csv::Writer::from_writer(handle);
    write_rows(&mut writer, &header, write_header, rows)
        .map_err(|e| LocalizeError::table_write(path, e))
}

fn write_rows<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    header: &[String],
    with_header: bool,
    rows: &[(ConceptId, BTreeMap<String, String>)],
) -> Result<(), csv::Error> {
    if with_header {
        writer.write_record(header)?;
    }
    for (id, labels) in rows {
        let record: Vec<&str> = header
            .iter()
            .map(|column| {
                if column.eq_ignore_ascii_case(IDENTIFIER_COLUMN) {
                    id.as_str()
                } else {
                    labels.get(column).map(String::as_str).unwrap_or("")
                }
            })
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
