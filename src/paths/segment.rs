// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mapping of single path segments

use super::SegmentRule;
use crate::normalize;
use crate::types::{ConceptId, MissingSet};

/// Result of mapping one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    Mapped(String),
    /// Nothing to do (already in target form, or not mappable by this rule)
    Unchanged,
    /// No table entry for the segment
    Missing(String),
    /// Identifier row exists but has no label in the target language
    MissingLabel { id: String },
}

impl SegmentOutcome {
    /// The mapped name, or `original` when the segment stays as is.
    pub fn apply(self, original: &str, missing: &mut MissingSet) -> String {
        match self {
            SegmentOutcome::Mapped(name) => name,
            SegmentOutcome::Unchanged => original.to_string(),
            SegmentOutcome::Missing(gap) | SegmentOutcome::MissingLabel { id: gap } => {
                missing.insert(gap);
                original.to_string()
            }
        }
    }
}

/// Split `name` into basename and extension.
///
/// Only a suffix of 1 to 10 ASCII alphanumerics after a non-empty basename
/// counts as an extension, so `St. Louis` and `.htaccess` stay whole.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(dot) if dot > 0 => {
            let ext = &name[dot + 1..];
            if (1..=10).contains(&ext.len()) && ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
                (&name[..dot], Some(ext))
            } else {
                (name, None)
            }
        }
        _ => (name, None),
    }
}

/// Map a bare segment (no extension handling) through `rule`.
pub fn plan_segment(name: &str, rule: &SegmentRule<'_>) -> SegmentOutcome {
    if name.trim().is_empty() {
        return SegmentOutcome::Unchanged;
    }
    let outcome = match rule {
        SegmentRule::Translate(table) => match table.lookup(name) {
            Some(target) => SegmentOutcome::Mapped(target.to_string()),
            None => SegmentOutcome::Missing(normalize::normalize(name)),
        },
        SegmentRule::LabelToIdentifier(table) => {
            if ConceptId::is_concept_id(name) {
                return SegmentOutcome::Unchanged;
            }
            match table.by_label(name) {
                Some(row) => SegmentOutcome::Mapped(row.id.to_string()),
                None => SegmentOutcome::Missing(name.trim().to_string()),
            }
        }
        SegmentRule::IdentifierToLabel { table, lang } => {
            if !ConceptId::is_concept_id(name) {
                return SegmentOutcome::Unchanged;
            }
            match table.by_identifier(name) {
                Some(row) => match row.label(lang) {
                    Some(label) => SegmentOutcome::Mapped(label.to_string()),
                    None => SegmentOutcome::MissingLabel { id: name.to_string() },
                },
                None => SegmentOutcome::Missing(name.to_string()),
            }
        }
    };
    match outcome {
        SegmentOutcome::Mapped(target) if target == name => SegmentOutcome::Unchanged,
        SegmentOutcome::Mapped(target) if !is_usable_name(&target) => {
            tracing::warn!(segment = name, %target, "mapped name is not a valid file name");
            SegmentOutcome::Unchanged
        }
        other => other,
    }
}

fn is_usable_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Map a tree entry name.
///
/// Directory names are mapped whole. File names are mapped only when they
/// carry a page extension, which is kept verbatim.
pub fn map_entry_name(
    name: &str,
    is_dir: bool,
    rule: &SegmentRule<'_>,
    page_extensions: &[String],
) -> SegmentOutcome {
    if is_dir {
        return plan_segment(name, rule);
    }
    match split_extension(name) {
        (base, Some(ext)) if is_page_extension(ext, page_extensions) => {
            with_extension(plan_segment(base, rule), ext)
        }
        _ => SegmentOutcome::Unchanged,
    }
}

pub(crate) fn with_extension(outcome: SegmentOutcome, ext: &str) -> SegmentOutcome {
    match outcome {
        SegmentOutcome::Mapped(base) => SegmentOutcome::Mapped(format!("{base}.{ext}")),
        other => other,
    }
}

pub(crate) fn is_page_extension(ext: &str, page_extensions: &[String]) -> bool {
    page_extensions.iter().any(|known| known.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{IdentifierRow, IdentifierTable, TranslationTable};

    fn exts() -> Vec<String> {
        vec!["html".to_string(), "htm".to_string()]
    }

    fn identifiers() -> IdentifierTable {
        IdentifierTable::from_rows(
            "en",
            [
                IdentifierRow::new("Q90".parse().unwrap())
                    .with_label("en", "Paris")
                    .with_label("fr", "Paris"),
                IdentifierRow::new("Q64".parse().unwrap())
                    .with_label("en", "Berlin")
                    .with_label("de", "Berlin"),
                IdentifierRow::new("Q1726".parse().unwrap()).with_label("en", "Munich"),
            ],
        )
    }

    #[test]
    fn extension_split_rules() {
        assert_eq!(split_extension("Paris.html"), ("Paris", Some("html")));
        assert_eq!(split_extension("St. Louis"), ("St. Louis", None));
        assert_eq!(split_extension(".htaccess"), (".htaccess", None));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", Some("gz")));
        assert_eq!(split_extension("notes."), ("notes.", None));
    }

    #[test]
    fn label_to_identifier() {
        let table = identifiers();
        let rule = SegmentRule::LabelToIdentifier(&table);
        assert_eq!(plan_segment("paris", &rule), SegmentOutcome::Mapped("Q90".into()));
        assert_eq!(plan_segment("Q90", &rule), SegmentOutcome::Unchanged);
        assert_eq!(plan_segment("Lyon", &rule), SegmentOutcome::Missing("Lyon".into()));
    }

    #[test]
    fn identifier_to_label_leaves_labels_alone() {
        let table = identifiers();
        let rule = SegmentRule::IdentifierToLabel {
            table: &table,
            lang: "en".to_string(),
        };
        assert_eq!(plan_segment("Q64", &rule), SegmentOutcome::Mapped("Berlin".into()));
        assert_eq!(plan_segment("Berlin", &rule), SegmentOutcome::Unchanged);
        assert_eq!(plan_segment("Q5", &rule), SegmentOutcome::Missing("Q5".into()));

        let french = SegmentRule::IdentifierToLabel {
            table: &table,
            lang: "fr".to_string(),
        };
        assert_eq!(
            plan_segment("Q1726", &french),
            SegmentOutcome::MissingLabel { id: "Q1726".into() }
        );
    }

    #[test]
    fn only_page_files_and_directories_are_renamed() {
        let table = identifiers();
        let rule = SegmentRule::LabelToIdentifier(&table);
        assert_eq!(
            map_entry_name("Paris.HTML", false, &rule, &exts()),
            SegmentOutcome::Mapped("Q90.HTML".into())
        );
        assert_eq!(map_entry_name("Paris.png", false, &rule, &exts()), SegmentOutcome::Unchanged);
        assert_eq!(
            map_entry_name("Berlin", true, &rule, &exts()),
            SegmentOutcome::Mapped("Q64".into())
        );
    }

    #[test]
    fn unknown_names_are_kept_and_recorded() {
        let table = TranslationTable::from_entries([("Cities", "Villes")]);
        let rule = SegmentRule::Translate(&table);
        let mut missing = MissingSet::new();
        let mapped = map_entry_name("Cities", true, &rule, &exts()).apply("Cities", &mut missing);
        let kept = map_entry_name("Europe", true, &rule, &exts()).apply("Europe", &mut missing);
        assert_eq!(mapped, "Villes");
        assert_eq!(kept, "Europe");
        assert!(missing.contains("Europe"));
        assert_eq!(missing.len(), 1);
    }

    #[test]
    fn unusable_targets_are_not_applied() {
        let table = TranslationTable::from_entries([("Either", "this/that")]);
        let rule = SegmentRule::Translate(&table);
        assert_eq!(plan_segment("Either", &rule), SegmentOutcome::Unchanged);
    }
}
