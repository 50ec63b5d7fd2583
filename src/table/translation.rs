// SPDX-License-Identifier: PMPL-1.0-or-later

//! Source text -> translated text
//!
//! Two maps are built at load time:
//!
//! - `exact`: the trimmed source key as recorded, case preserved
//! - `folded`: every normalized, case-folded variant of every key
//!
//! Both are filled first-wins in load order. When two distinct keys
//! canonicalize to the same variant, the earlier row keeps it; downstream
//! tables rely on that precedence, so it is not an error.

use super::TableFile;
use crate::error::LocalizeError;
use crate::normalize;
use crate::types::MissingSet;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
    len: usize,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(source, target)` pairs in precedence order.
    ///
    /// Pairs with an empty side, or whose target equals the source, are
    /// untranslated and skipped.
    pub fn from_entries<I, S, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut table = Self::new();
        for (source, target) in entries {
            table.insert(source.as_ref(), target.as_ref());
        }
        table
    }

    /// Insert one entry. Returns `false` when it was unusable or shadowed.
    pub fn insert(&mut self, source: &str, target: &str) -> bool {
        let source = source.trim();
        let target = target.trim();
        if source.is_empty() || target.is_empty() || source == target {
            return false;
        }
        match self.exact.entry(source.to_string()) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(slot) => {
                slot.insert(target.to_string());
            }
        }
        for variant in normalize::folded_variants(source) {
            if !variant.is_empty() {
                self.folded
                    .entry(variant)
                    .or_insert_with(|| target.to_string());
            }
        }
        self.len += 1;
        true
    }

    /// Append every entry of `other` that this table does not shadow.
    pub fn extend_from(&mut self, other: &[(String, String)]) {
        for (source, target) in other {
            self.insert(source, target);
        }
    }

    /// Read one table file, taking `lang` translations of `source_column`.
    ///
    /// When `source_column` is not a header the first column is used.
    pub fn from_csv(path: &Path, source_column: &str, lang: &str) -> Result<Self, LocalizeError> {
        let entries = read_pairs(path, source_column, lang)?;
        let mut table = Self::new();
        table.extend_from(&entries);
        Ok(table)
    }

    /// Load the short and long tables for `lang` from `dir`.
    ///
    /// Language-specific files (`translations_fr.csv`) are preferred over
    /// shared multi-column ones (`translations.csv`). The long table is loaded
    /// first, so a key present in both resolves to its long entry. A file
    /// without a `lang` column is skipped.
    pub fn load_for_language(
        dir: &Path,
        source_column: &str,
        lang: &str,
    ) -> Result<Self, LocalizeError> {
        let mut table = Self::new();
        for stem in ["long_translations", "translations"] {
            let specific = dir.join(format!("{stem}_{lang}.csv"));
            let path = if specific.is_file() {
                specific
            } else {
                dir.join(format!("{stem}.csv"))
            };
            if !path.is_file() {
                warn!(path = %path.display(), "translation file not found");
                continue;
            }
            match read_pairs(&path, source_column, lang) {
                Ok(entries) => {
                    let before = table.len();
                    table.extend_from(&entries);
                    info!(
                        path = %path.display(),
                        loaded = table.len() - before,
                        "loaded translations"
                    );
                }
                Err(LocalizeError::MissingColumn { path, column }) => {
                    warn!(path = %path.display(), %column, "language column absent, skipping");
                }
                Err(e) => return Err(e),
            }
        }
        if table.is_empty() {
            return Err(LocalizeError::NoTranslations {
                lang: lang.to_string(),
                dir: dir.to_path_buf(),
            });
        }
        Ok(table)
    }

    /// Resolve `text` through the ordered candidate keys.
    ///
    /// Exact, whitespace-normalized and separator-normalized keys are tried
    /// case-sensitively first, then the folded variants.
    pub fn lookup(&self, text: &str) -> Option<&str> {
        if self.is_empty() || text.trim().is_empty() {
            return None;
        }
        let candidates = normalize::candidates(text);
        candidates
            .exact
            .iter()
            .find_map(|key| self.exact.get(key))
            .or_else(|| {
                candidates
                    .folded
                    .iter()
                    .find_map(|key| self.folded.get(key))
            })
            .map(String::as_str)
    }

    /// Like [`lookup`](Self::lookup), recording the normalized text in
    /// `missing` when nothing matches.
    pub fn translate(&self, text: &str, missing: &mut MissingSet) -> Option<String> {
        match self.lookup(text) {
            Some(target) => Some(target.to_string()),
            None => {
                let normalized = normalize::normalize(text);
                if !normalized.is_empty() {
                    debug!(text = %normalized, "no translation");
                    missing.insert(normalized);
                }
                None
            }
        }
    }

    /// Number of usable entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

}

fn read_pairs(
    path: &Path,
    source_column: &str,
    lang: &str,
) -> Result<Vec<(String, String)>, LocalizeError> {
    let file = TableFile::read(path)?;
    let source = file.column(source_column).unwrap_or(0);
    let target = file.require(path, lang)?;
    Ok(file
        .rows
        .iter()
        .map(|row| {
            (
                TableFile::cell(row, source).to_string(),
                TableFile::cell(row, target).to_string(),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn table() -> TranslationTable {
        TranslationTable::from_entries([
            ("Welcome", "Bienvenue"),
            ("Paris - France", "Paris - La France"),
            ("Home", "Home"),
            ("", "vide"),
        ])
    }

    #[test]
    fn untranslated_rows_are_dropped() {
        let t = table();
        assert_eq!(t.len(), 2);
        assert!(t.lookup("Home").is_none());
    }

    #[test]
    fn exact_match_first() {
        assert_eq!(table().lookup("Welcome"), Some("Bienvenue"));
        assert_eq!(table().lookup("  Welcome \n"), Some("Bienvenue"));
    }

    #[test]
    fn separator_and_case_fallbacks_reach_the_same_entry() {
        let t = table();
        for observed in [
            "Paris - France",
            "Paris – France",
            "Paris • France",
            "paris - france",
            "PARIS—FRANCE",
        ] {
            assert_eq!(t.lookup(observed), Some("Paris - La France"), "{observed}");
        }
    }

    #[test]
    fn first_inserted_wins_on_collision() {
        let t = TranslationTable::from_entries([
            ("Contact", "Contact (1)"),
            ("contact", "Contact (2)"),
            ("Contact", "Contact (3)"),
        ]);
        assert_eq!(t.lookup("Contact"), Some("Contact (1)"));
        assert_eq!(t.lookup("contact"), Some("Contact (2)"));
        assert_eq!(t.lookup("CONTACT"), Some("Contact (1)"));
    }

    #[test]
    fn translate_records_missing_text_normalized() {
        let mut missing = MissingSet::new();
        assert!(table().translate("Good  bye", &mut missing).is_none());
        assert!(missing.contains("Good bye"));
    }

    #[test]
    fn language_specific_file_is_preferred() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("translations.csv"),
            "en,fr,de\nWelcome,Bienvenue,Willkommen\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("translations_fr.csv"),
            "en,fr\nWelcome,Salut\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("long_translations.csv"),
            "en,fr\n\"A long, long sentence.\",\"Une longue, longue phrase.\"\n",
        )
        .unwrap();

        let t = TranslationTable::load_for_language(dir.path(), "en", "fr").unwrap();
        assert_eq!(t.lookup("Welcome"), Some("Salut"));
        assert_eq!(
            t.lookup("A long, long sentence."),
            Some("Une longue, longue phrase.")
        );
    }

    #[test]
    fn long_entry_overrides_short_entry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("translations.csv"), "en,fr\nWelcome,Salut\nHome,Accueil\n").unwrap();
        fs::write(dir.path().join("long_translations.csv"), "en,fr\nWelcome,Bienvenue\n").unwrap();

        let t = TranslationTable::load_for_language(dir.path(), "en", "fr").unwrap();
        assert_eq!(t.lookup("Welcome"), Some("Bienvenue"));
        assert_eq!(t.lookup("welcome"), Some("Bienvenue"));
        assert_eq!(t.lookup("Home"), Some("Accueil"));
    }

    #[test]
    fn no_usable_entries_is_structural() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("translations.csv"), "en,de\nHello,Hallo\n").unwrap();
        let err = TranslationTable::load_for_language(dir.path(), "en", "fr").unwrap_err();
        assert!(matches!(err, LocalizeError::NoTranslations { .. }));
    }
}
