// SPDX-License-Identifier: PMPL-1.0-or-later

//! Run configuration
//!
//! Everything that used to be a fixed path or a module-level constant is a
//! field here, passed explicitly into the orchestrator. Values come from an
//! optional YAML file; every field has a default, and CLI flags override.

use crate::error::LocalizeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalizeConfig {
    /// Column holding canonical source text in every table
    pub source_lang: String,
    /// Extensions (without dot, lowercase) of files treated as pages
    pub page_extensions: Vec<String>,
    /// Directory searched for `translations*.csv` files
    pub translations_dir: PathBuf,
    /// Identifier tables, earlier tables take precedence
    pub identifier_tables: Vec<PathBuf>,
    /// Single-column file of labels still lacking an identifier
    pub unresolved_path: PathBuf,
    /// Language columns written by `extract`
    pub extract_languages: Vec<String>,
    /// Texts at least this many characters long go to the long table
    pub long_text_threshold: usize,
}

impl Default for LocalizeConfig {
    fn default() -> Self {
        Self {
            source_lang: "en".to_string(),
            page_extensions: vec!["html".to_string(), "htm".to_string()],
            translations_dir: PathBuf::from("."),
            identifier_tables: vec![
                PathBuf::from("../data/labels.csv"),
                PathBuf::from("../data/concepts.csv"),
            ],
            unresolved_path: PathBuf::from("../data/missing.csv"),
            extract_languages: ["fr", "de", "nl", "es", "it"]
                .iter()
                .map(|l| l.to_string())
                .collect(),
            long_text_threshold: 100,
        }
    }
}

impl LocalizeConfig {
    pub fn from_file(path: &Path) -> Result<Self, LocalizeError> {
        let data = fs::read_to_string(path).map_err(|e| LocalizeError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: LocalizeConfig =
            serde_yaml::from_str(&data).map_err(|e| LocalizeError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validated(path)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, LocalizeError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Whether `path` has one of the configured page extensions.
    pub fn is_page(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.is_page_extension(ext))
            .unwrap_or(false)
    }

    pub fn is_page_extension(&self, ext: &str) -> bool {
        self.page_extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }

    fn validated(mut self, path: &Path) -> Result<Self, LocalizeError> {
        self.source_lang = self.source_lang.trim().to_string();
        if self.source_lang.is_empty() {
            return Err(LocalizeError::Config {
                path: path.to_path_buf(),
                message: "source_lang must not be empty".to_string(),
            });
        }
        self.page_extensions = self
            .page_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        if self.page_extensions.is_empty() {
            return Err(LocalizeError::Config {
                path: path.to_path_buf(),
                message: "page_extensions must list at least one extension".to_string(),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_the_site_layout() {
        let config = LocalizeConfig::default();
        assert_eq!(config.source_lang, "en");
        assert!(config.is_page(Path::new("a/Paris.html")));
        assert!(config.is_page(Path::new("INDEX.HTM")));
        assert!(!config.is_page(Path::new("logo.png")));
        assert!(!config.is_page(Path::new("README")));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("localize.yaml");
        fs::write(&path, "source_lang: fr\npage_extensions: [\".xhtml\"]\n").unwrap();

        let config = LocalizeConfig::from_file(&path).unwrap();
        assert_eq!(config.source_lang, "fr");
        assert_eq!(config.page_extensions, vec!["xhtml".to_string()]);
        assert_eq!(config.long_text_threshold, 100);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("localize.yaml");
        fs::write(&path, "sourcelang: fr\n").unwrap();
        assert!(matches!(
            LocalizeConfig::from_file(&path),
            Err(LocalizeError::Config { .. })
        ));
    }
}
