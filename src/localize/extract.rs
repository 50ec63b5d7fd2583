// SPDX-License-Identifier: PMPL-1.0-or-later

//! Seeding translation tables from a site tree

use super::walk::enumerate;
use crate::config::LocalizeConfig;
use crate::error::LocalizeError;
use crate::markup::{self, Extraction};
use crate::paths::split_extension;
use crate::table::TableFile;
use crate::types::FileFailure;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// How existing table files are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Refuse to touch existing files
    #[default]
    Create,
    /// Add entries not yet present
    Append,
    Overwrite,
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub output_dir: PathBuf,
    pub languages: Vec<String>,
    /// Texts with at least this many characters go to the long table
    pub threshold: usize,
    pub mode: WriteMode,
    pub skip_urls: bool,
    pub skip_filesystem: bool,
}

impl ExtractOptions {
    pub fn from_config(config: &LocalizeConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            languages: config.extract_languages.clone(),
            threshold: config.long_text_threshold,
            mode: WriteMode::Create,
            skip_urls: false,
            skip_filesystem: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    pub pages: usize,
    pub short_path: PathBuf,
    pub long_path: PathBuf,
    /// Rows written (new rows only when appending)
    pub short_written: usize,
    pub long_written: usize,
    pub failures: Vec<FileFailure>,
}

/// Extract texts, link components and file-system names from `root` into
/// `translations.csv` and `long_translations.csv`.
pub fn extract_tree(
    config: &LocalizeConfig,
    root: &Path,
    recursive: bool,
    options: &ExtractOptions,
) -> Result<ExtractSummary, LocalizeError> {
    if !root.is_dir() {
        return Err(LocalizeError::NotADirectory(root.to_path_buf()));
    }
    let short_path = options.output_dir.join("translations.csv");
    let long_path = options.output_dir.join("long_translations.csv");
    if options.mode == WriteMode::Create {
        for path in [&short_path, &long_path] {
            if path.exists() {
                return Err(LocalizeError::OutputExists(path.clone()));
            }
        }
    }

    let (entries, mut failures) = enumerate(root, recursive, None);
    let pages: Vec<PathBuf> = entries
        .iter()
        .filter(|e| !e.is_dir() && config.is_page(&e.rel))
        .map(|e| root.join(&e.rel))
        .collect();

    let results: Vec<Result<Extraction, FileFailure>> = pages
        .par_iter()
        .map(|path| {
            let bytes = fs::read(path).map_err(|e| FileFailure {
                path: path.clone(),
                error: e.to_string(),
            })?;
            let html = markup::decode_document(bytes).ok_or_else(|| FileFailure {
                path: path.clone(),
                error: "neither UTF-8 nor Windows-1252".to_string(),
            })?;
            Ok(markup::extract(&html))
        })
        .collect();

    let mut all = Extraction::default();
    for result in results {
        match result {
            Ok(extraction) => all.merge(extraction),
            Err(failure) => {
                warn!(path = %failure.path.display(), error = %failure.error, "cannot read page");
                failures.push(failure);
            }
        }
    }

    let mut short: BTreeSet<String> = BTreeSet::new();
    let mut long: BTreeSet<String> = BTreeSet::new();
    if !options.skip_urls {
        short.extend(all.url_components);
    }
    if !options.skip_filesystem {
        for entry in &entries {
            let Some(name) = entry.rel.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if entry.is_dir() {
                short.insert(name.to_string());
            } else if config.is_page(&entry.rel) {
                short.insert(split_extension(name).0.to_string());
            }
        }
    }
    for text in all.texts {
        if text.chars().count() < options.threshold {
            short.insert(text);
        } else {
            long.insert(text);
        }
    }

    fs::create_dir_all(&options.output_dir)
        .map_err(|e| LocalizeError::table_write(&options.output_dir, e.into()))?;
    let header = header(&config.source_lang, &options.languages);
    let short_written = write_table(&short_path, &header, &short, options.mode)?;
    let long_written = write_table(&long_path, &header, &long, options.mode)?;
    info!(
        pages = pages.len(),
        short = short_written,
        long = long_written,
        "extracted translatable text"
    );

    Ok(ExtractSummary {
        pages: pages.len(),
        short_path,
        long_path,
        short_written,
        long_written,
        failures,
    })
}

fn header(source_lang: &str, languages: &[String]) -> Vec<String> {
    std::iter::once(source_lang.to_string())
        .chain(languages.iter().filter(|l| *l != source_lang).cloned())
        .collect()
}

fn write_table(
    path: &Path,
    header: &[String],
    texts: &BTreeSet<String>,
    mode: WriteMode,
) -> Result<usize, LocalizeError> {
    let append = mode == WriteMode::Append && path.is_file();
    let existing: HashSet<String> = if append {
        let file = TableFile::read(path)?;
        let column = file.column(&header[0]).unwrap_or(0);
        file.rows
            .iter()
            .map(|row| TableFile::cell(row, column).to_string())
            .filter(|cell| !cell.is_empty())
            .collect()
    } else {
        HashSet::new()
    };
    let rows: Vec<&String> = texts.iter().filter(|t| !existing.contains(*t)).collect();
    if append && rows.is_empty() {
        return Ok(0);
    }

    let handle = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(|e| LocalizeError::table_write(path, e.into()))?;
    let mut writer = csv::Writer::from_writer(handle);
    write_rows(&mut writer, header, !append, &rows)
        .map_err(|e| LocalizeError::table_write(path, e))?;
    Ok(rows.len())
}

fn write_rows<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    header: &[String],
    with_header: bool,
    rows: &[&String],
) -> Result<(), csv::Error> {
    if with_header {
        writer.write_record(header)?;
    }
    for text in rows {
        let mut record = vec![""; header.len().max(1)];
        record[0] = text.as_str();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Cities")).unwrap();
        fs::write(
            dir.path().join("Cities/Paris.html"),
            format!(
                "<title>Paris</title><p>{}</p><a href=\"../Home.html\">Home</a>",
                "A very long sentence about Paris. ".repeat(4)
            ),
        )
        .unwrap();
        dir
    }

    #[test]
    fn splits_short_and_long_texts() {
        let site = site();
        let out = TempDir::new().unwrap();
        let config = LocalizeConfig::default();
        let mut options = ExtractOptions::from_config(&config, out.path());
        options.languages = vec!["fr".to_string(), "de".to_string()];

        let summary = extract_tree(&config, site.path(), true, &options).unwrap();
        assert_eq!(summary.pages, 1);

        let short = fs::read_to_string(&summary.short_path).unwrap();
        assert_eq!(short, "en,fr,de\nCities,,\nHome,,\nParis,,\n");
        let long = fs::read_to_string(&summary.long_path).unwrap();
        assert!(long.starts_with("en,fr,de\nA very long sentence about Paris."));
        assert_eq!(summary.long_written, 1);
    }

    #[test]
    fn existing_output_needs_a_mode() {
        let site = site();
        let out = TempDir::new().unwrap();
        fs::write(out.path().join("translations.csv"), "en,fr\nParis,Paris\n").unwrap();
        let config = LocalizeConfig::default();
        let mut options = ExtractOptions::from_config(&config, out.path());
        options.languages = vec!["fr".to_string()];

        assert!(matches!(
            extract_tree(&config, site.path(), true, &options),
            Err(LocalizeError::OutputExists(_))
        ));

        options.mode = WriteMode::Append;
        let summary = extract_tree(&config, site.path(), true, &options).unwrap();
        assert_eq!(summary.short_written, 2);
        assert_eq!(
            fs::read_to_string(out.path().join("translations.csv")).unwrap(),
            "en,fr\nParis,Paris\nCities,\nHome,\n"
        );
    }
}
