// SPDX-License-Identifier: PMPL-1.0-or-later

//! site-localize: translate and rename static HTML sites
//!
//! Substitutes translated strings into pages without reformatting them, and
//! keeps file names, directory names and internal links consistent with the
//! chosen language or with language-neutral concept identifiers.

use anyhow::{bail, Result};
use clap::{ArgGroup, Parser, Subcommand};
use site_localize::check::check_labels;
use site_localize::lang::{self, IDENTIFIER_PSEUDO_LANG};
use site_localize::localize::{extract_tree, ExtractOptions, WriteMode};
use site_localize::report::{ReportFormatter, ReportOutputFormat};
use site_localize::table::{IdentifierTable, TranslationTable};
use site_localize::{Destination, Job, LocalizeConfig, Localizer, RunReport, SegmentRule};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "site-localize")]
#[command(version)]
#[command(about = "Translate static HTML sites and keep paths and links in sync")]
#[command(long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate page text and attributes, optionally renaming into a copy
    Translate {
        /// Site directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Target language code
        #[arg(short, long)]
        lang: String,

        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Directory holding translations*.csv
        #[arg(long, value_name = "DIR")]
        translations_dir: Option<PathBuf>,

        /// Write the translated site here instead of in place
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        /// Also translate file and directory names and internal links
        #[arg(long, requires = "output")]
        rename: bool,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Save the run report to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Report file format (defaults to the report file's extension)
        #[arg(long, value_enum)]
        format: Option<ReportOutputFormat>,
    },

    /// Rename pages and directories between labels and concept identifiers
    #[command(group(ArgGroup::new("destination").required(true).args(["output", "in_place"])))]
    Rename {
        /// Site directory
        #[arg(long, value_name = "DIR")]
        dir: PathBuf,

        /// Label language, or "wikidata" to rename labels to identifiers
        #[arg(short, long)]
        lang: String,

        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Report what would change without renaming
        #[arg(long)]
        dry_run: bool,

        /// Identifier tables (earlier files take precedence)
        #[arg(long = "labels", value_name = "FILE")]
        labels: Vec<PathBuf>,

        /// Write the renamed site here
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        /// Rename inside the source tree
        #[arg(long)]
        in_place: bool,

        /// Save the run report to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Report file format (defaults to the report file's extension)
        #[arg(long, value_enum)]
        format: Option<ReportOutputFormat>,
    },

    /// Collect translatable text into translations.csv / long_translations.csv
    Extract {
        /// Site directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Texts with at least this many characters go to the long table
        #[arg(long)]
        threshold: Option<usize>,

        /// Directory for the generated tables
        #[arg(short, long, value_name = "OUTDIR", default_value = ".")]
        output: PathBuf,

        /// Add entries missing from existing tables
        #[arg(long, conflicts_with = "overwrite")]
        append: bool,

        /// Replace existing tables
        #[arg(long)]
        overwrite: bool,

        /// Language columns to create
        #[arg(long, value_delimiter = ',')]
        languages: Option<Vec<String>>,

        /// Skip internal link components
        #[arg(long)]
        skip_urls: bool,

        /// Skip directory names and page names
        #[arg(long)]
        skip_filesystem: bool,
    },

    /// Check that every page has a non-empty label in an identifier table
    Check {
        /// Site directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Label language column
        #[arg(value_name = "LANG")]
        lang: String,

        /// Identifier table to check against
        #[arg(value_name = "LABELS")]
        labels: PathBuf,

        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = LocalizeConfig::load(cli.config.as_deref())?;
    let formatter = ReportFormatter::new();

    match cli.command {
        Commands::Translate {
            dir,
            lang,
            recursive,
            translations_dir,
            output,
            rename,
            dry_run,
            report,
            format,
        } => {
            if !lang::is_language_column(&lang) {
                bail!("'{lang}' is not a language code");
            }
            let translations_dir = translations_dir.unwrap_or_else(|| config.translations_dir.clone());
            let table = TranslationTable::load_for_language(&translations_dir, &config.source_lang, &lang)?;

            let mut job = Job::new(&dir)
                .recursive(recursive)
                .dry_run(dry_run)
                .translate_content(&table);
            if rename {
                job = job.rename(SegmentRule::Translate(&table));
            }
            if let Some(out) = output {
                job = job.destination(Destination::Copy(out));
            }

            let result = Localizer::new(config).run(&job)?;
            formatter.print(&result);
            save(&formatter, &result, report, format)?;
        }

        Commands::Rename {
            dir,
            lang,
            recursive,
            dry_run,
            labels,
            output,
            in_place,
            report,
            format,
        } => {
            let tables = if labels.is_empty() {
                config.identifier_tables.clone()
            } else {
                labels
            };
            let table = IdentifierTable::load_all(&tables, &config.source_lang)?;
            let rule = if lang == IDENTIFIER_PSEUDO_LANG {
                SegmentRule::LabelToIdentifier(&table)
            } else if lang::is_language_column(&lang) {
                SegmentRule::IdentifierToLabel {
                    table: &table,
                    lang: lang.clone(),
                }
            } else {
                bail!("'{lang}' is neither a language code nor '{IDENTIFIER_PSEUDO_LANG}'");
            };
            let destination = match output {
                Some(out) if !in_place => Destination::Copy(out),
                _ => Destination::InPlace,
            };

            let job = Job::new(&dir)
                .recursive(recursive)
                .dry_run(dry_run)
                .rename(rule)
                .destination(destination);
            let result = Localizer::new(config).run(&job)?;
            formatter.print(&result);
            save(&formatter, &result, report, format)?;
        }

        Commands::Extract {
            dir,
            recursive,
            threshold,
            output,
            append,
            overwrite,
            languages,
            skip_urls,
            skip_filesystem,
        } => {
            let mut options = ExtractOptions::from_config(&config, output);
            if let Some(threshold) = threshold {
                options.threshold = threshold;
            }
            if let Some(languages) = languages {
                options.languages = languages;
            }
            options.mode = match (append, overwrite) {
                (true, _) => WriteMode::Append,
                (_, true) => WriteMode::Overwrite,
                _ => WriteMode::Create,
            };
            options.skip_urls = skip_urls;
            options.skip_filesystem = skip_filesystem;

            let summary = extract_tree(&config, &dir, recursive, &options)?;
            formatter.print_extract(&summary);
        }

        Commands::Check {
            dir,
            lang,
            labels,
            recursive,
        } => {
            let result = check_labels(&config, &dir, &lang, &labels, recursive)?;
            formatter.print_check(&result, &lang);
            if !result.is_clean() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn save(
    formatter: &ReportFormatter,
    report: &RunReport,
    path: Option<PathBuf>,
    format: Option<ReportOutputFormat>,
) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let format = format
        .or_else(|| ReportOutputFormat::from_path(&path))
        .unwrap_or_default();
    formatter.save(report, &path, format)
}
