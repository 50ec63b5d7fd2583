// SPDX-License-Identifier: PMPL-1.0-or-later

//! Terminal summaries

use super::output::ReportOutputFormat;
use crate::check::CheckReport;
use crate::localize::ExtractSummary;
use crate::types::*;
use anyhow::Result;
use colored::*;
use std::fs;
use std::path::Path;

/// Entries listed per section before the rest are summarized as a count
const LIST_LIMIT: usize = 20;

pub struct ReportFormatter;

impl ReportFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn print(&self, report: &RunReport) {
        let title = if report.dry_run {
            "=== SITE-LOCALIZE RUN (DRY RUN) ==="
        } else {
            "=== SITE-LOCALIZE RUN ==="
        };
        println!("\n{}", title.bold().cyan());
        println!("  Root: {}", report.root.display());
        if let Some(output) = &report.output {
            println!("  Output: {}", output.display());
        }
        if let Some(mode) = &report.rename_mode {
            println!("  Rename mode: {}", describe_mode(mode));
        }
        println!();

        self.print_statistics(&report.statistics, report.dry_run);
        self.print_moves(report);
        self.print_missing("MISSING TRANSLATIONS", &report.missing_text);
        self.print_missing("UNRESOLVED PATH SEGMENTS", &report.missing_segments);

        if !report.queued_concepts.is_empty() {
            println!(
                "{} {}",
                "Queued for resolution:".bold(),
                report.queued_concepts.len().to_string().yellow()
            );
        }
        if !report.failures.is_empty() {
            println!("{}", "FAILURES".bold().red());
            for failure in &report.failures {
                println!("  {}: {}", failure.path.display(), failure.error.red());
            }
        }
    }

    fn print_statistics(&self, stats: &RunStatistics, dry_run: bool) {
        let verb = if dry_run { "would change" } else { "changed" };
        println!("{}", "SUMMARY".bold().yellow());
        println!("  Pages processed: {}", stats.pages_processed);
        println!("  Pages {}: {}", verb, stats.pages_changed.to_string().green());
        if stats.files_copied > 0 {
            println!("  Files copied: {}", stats.files_copied);
        }
        println!("  Files renamed: {}", stats.files_renamed);
        println!("  Directories renamed: {}", stats.directories_renamed);
        let collisions = stats.collisions.to_string();
        println!(
            "  Collisions: {}",
            if stats.collisions > 0 {
                collisions.red()
            } else {
                collisions.normal()
            }
        );
        if stats.failures > 0 {
            println!("  Failures: {}", stats.failures.to_string().red());
        }
        println!();
    }

    fn print_moves(&self, report: &RunReport) {
        if report.moves.is_empty() {
            return;
        }
        println!("{}", "RENAMES".bold().yellow());
        for planned in report.moves.iter().take(LIST_LIMIT) {
            let status = match &planned.status {
                MoveStatus::Planned => "planned".blue(),
                MoveStatus::Applied => "done".green(),
                MoveStatus::Collision(_) => "collision".red(),
                MoveStatus::Failed(_) => "failed".red(),
            };
            println!(
                "  [{}] {} -> {}",
                status,
                planned.from.display(),
                planned.to.display().to_string().dimmed()
            );
        }
        if report.moves.len() > LIST_LIMIT {
            println!("  ... and {} more", report.moves.len() - LIST_LIMIT);
        }
        println!();
    }

    fn print_missing(&self, heading: &str, missing: &MissingSet) {
        if missing.is_empty() {
            return;
        }
        println!("{} ({})", heading.bold().yellow(), missing.len());
        for text in missing.iter().take(LIST_LIMIT) {
            println!("  - {}", text);
        }
        if missing.len() > LIST_LIMIT {
            println!("  ... and {} more", missing.len() - LIST_LIMIT);
        }
        println!();
    }

    pub fn print_extract(&self, summary: &ExtractSummary) {
        println!("\n{}", "=== SITE-LOCALIZE EXTRACT ===".bold().cyan());
        println!("  Pages scanned: {}", summary.pages);
        println!(
            "  {}: {} entr{}",
            summary.short_path.display(),
            summary.short_written.to_string().green(),
            if summary.short_written == 1 { "y" } else { "ies" }
        );
        println!(
            "  {}: {} entr{}",
            summary.long_path.display(),
            summary.long_written.to_string().green(),
            if summary.long_written == 1 { "y" } else { "ies" }
        );
        for failure in &summary.failures {
            println!("  {}: {}", failure.path.display(), failure.error.red());
        }
    }

    pub fn print_check(&self, report: &CheckReport, lang: &str) {
        if report.is_clean() {
            println!(
                "{}",
                format!("All pages have labels and no '{lang}' label is empty.").green()
            );
            return;
        }
        if !report.missing_files.is_empty() {
            println!("{}", "Pages with no matching label:".bold().red());
            for name in &report.missing_files {
                println!("  {}", name);
            }
        }
        if !report.empty_rows.is_empty() {
            println!(
                "{}",
                format!("Empty '{lang}' labels (row numbers):").bold().red()
            );
            for row in &report.empty_rows {
                println!("  {}", row);
            }
        }
    }

    pub fn save<P: AsRef<Path>>(
        &self,
        report: &RunReport,
        path: P,
        format: ReportOutputFormat,
    ) -> Result<()> {
        let text = format.serialize(report)?;
        fs::write(path.as_ref(), text)?;
        println!("Report saved to: {}", path.as_ref().display());
        Ok(())
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn describe_mode(mode: &RenameMode) -> String {
    match mode {
        RenameMode::Translate => "translation table".to_string(),
        RenameMode::LabelToIdentifier => "label -> identifier".to_string(),
        RenameMode::IdentifierToLabel(lang) => format!("identifier -> label ({lang})"),
    }
}
