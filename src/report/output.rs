// SPDX-License-Identifier: PMPL-1.0-or-later

//! Serialization helpers for exported reports

use crate::types::RunReport;
use anyhow::Result;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportOutputFormat {
    #[default]
    Json,
    Yaml,
}

impl ReportOutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Some(ReportOutputFormat::Json),
            "yaml" | "yml" => Some(ReportOutputFormat::Yaml),
            _ => None,
        }
    }

    /// Format implied by a file name, if any.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportOutputFormat::Json => "json",
            ReportOutputFormat::Yaml => "yaml",
        }
    }

    pub fn serialize(&self, report: &RunReport) -> Result<String> {
        match self {
            ReportOutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            ReportOutputFormat::Yaml => Ok(serde_yaml::to_string(report)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn parses_names_and_extensions() {
        assert_eq!(ReportOutputFormat::parse("YML"), Some(ReportOutputFormat::Yaml));
        assert_eq!(ReportOutputFormat::parse("toml"), None);
        assert_eq!(
            ReportOutputFormat::from_path(Path::new("run.json")),
            Some(ReportOutputFormat::Json)
        );
    }

    #[test]
    fn json_report_carries_statuses() {
        let mut report = RunReport::new(PathBuf::from("site"), None, true);
        report.missing_text.insert("Good morning");
        let json = ReportOutputFormat::Json.serialize(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["dry_run"], serde_json::json!(true));
        assert_eq!(value["missing_text"][0], "Good morning");
        assert!(value.get("output").is_none());
    }
}
