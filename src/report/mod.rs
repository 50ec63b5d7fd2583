// SPDX-License-Identifier: PMPL-1.0-or-later

//! Run summaries and report files

pub mod formatter;
pub mod output;

pub use formatter::ReportFormatter;
pub use output::ReportOutputFormat;
