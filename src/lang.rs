// SPDX-License-Identifier: PMPL-1.0-or-later

//! Language codes for table columns
//!
//! Table columns are keyed by two-letter ISO 639-1 style codes (`en`, `fr`,
//! `ml`, ...), optionally with a region or script subtag (`pt-BR`). Only the
//! shape is checked; whether a column exists is up to the table itself. The
//! pseudo-language `wikidata` selects label -> identifier renaming on the
//! command line.

use regex::Regex;
use std::sync::LazyLock;

/// Pseudo-language that asks for concept identifiers instead of labels.
pub const IDENTIFIER_PSEUDO_LANG: &str = "wikidata";

static LANGUAGE_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}(-[A-Za-z0-9]{2,4})?$").unwrap());

/// Whether `code` is shaped like a column key: two lowercase letters,
/// optionally followed by `-` and a 2-4 character alphanumeric subtag.
///
/// # Examples
/// ```
/// assert!(site_localize::lang::is_language_column("ml"));
/// assert!(site_localize::lang::is_language_column("pt-BR"));
/// assert!(!site_localize::lang::is_language_column("wikidata"));
/// ```
pub fn is_language_column(code: &str) -> bool {
    LANGUAGE_COLUMN.is_match(code)
}
