// SPDX-License-Identifier: PMPL-1.0-or-later

//! Text normalization for table keys
//!
//! Translation tables and site markup are edited independently and drift
//! apart in whitespace, separator glyphs and capitalisation. Lookups compare
//! a small, ordered family of canonical forms instead of raw strings.
//!
//! All functions here are pure and total.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static FANCY_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[•–—−]").unwrap());
static SPACED_HYPHEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*-\s*").unwrap());
static ANY_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*[•\-–—−]\s*").unwrap());
static BARE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[•\-–—−]").unwrap());

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Unify bullet and dash separators to a spaced hyphen (`" - "`).
///
/// `•`, `–`, `—` and `−` become `-`, every hyphen is re-spaced, and
/// whitespace is collapsed again.
pub fn normalize_separators(text: &str) -> String {
    let hyphens = FANCY_SEPARATOR.replace_all(text, "-");
    let spaced = SPACED_HYPHEN.replace_all(&hyphens, " - ");
    normalize(&spaced)
}

/// Render every separator (with its surrounding whitespace) as `sep`.
pub fn render_separators(text: &str, sep: &str) -> String {
    normalize(&ANY_SEPARATOR.replace_all(text, sep))
}

/// Replace every separator glyph with a plain space.
pub fn separators_as_spaces(text: &str) -> String {
    normalize(&BARE_SEPARATOR.replace_all(text, " "))
}

/// Case fold used for all case-insensitive comparisons.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Keys a table entry is reachable under in the case-insensitive map.
///
/// Order matters: variants are inserted first-wins, so the plain folded key
/// of an entry always beats a separator variant of a later entry.
pub fn folded_variants(key: &str) -> [String; 5] {
    [
        fold(&normalize(key)),
        fold(&normalize_separators(key)),
        fold(&render_separators(key, " • ")),
        fold(&render_separators(key, " - ")),
        fold(&separators_as_spaces(key)),
    ]
}

/// Ordered lookup candidates for a piece of observed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidates {
    /// Looked up in the case-preserving map: exact, normalized, separator-normalized.
    pub exact: Vec<String>,
    /// Looked up in the folded map, in order.
    pub folded: Vec<String>,
}

pub fn candidates(text: &str) -> Candidates {
    let normalized = normalize(text);
    let separated = normalize_separators(&normalized);

    let mut exact = vec![text.to_string()];
    push_distinct(&mut exact, normalized.clone());
    push_distinct(&mut exact, separated);

    let mut folded = Vec::with_capacity(4);
    push_distinct(&mut folded, fold(&normalized));
    push_distinct(&mut folded, fold(&render_separators(&normalized, " • ")));
    push_distinct(&mut folded, fold(&render_separators(&normalized, " - ")));
    push_distinct(&mut folded, fold(&separators_as_spaces(&normalized)));

    Candidates { exact, folded }
}

fn push_distinct(keys: &mut Vec<String>, key: String) {
    if !key.is_empty() && !keys.contains(&key) {
        keys.push(key);
    }
}
