// SPDX-License-Identifier: PMPL-1.0-or-later

//! Internal link rewriting
//!
//! An internal reference is relative: no scheme, not rooted, not a bare
//! fragment. Its path part is resolved segment by segment against the page's
//! original location. A segment naming an entry the walk saw follows the
//! rename plan: it changes only when that entry was really moved, so
//! collisions and failed moves keep their links. A segment naming something
//! known not to exist (its directory was listed and it was not there) is
//! mapped by the rename rule, the way the entry would have been named. Below
//! a directory that was never listed (a shallow walk) links are left alone.
//! The query and fragment are never touched.

use super::plan::RewritePlan;
use super::segment::{is_page_extension, plan_segment, split_extension, with_extension, SegmentOutcome};
use super::{SegmentRule, TreeEntry};
use crate::markup::entities;
use crate::types::{MissingSet, MoveStatus};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static URI_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").unwrap());

/// Characters re-encoded in a segment that was percent-encoded to begin with
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// What the tree says about a link target
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Renamed(String),
    /// Present and left under its name
    Kept,
    /// Known not to exist
    Absent,
    /// Below a directory that was not listed
    Unknown,
}

/// Outcome of a rename plan as seen by links, keyed by original relative path
#[derive(Debug, Clone)]
pub struct LinkMap<'r> {
    rule: &'r SegmentRule<'r>,
    page_extensions: &'r [String],
    renamed: HashMap<PathBuf, String>,
    present: HashSet<PathBuf>,
    /// Directories whose contents were enumerated; the root always is
    listed: HashSet<PathBuf>,
}

impl<'r> LinkMap<'r> {
    pub fn new(rule: &'r SegmentRule<'r>, page_extensions: &'r [String]) -> Self {
        Self {
            rule,
            page_extensions,
            renamed: HashMap::new(),
            present: HashSet::new(),
            listed: HashSet::from([PathBuf::new()]),
        }
    }

    /// Link map for a run over `entries` that produced `plan`.
    ///
    /// Only planned or applied moves that change a name count as renames.
    /// Collisions and failed moves leave their entry under its old name.
    pub fn from_plan(
        root: &Path,
        plan: &RewritePlan,
        entries: &[TreeEntry],
        recursive: bool,
        rule: &'r SegmentRule<'r>,
        page_extensions: &'r [String],
    ) -> Self {
        let mut map = Self::new(rule, page_extensions);
        for entry in entries {
            map.present.insert(entry.rel.clone());
            if recursive && entry.is_dir() {
                map.listed.insert(entry.rel.clone());
            }
        }
        for planned in &plan.moves {
            if !matches!(planned.status, MoveStatus::Planned | MoveStatus::Applied) {
                continue;
            }
            let (Ok(rel), Some(old), Some(new)) = (
                planned.from.strip_prefix(root),
                planned.from.file_name(),
                planned.to.file_name().and_then(|n| n.to_str()),
            ) else {
                continue;
            };
            if old != new {
                map.insert(rel, new);
            }
        }
        map
    }

    /// Record that the entry at `rel` is renamed to `new_name`.
    pub fn insert(&mut self, rel: impl Into<PathBuf>, new_name: impl Into<String>) {
        let rel = rel.into();
        self.present.insert(rel.clone());
        self.renamed.insert(rel, new_name.into());
    }

    /// Where the entry originally at `rel` lives once every rename is done.
    pub fn final_path(&self, rel: &Path) -> PathBuf {
        let mut original = PathBuf::new();
        let mut current = PathBuf::new();
        for component in rel.components() {
            original.push(component);
            match self.renamed.get(&original) {
                Some(name) => current.push(name),
                None => current.push(component),
            }
        }
        current
    }

    /// Link rule for the page originally at `page`.
    pub fn for_page<'a>(&'a self, page: &'a Path) -> LinkRule<'a> {
        LinkRule { map: self, page }
    }

    /// An extensionless last segment also answers to a page with one of
    /// the page extensions, and stays extensionless when renamed.
    fn target(&self, target: &Path, is_last: bool) -> Target {
        let mut candidates = vec![(target.to_path_buf(), false)];
        if let Some(name) = target.file_name().and_then(|n| n.to_str()) {
            if is_last && split_extension(name).1.is_none() {
                candidates.extend(
                    self.page_extensions
                        .iter()
                        .map(|ext| (target.with_file_name(format!("{name}.{ext}")), true)),
                );
            }
        }
        for (path, page) in candidates {
            if let Some(new) = self.renamed.get(&path) {
                let new = if page { split_extension(new).0 } else { new.as_str() };
                return Target::Renamed(new.to_string());
            }
            if self.present.contains(&path) {
                return Target::Kept;
            }
        }
        if self.is_absent(target) {
            Target::Absent
        } else {
            Target::Unknown
        }
    }

    fn is_absent(&self, rel: &Path) -> bool {
        if self.present.contains(rel) {
            return false;
        }
        match rel.parent() {
            Some(parent) => self.listed.contains(parent) || self.is_absent(parent),
            None => false,
        }
    }

    /// Name for an absent target, as the rule would name such an entry.
    fn rule_name(&self, name: &str, is_dir: bool) -> SegmentOutcome {
        if is_dir {
            return plan_segment(name, self.rule);
        }
        match split_extension(name) {
            (base, Some(ext)) if is_page_extension(ext, self.page_extensions) => {
                with_extension(plan_segment(base, self.rule), ext)
            }
            (_, Some(_)) => SegmentOutcome::Unchanged,
            (base, None) => plan_segment(base, self.rule),
        }
    }
}

/// Link rule handed to the markup rewriter for one page
#[derive(Debug, Clone, Copy)]
pub struct LinkRule<'a> {
    map: &'a LinkMap<'a>,
    page: &'a Path,
}

impl LinkRule<'_> {
    pub fn rewrite(&self, href: &str, missing: &mut MissingSet) -> Option<String> {
        rewrite_href(href, self.page, self.map, missing)
    }
}

/// Whether `href` points inside the site tree.
pub fn is_internal(href: &str) -> bool {
    let href = href.trim();
    !(href.is_empty()
        || href.starts_with('/')
        || href.starts_with('#')
        || URI_SCHEME.is_match(href))
}

/// Path part of `href` and the untouched `?query#fragment` tail.
pub fn split_tail(href: &str) -> (&str, &str) {
    match href.find(['?', '#']) {
        Some(i) => (&href[..i], &href[i..]),
        None => (href, ""),
    }
}

/// Rewrite the raw attribute value `href` found in the page originally at
/// `page` (relative to the run root).
///
/// Returns `None` when the value is external, climbs out of the tree, or
/// nothing in it changes. Absent targets the rule cannot name are recorded
/// in `missing`.
pub fn rewrite_href(href: &str, page: &Path, links: &LinkMap<'_>, missing: &mut MissingSet) -> Option<String> {
    if !is_internal(href) {
        return None;
    }
    let (path, tail) = split_tail(href);
    if path.is_empty() {
        return None;
    }
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len() - 1;
    let mut cursor = page.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut outside = false;
    let mut changed = false;
    let mut out = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        let mapped = match *segment {
            _ if outside => None,
            "" | "." => None,
            ".." => {
                outside = !cursor.pop();
                None
            }
            _ => map_link_segment(segment, &mut cursor, i == last, links, missing),
        };
        match mapped {
            Some(name) => {
                changed = true;
                out.push(Cow::Owned(name));
            }
            None => out.push(Cow::Borrowed(*segment)),
        }
    }

    changed.then(|| format!("{}{}", out.join("/"), tail))
}

/// Step `cursor` into `raw` and return the re-encoded new name if the entry
/// it reaches is named differently after the run.
fn map_link_segment(
    raw: &str,
    cursor: &mut PathBuf,
    is_last: bool,
    links: &LinkMap<'_>,
    missing: &mut MissingSet,
) -> Option<String> {
    let unescaped = entities::decode(raw);
    let decoded = percent_decode_str(&unescaped).decode_utf8_lossy();
    let was_encoded = decoded != unescaped;
    cursor.push(&*decoded);

    let name = match links.target(cursor.as_path(), is_last) {
        Target::Renamed(name) => name,
        Target::Kept | Target::Unknown => return None,
        Target::Absent => match links.rule_name(&decoded, !is_last) {
            SegmentOutcome::Mapped(name) => name,
            SegmentOutcome::Unchanged => return None,
            SegmentOutcome::Missing(gap) | SegmentOutcome::MissingLabel { id: gap } => {
                missing.insert(gap);
                return None;
            }
        },
    };
    let encoded = if was_encoded {
        utf8_percent_encode(&name, SEGMENT_ENCODE_SET).to_string()
    } else {
        name
    };
    // Quotes are encoded so the value is safe inside either quote style.
    let encoded = encoded.replace('"', "%22").replace('\'', "%27");
    Some(entities::escape_attribute(&encoded, Some('"')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{IdentifierRow, IdentifierTable, TranslationTable};
    use crate::types::{EntryKind, PlannedMove};

    fn exts() -> Vec<String> {
        vec!["html".to_string()]
    }

    fn table() -> IdentifierTable {
        IdentifierTable::from_rows(
            "en",
            [
                IdentifierRow::new("Q90".parse().unwrap()).with_label("en", "Paris"),
                IdentifierRow::new("Q64".parse().unwrap()).with_label("en", "Berlin"),
                IdentifierRow::new("Q60".parse().unwrap()).with_label("en", "New York"),
                IdentifierRow::new("Q142".parse().unwrap()).with_label("en", "France"),
            ],
        )
    }

    fn moved(from: &str, to: &str, kind: EntryKind, status: MoveStatus) -> PlannedMove {
        PlannedMove {
            from: Path::new("/site").join(from),
            to: Path::new("/site").join(to),
            kind,
            status,
        }
    }

    /// France/ -> Q142/, France/Paris.html -> Q90.html, Berlin.html ->
    /// Q64.html, "New York.html" -> Q60.html. Paris.html at the root
    /// collided with Q90.html and Rome.html failed to move.
    fn plan() -> RewritePlan {
        RewritePlan {
            moves: vec![
                moved("France/Paris.html", "France/Q90.html", EntryKind::File, MoveStatus::Applied),
                moved("Berlin.html", "Q64.html", EntryKind::File, MoveStatus::Applied),
                moved("New York.html", "Q60.html", EntryKind::File, MoveStatus::Planned),
                moved(
                    "Paris.html",
                    "Q90.html",
                    EntryKind::File,
                    MoveStatus::Collision(PathBuf::from("/site/Q90.html")),
                ),
                moved("Rome.html", "Q220.html", EntryKind::File, MoveStatus::Failed("denied".into())),
                moved("France", "Q142", EntryKind::Directory, MoveStatus::Applied),
            ],
        }
    }

    fn entries() -> Vec<TreeEntry> {
        vec![
            TreeEntry::file("Berlin.html"),
            TreeEntry::directory("France"),
            TreeEntry::file("France/Lyon.html"),
            TreeEntry::file("France/Paris.html"),
            TreeEntry::file("France/Paris.png"),
            TreeEntry::file("New York.html"),
            TreeEntry::file("Paris.html"),
            TreeEntry::file("Q90.html"),
            TreeEntry::file("Rome.html"),
            TreeEntry::file("index.html"),
        ]
    }

    fn rewrite_with(page: &str, href: &str, recursive: bool) -> (Option<String>, MissingSet) {
        let table = table();
        let rule = SegmentRule::LabelToIdentifier(&table);
        let exts = exts();
        let links = LinkMap::from_plan(Path::new("/site"), &plan(), &entries(), recursive, &rule, &exts);
        let mut missing = MissingSet::new();
        let out = rewrite_href(href, Path::new(page), &links, &mut missing);
        (out, missing)
    }

    fn rewrite(page: &str, href: &str) -> Option<String> {
        rewrite_with(page, href, true).0
    }

    #[test]
    fn external_and_rooted_links_are_untouched() {
        for href in [
            "https://example.org/Berlin.html",
            "mailto:someone@example.org",
            "tel:+331234",
            "/Berlin.html",
            "#Berlin",
            "",
        ] {
            assert_eq!(rewrite("index.html", href), None, "{href}");
        }
    }

    #[test]
    fn query_and_fragment_survive_byte_for_byte() {
        assert_eq!(
            rewrite("index.html", "France/Paris.html?x=1&amp;y=Paris#Paris").as_deref(),
            Some("Q142/Q90.html?x=1&amp;y=Paris#Paris")
        );
        assert_eq!(
            rewrite("France/Paris.html", "../Berlin.html#top").as_deref(),
            Some("../Q64.html#top")
        );
    }

    #[test]
    fn entries_left_in_place_keep_their_names() {
        assert_eq!(rewrite("index.html", "France/Paris.png").as_deref(), Some("Q142/Paris.png"));
        assert_eq!(rewrite("index.html", "France/Lyon.html").as_deref(), Some("Q142/Lyon.html"));
        assert_eq!(rewrite("index.html", "./France/").as_deref(), Some("./Q142/"));
        assert_eq!(rewrite("index.html", "Q90.html"), None);
    }

    #[test]
    fn collisions_and_failed_moves_are_not_followed() {
        let (out, missing) = rewrite_with("index.html", "Paris.html", true);
        assert_eq!(out, None);
        assert!(missing.is_empty());
        assert_eq!(rewrite("index.html", "Rome.html"), None);
        assert_eq!(rewrite("index.html", "Paris"), None);
        assert_eq!(rewrite("France/Paris.html", "../Paris.html"), None);
    }

    #[test]
    fn absent_targets_are_named_by_the_rule() {
        let (out, missing) = rewrite_with("index.html", "Germany/Berlin.html", true);
        assert_eq!(out.as_deref(), Some("Germany/Q64.html"));
        assert!(missing.contains("Germany"));

        let (out, missing) = rewrite_with("index.html", "Lyon.html", true);
        assert_eq!(out, None);
        assert!(missing.contains("Lyon"));

        assert_eq!(rewrite("France/Paris.html", "Berlin.html").as_deref(), Some("Q64.html"));
    }

    #[test]
    fn unlisted_directories_are_left_alone() {
        // A shallow walk sees France/ but not what is inside it
        let (out, missing) = rewrite_with("index.html", "France/Berlin.html", false);
        assert_eq!(out.as_deref(), Some("Q142/Berlin.html"));
        assert!(missing.is_empty());
        assert_eq!(
            rewrite_with("index.html", "Germany/Berlin.html", false).0.as_deref(),
            Some("Germany/Q64.html")
        );
    }

    #[test]
    fn links_outside_the_tree_are_untouched() {
        assert_eq!(rewrite("index.html", "../France/Paris.html"), None);
        assert_eq!(rewrite("France/Paris.html", "../../Berlin.html"), None);
    }

    #[test]
    fn extensionless_links_reach_renamed_pages() {
        assert_eq!(rewrite("index.html", "Berlin").as_deref(), Some("Q64"));
        assert_eq!(rewrite("index.html", "France").as_deref(), Some("Q142"));
    }

    #[test]
    fn percent_encoded_segments_are_decoded_and_re_encoded() {
        assert_eq!(rewrite("index.html", "New%20York.html").as_deref(), Some("Q60.html"));

        let translations = TranslationTable::from_entries([("New York", "Nouvelle York")]);
        let rule = SegmentRule::Translate(&translations);
        let exts = exts();
        let mut links = LinkMap::new(&rule, &exts);
        links.insert("New York.html", "Nouvelle York.html");
        let mut missing = MissingSet::new();
        assert_eq!(
            rewrite_href("New%20York.html", Path::new("index.html"), &links, &mut missing).as_deref(),
            Some("Nouvelle%20York.html")
        );
        assert_eq!(
            rewrite_href("New York.html", Path::new("index.html"), &links, &mut missing).as_deref(),
            Some("Nouvelle York.html")
        );
    }

    #[test]
    fn final_path_follows_renamed_parents() {
        let table = table();
        let rule = SegmentRule::LabelToIdentifier(&table);
        let exts = exts();
        let links = LinkMap::from_plan(Path::new("/site"), &plan(), &entries(), true, &rule, &exts);
        assert_eq!(links.final_path(Path::new("France/Paris.html")), PathBuf::from("Q142/Q90.html"));
        assert_eq!(links.final_path(Path::new("France/Lyon.html")), PathBuf::from("Q142/Lyon.html"));
        assert_eq!(links.final_path(Path::new("Paris.html")), PathBuf::from("Paris.html"));
    }
}
