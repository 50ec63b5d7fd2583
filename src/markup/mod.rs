// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTML token walking
//!
//! Pages are handled as a flat token stream rather than a tree, so
//! untouched markup is written back byte for byte.

pub mod entities;
pub mod extract;
pub mod rewriter;
pub mod tokenizer;

pub use extract::{extract, Extraction};
pub use rewriter::{rewrite, Rewrite, Substitutions};
pub use tokenizer::{tokenize, Token, Tokenizer};

/// Containers whose close flushes the accumulated text run
pub const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "td", "th", "blockquote", "article",
    "section", "header", "footer", "aside", "main", "nav", "title",
];

/// Attributes translated on any element
pub const TRANSLATABLE_ATTRIBUTES: &[&str] = &[
    "alt",
    "title",
    "placeholder",
    "aria-label",
    "aria-describedby",
    "aria-placeholder",
    "data-location",
    "data-city",
];

/// Elements whose content is never translated
pub const SKIP_ELEMENTS: &[&str] = &["script", "style"];

const HREF_ELEMENTS: &[&str] = &["a", "area", "link"];
const SRC_ELEMENTS: &[&str] = &[
    "img", "script", "source", "iframe", "audio", "video", "embed", "track",
];

pub fn is_block(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

pub fn is_skipped(name: &str) -> bool {
    SKIP_ELEMENTS.contains(&name)
}

/// Whether attribute `attr` of element `element` is a site reference.
pub fn is_reference(element: &str, attr: &str) -> bool {
    match attr {
        "href" => HREF_ELEMENTS.contains(&element),
        "src" => SRC_ELEMENTS.contains(&element),
        _ => false,
    }
}

/// Whether `tag` is `<meta name="description">`.
pub(crate) fn is_meta_description(tag: &tokenizer::Tag<'_>) -> bool {
    tag.name == "meta"
        && tag
            .value("name")
            .is_some_and(|name| entities::decode(name).trim().eq_ignore_ascii_case("description"))
}

/// Decode page bytes: UTF-8 first, Windows-1252 as a best-effort fallback.
///
/// Returns `None` when the bytes are neither.
pub fn decode_document(bytes: Vec<u8>) -> Option<String> {
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(e) => {
            let bytes = e.into_bytes();
            let (text, _, had_errors) = encoding_rs::WINDOWS_1252.decode(&bytes);
            (!had_errors).then(|| text.into_owned())
        }
    }
}
