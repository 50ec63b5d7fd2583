// SPDX-License-Identifier: PMPL-1.0-or-later

//! Collection of translatable strings from one page
//!
//! Uses the same tokenizer, block accumulation and attribute set as the
//! rewriter, so everything extracted here is a key the rewriter will look up.

use super::tokenizer::{Token, Tokenizer};
use super::{entities, is_block, is_meta_description, is_skipped, TRANSLATABLE_ATTRIBUTES};
use crate::normalize;
use crate::paths::href::{is_internal, split_tail};
use crate::paths::split_extension;
use percent_encoding::percent_decode_str;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Normalized text runs and attribute values
    pub texts: BTreeSet<String>,
    /// Segment basenames of internal links
    pub url_components: BTreeSet<String>,
}

impl Extraction {
    pub fn merge(&mut self, other: Extraction) {
        self.texts.extend(other.texts);
        self.url_components.extend(other.url_components);
    }
}

pub fn extract(html: &str) -> Extraction {
    let mut extraction = Extraction::default();
    let mut run: Vec<String> = Vec::new();
    let mut skip_depth = 0usize;

    for token in Tokenizer::new(html) {
        match token {
            Token::StartTag(tag) | Token::SelfClosingTag(tag) if skip_depth == 0 => {
                let meta_description = is_meta_description(&tag);
                for attr in &tag.attributes {
                    let Some(value) = &attr.value else {
                        continue;
                    };
                    if TRANSLATABLE_ATTRIBUTES.contains(&attr.name.as_str())
                        || (meta_description && attr.name == "content")
                    {
                        add_text(&mut extraction.texts, &entities::decode(value.raw));
                    } else if tag.name == "a" && attr.name == "href" {
                        url_components(value.raw, &mut extraction.url_components);
                    }
                }
                if is_skipped(&tag.name) && !tag.raw.ends_with("/>") {
                    skip_depth += 1;
                }
            }
            Token::StartTag(tag) if is_skipped(&tag.name) => skip_depth += 1,
            Token::EndTag { name, .. } => {
                if is_skipped(&name) {
                    skip_depth = skip_depth.saturating_sub(1);
                } else if skip_depth == 0 && is_block(&name) {
                    flush(&mut run, &mut extraction.texts);
                }
            }
            Token::Text(text) if skip_depth == 0 && !text.trim().is_empty() => {
                run.push(entities::decode(text).into_owned());
            }
            _ => {}
        }
    }
    flush(&mut run, &mut extraction.texts);
    extraction
}

fn flush(run: &mut Vec<String>, texts: &mut BTreeSet<String>) {
    if !run.is_empty() {
        add_text(texts, &run.join(" "));
        run.clear();
    }
}

fn add_text(texts: &mut BTreeSet<String>, text: &str) {
    let cleaned = normalize::normalize(text);
    if !cleaned.is_empty() {
        texts.insert(cleaned);
    }
}

fn url_components(href: &str, components: &mut BTreeSet<String>) {
    if !is_internal(href) {
        return;
    }
    let (path, _) = split_tail(href);
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            continue;
        }
        let unescaped = entities::decode(segment);
        let decoded = percent_decode_str(&unescaped).decode_utf8_lossy();
        let (base, _) = split_extension(&decoded);
        let base = base.trim();
        if !base.is_empty() {
            components.insert(base.to_string());
        }
    }
}
