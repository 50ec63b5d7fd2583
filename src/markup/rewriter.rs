// SPDX-License-Identifier: PMPL-1.0-or-later

//! Substitution pass over one page
//!
//! Text inside block containers is accumulated across inline markup and
//! looked up as one run when the container closes. Inline tags contribute
//! a single space to the run and are kept in the output. When the whole run
//! resolves, the translation lands in the first fragment (keeping that
//! fragment's surrounding whitespace) and later fragments are emptied.
//! Otherwise each fragment is tried on its own.

use super::tokenizer::{Tag, Token, Tokenizer};
use super::{entities, is_block, is_meta_description, is_reference, is_skipped, TRANSLATABLE_ATTRIBUTES};
use crate::normalize;
use crate::paths::LinkRule;
use crate::table::TranslationTable;
use crate::types::MissingSet;
use std::borrow::Cow;
use std::ops::Range;

/// What a rewrite pass substitutes
#[derive(Debug, Clone, Copy, Default)]
pub struct Substitutions<'a> {
    /// Text runs and translatable attributes
    pub text: Option<&'a TranslationTable>,
    /// Internal `href`/`src` references, relative to the page being rewritten
    pub links: Option<LinkRule<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub html: String,
    pub changed: bool,
    pub missing_text: MissingSet,
    pub missing_segments: MissingSet,
}

/// Rewrite `html`, returning the new document and everything left unresolved.
pub fn rewrite(html: &str, subs: &Substitutions<'_>) -> Rewrite {
    let mut walker = Walker {
        subs,
        out: Vec::new(),
        run: Vec::new(),
        skip_depth: 0,
        missing_text: MissingSet::new(),
        missing_segments: MissingSet::new(),
    };
    for token in Tokenizer::new(html) {
        walker.token(token);
    }
    walker.flush();

    let output: String = walker.out.concat();
    Rewrite {
        changed: output != html,
        html: output,
        missing_text: walker.missing_text,
        missing_segments: walker.missing_segments,
    }
}

struct Walker<'a, 's> {
    subs: &'s Substitutions<'s>,
    out: Vec<Cow<'a, str>>,
    /// Indices into `out` of the pending text fragments
    run: Vec<usize>,
    skip_depth: usize,
    missing_text: MissingSet,
    missing_segments: MissingSet,
}

impl<'a> Walker<'a, '_> {
    fn token(&mut self, token: Token<'a>) {
        match token {
            Token::StartTag(tag) => {
                let raw = self.tag(&tag);
                self.out.push(raw);
                if is_skipped(&tag.name) {
                    self.skip_depth += 1;
                }
            }
            Token::SelfClosingTag(tag) => {
                let raw = self.tag(&tag);
                self.out.push(raw);
            }
            Token::EndTag { name, raw } => {
                if is_skipped(&name) {
                    self.skip_depth = self.skip_depth.saturating_sub(1);
                } else if self.skip_depth == 0 && is_block(&name) {
                    self.flush();
                }
                self.out.push(Cow::Borrowed(raw));
            }
            Token::Text(text) => {
                if self.skip_depth == 0 && self.subs.text.is_some() && !text.trim().is_empty() {
                    self.run.push(self.out.len());
                }
                self.out.push(Cow::Borrowed(text));
            }
            Token::Comment(raw) | Token::Declaration(raw) | Token::ProcessingInstruction(raw) => {
                self.out.push(Cow::Borrowed(raw));
            }
        }
    }

    /// Re-emit a tag, splicing in any substituted attribute values.
    fn tag(&mut self, tag: &Tag<'a>) -> Cow<'a, str> {
        if self.skip_depth > 0 {
            return Cow::Borrowed(tag.raw);
        }
        let meta_description = is_meta_description(tag);
        let mut splices: Vec<(Range<usize>, String)> = Vec::new();

        for attr in &tag.attributes {
            let Some(value) = &attr.value else {
                continue;
            };
            let replacement = if is_reference(&tag.name, &attr.name) {
                self.subs
                    .links
                    .and_then(|links| links.rewrite(value.raw, &mut self.missing_segments))
            } else if TRANSLATABLE_ATTRIBUTES.contains(&attr.name.as_str())
                || (meta_description && attr.name == "content")
            {
                self.translate_attribute(value.raw)
                    .map(|target| entities::escape_attribute(&target, value.quote))
            } else {
                None
            };
            if let Some(replacement) = replacement {
                let replacement = match value.quote {
                    Some(_) => replacement,
                    None => format!("\"{replacement}\""),
                };
                splices.push((value.span.clone(), replacement));
            }
        }

        if splices.is_empty() {
            return Cow::Borrowed(tag.raw);
        }
        let mut rebuilt = String::with_capacity(tag.raw.len());
        let mut cursor = 0;
        for (span, replacement) in splices {
            rebuilt.push_str(&tag.raw[cursor..span.start]);
            rebuilt.push_str(&replacement);
            cursor = span.end;
        }
        rebuilt.push_str(&tag.raw[cursor..]);
        Cow::Owned(rebuilt)
    }

    fn translate_attribute(&mut self, raw: &str) -> Option<String> {
        let table = self.subs.text?;
        let decoded = entities::decode(raw);
        if decoded.trim().is_empty() {
            return None;
        }
        table.translate(&decoded, &mut self.missing_text)
    }

    /// Look up the pending text run and substitute it.
    fn flush(&mut self) {
        let run = std::mem::take(&mut self.run);
        let Some(table) = self.subs.text else {
            return;
        };
        if run.is_empty() {
            return;
        }
        let fragments: Vec<String> = run
            .iter()
            .map(|&i| entities::decode(&self.out[i]).into_owned())
            .collect();
        let joined = normalize::normalize(&fragments.join(" "));

        if let Some(target) = table.lookup(&joined) {
            let first = run[0];
            self.out[first] = Cow::Owned(replace_keeping_whitespace(&self.out[first], target));
            for &i in &run[1..] {
                self.out[i] = Cow::Borrowed("");
            }
            return;
        }
        if run.len() == 1 {
            self.missing_text.insert(joined);
            return;
        }

        let mut unresolved = Vec::new();
        for (&i, fragment) in run.iter().zip(&fragments) {
            match table.lookup(fragment) {
                Some(target) => {
                    self.out[i] = Cow::Owned(replace_keeping_whitespace(&self.out[i], target));
                }
                None => unresolved.push(normalize::normalize(fragment)),
            }
        }
        if unresolved.len() == run.len() {
            self.missing_text.insert(joined);
        } else {
            for fragment in unresolved {
                self.missing_text.insert(fragment);
            }
        }
    }
}

fn replace_keeping_whitespace(raw: &str, target: &str) -> String {
    let leading = &raw[..raw.len() - raw.trim_start().len()];
    let trailing = &raw[raw.trim_end().len()..];
    format!("{leading}{}{trailing}", entities::escape_text(target))
}
