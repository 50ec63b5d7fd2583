// SPDX-License-Identifier: PMPL-1.0-or-later

//! Lossless HTML token stream
//!
//! Every token borrows the exact source slice it was read from, so
//! concatenating `raw` of all tokens reproduces the input byte for byte.
//! Attribute values carry their offsets inside the tag so a rewriter can
//! splice a single value without re-serializing the rest of the tag.
//!
//! The tokenizer assumes reasonably well-formed markup and never fails:
//! anything it cannot classify (a stray `<`, a tag cut off by end of input)
//! is emitted as text.

use std::ops::Range;

/// Elements whose content is raw text up to the matching close tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    StartTag(Tag<'a>),
    EndTag { name: String, raw: &'a str },
    SelfClosingTag(Tag<'a>),
    Text(&'a str),
    Comment(&'a str),
    Declaration(&'a str),
    ProcessingInstruction(&'a str),
}

impl<'a> Token<'a> {
    /// Source slice of this token.
    pub fn raw(&self) -> &'a str {
        match self {
            Token::StartTag(tag) | Token::SelfClosingTag(tag) => tag.raw,
            Token::EndTag { raw, .. } => raw,
            Token::Text(raw)
            | Token::Comment(raw)
            | Token::Declaration(raw)
            | Token::ProcessingInstruction(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Lowercased element name
    pub name: String,
    pub attributes: Vec<Attribute<'a>>,
    pub raw: &'a str,
}

impl<'a> Tag<'a> {
    pub fn attribute(&self, name: &str) -> Option<&Attribute<'a>> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Raw (still escaped) value of attribute `name`.
    pub fn value(&self, name: &str) -> Option<&'a str> {
        self.attribute(name).and_then(|a| a.value.as_ref()).map(|v| v.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Lowercased attribute name
    pub name: String,
    pub value: Option<AttrValue<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrValue<'a> {
    /// Value between the quotes, character references not decoded
    pub raw: &'a str,
    /// Byte range of `raw` within the tag's `raw`
    pub span: Range<usize>,
    pub quote: Option<char>,
}

/// Streaming tokenizer over decoded markup.
pub struct Tokenizer<'a> {
    source: &'a str,
    pos: usize,
    raw_text_end: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            raw_text_end: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn take(&mut self, len: usize) -> &'a str {
        let slice = &self.source[self.pos..self.pos + len];
        self.pos += len;
        slice
    }

    fn raw_text(&mut self, element: &str) -> &'a str {
        let rest = self.rest();
        let needle = format!("</{element}");
        let end = find_ascii_case_insensitive(rest, &needle).unwrap_or(rest.len());
        self.take(end)
    }

    fn text(&mut self) -> &'a str {
        let rest = self.rest();
        // A '<' at position 0 that did not start markup is part of the text.
        let first = rest.chars().next().map_or(0, char::len_utf8);
        let end = rest[first..]
            .find('<')
            .map(|i| i + first)
            .unwrap_or(rest.len());
        self.take(end)
    }

    fn delimited(&mut self, close: &str) -> Option<&'a str> {
        let rest = self.rest();
        let end = rest.find(close)? + close.len();
        Some(self.take(end))
    }

    fn end_tag(&mut self) -> Option<Token<'a>> {
        let rest = self.rest();
        let name_len = name_length(&rest[2..]);
        if name_len == 0 {
            return None;
        }
        let name = rest[2..2 + name_len].to_ascii_lowercase();
        let end = rest.find('>')? + 1;
        let raw = self.take(end);
        Some(Token::EndTag { name, raw })
    }

    fn start_tag(&mut self) -> Option<Token<'a>> {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let name_len = name_length(&rest[1..]);
        if name_len == 0 {
            return None;
        }
        let name = rest[1..1 + name_len].to_ascii_lowercase();
        let mut attributes = Vec::new();
        let mut i = 1 + name_len;

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                return None;
            }
            match bytes[i] {
                b'>' => {
                    let raw = self.take(i + 1);
                    return Some(self.opened(Tag { name, attributes, raw }));
                }
                b'/' if bytes.get(i + 1) == Some(&b'>') => {
                    let raw = self.take(i + 2);
                    return Some(Token::SelfClosingTag(Tag { name, attributes, raw }));
                }
                b'/' => {
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let name_start = i;
            while i < bytes.len()
                && !bytes[i].is_ascii_whitespace()
                && !matches!(bytes[i], b'=' | b'>')
                && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
            {
                i += 1;
            }
            let attr_name = rest[name_start..i].to_ascii_lowercase();

            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if bytes.get(j) != Some(&b'=') {
                attributes.push(Attribute { name: attr_name, value: None });
                continue;
            }
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j >= bytes.len() {
                return None;
            }
            let value = match bytes[j] {
                quote @ (b'"' | b'\'') => {
                    let start = j + 1;
                    let close = rest[start..].find(quote as char)? + start;
                    i = close + 1;
                    AttrValue {
                        raw: &rest[start..close],
                        span: start..close,
                        quote: Some(quote as char),
                    }
                }
                _ => {
                    let start = j;
                    let mut end = j;
                    while end < bytes.len()
                        && !bytes[end].is_ascii_whitespace()
                        && bytes[end] != b'>'
                    {
                        end += 1;
                    }
                    i = end;
                    AttrValue {
                        raw: &rest[start..end],
                        span: start..end,
                        quote: None,
                    }
                }
            };
            attributes.push(Attribute {
                name: attr_name,
                value: Some(value),
            });
        }
    }

    fn opened(&mut self, tag: Tag<'a>) -> Token<'a> {
        if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
            self.raw_text_end = Some(tag.name.clone());
        }
        Token::StartTag(tag)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.pos >= self.source.len() {
            return None;
        }
        if let Some(element) = self.raw_text_end.take() {
            let text = self.raw_text(&element);
            if !text.is_empty() {
                return Some(Token::Text(text));
            }
        }

        let rest = self.rest();
        let token = if rest.starts_with("<!--") {
            self.delimited("-->").map(Token::Comment)
        } else if rest.starts_with("<!") {
            self.delimited(">").map(Token::Declaration)
        } else if rest.starts_with("<?") {
            self.delimited(">").map(Token::ProcessingInstruction)
        } else if rest.starts_with("</") {
            self.end_tag()
        } else if rest.starts_with('<') {
            self.start_tag()
        } else {
            None
        };
        Some(token.unwrap_or_else(|| Token::Text(self.text())))
    }
}

/// Length of a tag name at the start of `s` (letter, then name characters).
fn name_length(s: &str) -> usize {
    let bytes = s.as_bytes();
    if bytes.first().map_or(true, |b| !b.is_ascii_alphabetic()) {
        return 0;
    }
    bytes
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')))
        .unwrap_or(bytes.len())
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Tokenize `source` into a vector.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    Tokenizer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(source: &str) -> String {
        tokenize(source).iter().map(Token::raw).collect()
    }

    #[test]
    fn reproduces_input_exactly() {
        let sources = [
            "<!DOCTYPE html>\n<html lang=en><head><title>Hi</title></head>",
            "<p class='x' data-a=\"1 > 0\">a <b>b</b> c</p><br/><img src=x.png alt>",
            "<!-- comment <p> --><?xml version=\"1.0\"?>text",
            "a < b and <3 and </ >",
            "<p unterminated=\"oops",
            "<script>if (a < b && c > d) { x = '</div>'; }</script><p>after</p>",
        ];
        for source in sources {
            assert_eq!(roundtrip(source), source);
        }
    }

    #[test]
    fn classifies_tokens() {
        let tokens = tokenize("<!DOCTYPE html><!-- c --><?pi?><p>x</p><br />");
        assert!(matches!(tokens[0], Token::Declaration(_)));
        assert!(matches!(tokens[1], Token::Comment(_)));
        assert!(matches!(tokens[2], Token::ProcessingInstruction(_)));
        assert!(matches!(&tokens[3], Token::StartTag(t) if t.name == "p"));
        assert_eq!(tokens[4], Token::Text("x"));
        assert!(matches!(&tokens[5], Token::EndTag { name, .. } if name == "p"));
        assert!(matches!(&tokens[6], Token::SelfClosingTag(t) if t.name == "br"));
    }

    #[test]
    fn attribute_values_and_spans() {
        let tokens = tokenize("<A HREF=\"Paris.html#top\" title='It' alt=bare hidden>");
        let Token::StartTag(tag) = &tokens[0] else {
            panic!("expected start tag");
        };
        assert_eq!(tag.name, "a");
        assert_eq!(tag.value("href"), Some("Paris.html#top"));
        assert_eq!(tag.value("title"), Some("It"));
        assert_eq!(tag.value("alt"), Some("bare"));
        assert!(tag.attribute("hidden").unwrap().value.is_none());

        let href = tag.attribute("href").unwrap().value.as_ref().unwrap();
        assert_eq!(&tag.raw[href.span.clone()], "Paris.html#top");
        assert_eq!(href.quote, Some('"'));
    }

    #[test]
    fn script_content_is_one_text_token() {
        let tokens = tokenize("<SCRIPT>let s = '<p>';</SCRIPT>");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1], Token::Text("let s = '<p>';"));
        assert!(matches!(&tokens[2], Token::EndTag { name, .. } if name == "script"));
    }
}
