// SPDX-License-Identifier: PMPL-1.0-or-later

//! Character references
//!
//! Lookup keys are compared in decoded form (`Fish &amp; Chips` is the key
//! `Fish & Chips`), and substituted values are escaped for the context they
//! are written into. Only the references that occur in hand-written site
//! markup are known; anything else is kept literally.

use std::borrow::Cow;

const NAMED: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", "\u{a0}"),
    ("ndash", "–"),
    ("mdash", "—"),
    ("bull", "•"),
    ("minus", "−"),
    ("hellip", "…"),
    ("laquo", "«"),
    ("raquo", "»"),
    ("lsquo", "‘"),
    ("rsquo", "’"),
    ("ldquo", "“"),
    ("rdquo", "”"),
    ("copy", "©"),
    ("reg", "®"),
    ("eacute", "é"),
    ("egrave", "è"),
    ("agrave", "à"),
    ("ccedil", "ç"),
];

/// Decode character references in `text`.
pub fn decode(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match decode_reference(tail) {
            Some((decoded, consumed)) => {
                out.push_str(&decoded);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode the reference at the start of `tail` (which begins with `&`).
fn decode_reference(tail: &str) -> Option<(String, usize)> {
    let end = tail[1..].find(';')? + 1;
    let body = &tail[1..end];
    if body.is_empty() || body.len() > 10 {
        return None;
    }
    let decoded = if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        char::from_u32(code)?.to_string()
    } else {
        NAMED
            .iter()
            .find(|(name, _)| *name == body)
            .map(|(_, value)| value.to_string())?
    };
    Some((decoded, end + 1))
}

/// Escape text content.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value written between `quote` characters
/// (`None` for an unquoted value, which is re-emitted double-quoted).
pub fn escape_attribute(value: &str, quote: Option<char>) -> String {
    let quote = quote.unwrap_or('"');
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' if quote == '"' => out.push_str("&quot;"),
            '\'' if quote == '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_and_numeric_references() {
        assert_eq!(decode("Fish &amp; Chips"), "Fish & Chips");
        assert_eq!(decode("Paris &ndash; France"), "Paris – France");
        assert_eq!(decode("&#233;t&#xE9;"), "été");
        assert_eq!(decode("a&nbsp;b"), "a\u{a0}b");
    }

    #[test]
    fn unknown_or_broken_references_stay_literal() {
        assert_eq!(decode("AT&T"), "AT&T");
        assert_eq!(decode("&unknown; &"), "&unknown; &");
        assert_eq!(decode("&#xZZ;"), "&#xZZ;");
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(decode("no references"), Cow::Borrowed(_)));
    }

    #[test]
    fn escapes_for_context() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_attribute("say \"hi\" & 'bye'", Some('"')), "say &quot;hi&quot; &amp; 'bye'");
        assert_eq!(escape_attribute("it's", Some('\'')), "it&#39;s");
        assert_eq!(escape_attribute("it's", None), "it's");
    }
}
