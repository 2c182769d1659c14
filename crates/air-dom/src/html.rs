//! Lenient HTML tokenizer behind [`crate::MemoryDom`].
//!
//! Test fixtures are hand-written markup, so the tokenizer aims at
//! well-formed-enough input rather than the full HTML5 parsing algorithm:
//! tags, attributes (quoted, unquoted, boolean), comments, doctype, and raw
//! text inside `script`, `style`, `title` and `textarea`. Live pages are
//! parsed by the browser.

use std::sync::LazyLock;

use regex::Regex;


static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("invalid attribute regex")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("invalid entity regex")
});

/// Elements that never have children or an end tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is not parsed as markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "title", "textarea"];

/// A single tokenizer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    /// Decoded text.
    Text(String),
    Comment(String),
}

/// Split markup into tokens.
pub(crate) fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    while let Some(offset) = input[pos..].find('<') {
        let lt = pos + offset;
        let rest = &input[lt..];

        let Some((token, consumed)) = read_markup(rest) else {
            // A stray `<` is text.
            pos = lt + 1;
            continue;
        };

        if lt > text_start {
            tokens.push(Token::Text(decode_entities(&input[text_start..lt])));
        }
        pos = lt + consumed;
        text_start = pos;

        let raw_text_tag = match &token {
            Token::StartTag {
                name,
                self_closing: false,
                ..
            } if RAW_TEXT_ELEMENTS.contains(&name.as_str()) => Some(name.clone()),
            _ => None,
        };
        tokens.push(token);

        if let Some(name) = raw_text_tag {
            let end = find_end_tag(&input[pos..], &name).map_or(input.len(), |i| pos + i);
            if end > pos {
                let raw = &input[pos..end];
                let text = if name == "script" || name == "style" {
                    raw.to_owned()
                } else {
                    decode_entities(raw)
                };
                tokens.push(Token::Text(text));
            }
            pos = end;
            text_start = end;
        }
    }

    if text_start < input.len() {
        tokens.push(Token::Text(decode_entities(&input[text_start..])));
    }
    tokens
}

/// Read one markup construct at the start of `rest` (which begins with `<`).
fn read_markup(rest: &str) -> Option<(Token, usize)> {
    if let Some(body) = rest.strip_prefix("<!--") {
        return Some(match body.find("-->") {
            Some(i) => (Token::Comment(body[..i].to_owned()), 4 + i + 3),
            None => (Token::Comment(body.to_owned()), rest.len()),
        });
    }
    if rest.starts_with("<!") || rest.starts_with("<?") {
        return Some(match rest.find('>') {
            Some(i) => (Token::Comment(rest[2..i].to_owned()), i + 1),
            None => (Token::Comment(rest[2..].to_owned()), rest.len()),
        });
    }

    let close = rest.find('>')?;
    let inner = &rest[1..close];

    if let Some(name) = inner.strip_prefix('/') {
        let name = name.trim();
        if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }
        return Some((
            Token::EndTag {
                name: name.to_ascii_lowercase(),
            },
            close + 1,
        ));
    }

    if !inner.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    // Attribute values may contain `>`, so re-scan respecting quotes.
    let close = find_tag_close(rest)?;
    let inner = &rest[1..close];
    let name_end = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();
    let mut attr_src = &inner[name_end..];
    let self_closing = attr_src.trim_end().ends_with('/');
    if self_closing {
        attr_src = attr_src.trim_end().trim_end_matches('/');
    }

    let attrs = ATTRIBUTE
        .captures_iter(attr_src)
        .map(|caps| {
            let key = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            (key, value)
        })
        .collect();

    Some((
        Token::StartTag {
            name,
            attrs,
            self_closing,
        },
        close + 1,
    ))
}

/// Find the `>` closing a start tag, skipping quoted attribute values.
fn find_tag_close(rest: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in rest.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Case-insensitive search for `</name`.
fn find_end_tag(haystack: &str, name: &str) -> Option<usize> {
    let needle = format!("</{name}");
    let lower = haystack.to_ascii_lowercase();
    lower.find(&needle)
}

/// Decode the character references used in hand-written pages.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    ENTITY
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = if let Some(num) = entity.strip_prefix('#') {
                let code = match num.strip_prefix(['x', 'X']) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => num.parse().ok(),
                };
                code.and_then(char::from_u32).map(String::from)
            } else {
                named_entity(entity).map(String::from)
            };
            decoded.unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "copy" => "©",
        "ndash" => "–",
        "mdash" => "—",
        "hellip" => "…",
        "laquo" => "«",
        "raquo" => "»",
        _ => return None,
    })
}

/// Escape text for insertion as element content.
pub(crate) fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape text for a double-quoted attribute value.
pub(crate) fn escape_attr(text: &str) -> String {
    text.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize(r#"<p class="x">Hi &amp; bye</p>"#);
        assert_eq!(
            tokens,
            vec![
                Token::StartTag {
                    name: "p".to_owned(),
                    attrs: vec![("class".to_owned(), "x".to_owned())],
                    self_closing: false,
                },
                Token::Text("Hi & bye".to_owned()),
                Token::EndTag {
                    name: "p".to_owned()
                },
            ]
        );
    }

    #[test]
    fn test_tokenize_attribute_forms() {
        let tokens = tokenize(r#"<input type=checkbox checked value='a b' data-x="1>2">"#);
        let Token::StartTag { attrs, .. } = &tokens[0] else {
            panic!("expected start tag");
        };
        assert_eq!(
            attrs,
            &vec![
                ("type".to_owned(), "checkbox".to_owned()),
                ("checked".to_owned(), String::new()),
                ("value".to_owned(), "a b".to_owned()),
                ("data-x".to_owned(), "1>2".to_owned()),
            ]
        );
    }

    #[test]
    fn test_tokenize_self_closing_and_comments() {
        let tokens = tokenize("<!DOCTYPE html><!-- note --><br/>");
        assert_eq!(tokens[0], Token::Comment("DOCTYPE html".to_owned()));
        assert_eq!(tokens[1], Token::Comment(" note ".to_owned()));
        assert!(matches!(
            &tokens[2],
            Token::StartTag { name, self_closing: true, .. } if name == "br"
        ));
    }

    #[test]
    fn test_tokenize_raw_text() {
        let tokens = tokenize("<script>if (a < b) { x('</p>') }</script><p>");
        assert_eq!(tokens[1], Token::Text("if (a < b) { x('</p>') }".to_owned()));
        let tokens = tokenize("<script>a < b</script>");
        assert_eq!(tokens[1], Token::Text("a < b".to_owned()));
        assert_eq!(
            tokens[2],
            Token::EndTag {
                name: "script".to_owned()
            }
        );
    }

    #[test]
    fn test_stray_less_than_is_text() {
        let tokens = tokenize("1 < 2");
        assert_eq!(tokens, vec![Token::Text("1 < 2".to_owned())]);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("&lt;b&gt; &#65;&#x42; &unknown;"), "<b> AB &unknown;");
    }
}
