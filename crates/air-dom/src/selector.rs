//! CSS selector subset.
//!
//! Selectors are written as strings in configuration and handed to the
//! browser's `querySelector` unchanged, so the grammar here only has to
//! cover what the in-memory test DOM must match itself:
//!
//! - type (`form`), universal (`*`), id (`#nome`), class (`.botao`)
//! - attribute presence and equality (`[href]`, `[action="#"]`)
//! - the `:checked` pseudo-class
//! - descendant (` `) and child (`>`) combinators
//! - selector lists (`a, b`)
//!
//! Parsing happens once, when configuration is loaded.

use std::fmt;

/// Selector parse error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// Selector (or one of its comma-separated parts) is empty.
    #[error("empty selector in `{0}`")]
    Empty(String),
    /// Unexpected character.
    #[error("unexpected `{found}` at offset {offset} in `{selector}`")]
    Unexpected {
        /// Full selector text.
        selector: String,
        /// Byte offset of the offending character.
        offset: usize,
        /// The offending character.
        found: char,
    },
    /// Attribute selector or quoted value is not closed.
    #[error("unterminated attribute selector in `{0}`")]
    Unterminated(String),
    /// Pseudo-class outside the supported subset.
    #[error("unsupported pseudo-class `:{0}`")]
    UnsupportedPseudo(String),
}

/// A parsed selector list.
#[derive(Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selector").field(&self.source).finish()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// One comma-separated alternative, stored left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Complex {
    /// The first entry's combinator is meaningless and always `Descendant`.
    pub(crate) parts: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<AttrMatch>,
    pub(crate) checked: bool,
    universal: bool,
}

impl Compound {
    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && !self.checked
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttrMatch {
    pub(crate) name: String,
    pub(crate) value: Option<String>,
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty(source.to_owned()));
        }

        let mut alternatives = Vec::new();
        for (start, part) in split_list(source)? {
            alternatives.push(parse_complex(source, start, part)?);
        }

        Ok(Self {
            source: source.to_owned(),
            alternatives,
        })
    }

    /// The selector text, suitable for `querySelector`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[cfg(any(test, feature = "mock"))]
    pub(crate) fn alternatives(&self) -> &[Complex] {
        &self.alternatives
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split on top-level commas, returning each part with its byte offset.
fn split_list(source: &str) -> Result<Vec<(usize, &str)>, SelectorError> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_brackets = false;
    let mut quote: Option<char> = None;

    for (i, c) in source.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if in_brackets => quote = Some(c),
            (None, '[') => in_brackets = true,
            (None, ']') => in_brackets = false,
            (None, ',') if !in_brackets => {
                parts.push((start, &source[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_brackets || quote.is_some() {
        return Err(SelectorError::Unterminated(source.to_owned()));
    }
    parts.push((start, &source[start..]));

    if parts.iter().any(|(_, p)| p.trim().is_empty()) {
        return Err(SelectorError::Empty(source.to_owned()));
    }
    Ok(parts)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_complex(source: &str, base: usize, part: &str) -> Result<Complex, SelectorError> {
    let unexpected = |offset: usize, found: char| SelectorError::Unexpected {
        selector: source.to_owned(),
        offset: base + offset,
        found,
    };

    let chars: Vec<(usize, char)> = part.char_indices().collect();
    let mut parts: Vec<(Combinator, Compound)> = Vec::new();
    let mut current = Compound::default();
    let mut pending = Combinator::Descendant;
    let mut i = 0;

    let read_ident = |i: &mut usize| -> String {
        let mut ident = String::new();
        while let Some(&(_, c)) = chars.get(*i) {
            if !is_ident_char(c) {
                break;
            }
            ident.push(c);
            *i += 1;
        }
        ident
    };

    while let Some(&(offset, c)) = chars.get(i) {
        match c {
            c if c.is_whitespace() || c == '>' => {
                if !current.is_empty() {
                    parts.push((pending, std::mem::take(&mut current)));
                    pending = Combinator::Descendant;
                }
                if c == '>' {
                    if parts.is_empty() {
                        return Err(unexpected(offset, c));
                    }
                    pending = Combinator::Child;
                }
                i += 1;
            }
            '*' => {
                current.universal = true;
                i += 1;
            }
            '#' | '.' | ':' => {
                i += 1;
                let ident = read_ident(&mut i);
                if ident.is_empty() {
                    return Err(unexpected(offset, c));
                }
                match c {
                    '#' => current.id = Some(ident),
                    '.' => current.classes.push(ident),
                    _ if ident == "checked" => current.checked = true,
                    _ => return Err(SelectorError::UnsupportedPseudo(ident)),
                }
            }
            '[' => {
                i += 1;
                current.attrs.push(parse_attr(source, &chars, &mut i)?);
            }
            c if is_ident_char(c) => {
                let ident = read_ident(&mut i);
                current.tag = Some(ident.to_ascii_lowercase());
            }
            c => return Err(unexpected(offset, c)),
        }
    }

    if current.is_empty() {
        // A trailing combinator leaves nothing to match against.
        if pending == Combinator::Child || parts.is_empty() {
            return Err(SelectorError::Empty(source.to_owned()));
        }
    } else {
        parts.push((pending, current));
    }

    Ok(Complex { parts })
}

/// Parse the inside of `[...]`; `i` points just past the `[`.
fn parse_attr(
    source: &str,
    chars: &[(usize, char)],
    i: &mut usize,
) -> Result<AttrMatch, SelectorError> {
    let unterminated = || SelectorError::Unterminated(source.to_owned());

    let mut name = String::new();
    while let Some(&(_, c)) = chars.get(*i) {
        if c == ']' || c == '=' || c.is_whitespace() {
            break;
        }
        name.push(c);
        *i += 1;
    }
    skip_ws(chars, i);
    if name.is_empty() {
        return Err(unterminated());
    }

    match chars.get(*i).map(|&(_, c)| c) {
        Some(']') => {
            *i += 1;
            Ok(AttrMatch {
                name: name.to_ascii_lowercase(),
                value: None,
            })
        }
        Some('=') => {
            *i += 1;
            skip_ws(chars, i);
            let mut value = String::new();
            match chars.get(*i).map(|&(_, c)| c) {
                Some(q @ ('"' | '\'')) => {
                    *i += 1;
                    loop {
                        let &(_, c) = chars.get(*i).ok_or_else(unterminated)?;
                        *i += 1;
                        if c == q {
                            break;
                        }
                        value.push(c);
                    }
                }
                _ => {
                    while let Some(&(_, c)) = chars.get(*i) {
                        if c == ']' || c.is_whitespace() {
                            break;
                        }
                        value.push(c);
                        *i += 1;
                    }
                }
            }
            skip_ws(chars, i);
            match chars.get(*i) {
                Some(&(_, ']')) => {
                    *i += 1;
                    Ok(AttrMatch {
                        name: name.to_ascii_lowercase(),
                        value: Some(value),
                    })
                }
                _ => Err(unterminated()),
            }
        }
        _ => Err(unterminated()),
    }
}

fn skip_ws(chars: &[(usize, char)], i: &mut usize) {
    while chars.get(*i).is_some_and(|&(_, c)| c.is_whitespace()) {
        *i += 1;
    }
}
