//! Documentation comments (`/** ... */`).
//!
//! A block is a list of free-text lines and `@tag` lines. Tags that take
//! a type (`@param`, `@return`, `@var`, ...) have their first word
//! checked. Rendering normalizes the leading `*` gutter and tag spacing
//! but keeps free text as written.

use std::fmt;

use crate::token::Position;

/// Tags whose first word must be a type.
const TYPED_TAGS: &[&str] = &[
    "param",
    "return",
    "var",
    "throws",
    "property",
    "property-read",
    "property-write",
    "method",
];

/// Classifies a doc-block error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocErrorKind {
    /// Text is not delimited by `/**` and `*/`.
    NotDocComment,
    /// A typed tag without a type word.
    ExpectedType { found: String },
}

impl fmt::Display for DocErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDocComment => write!(f, "not a doc comment"),
            Self::ExpectedType { found } => write!(f, "expecting type, found {found}"),
        }
    }
}

/// Error produced while parsing a doc block. The position is relative to
/// the block: line 1 is the line holding `/**`, whose first column is the
/// `/` itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", pos.line, pos.column)]
pub struct DocError {
    pub kind: DocErrorKind,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocLine {
    Text(String),
    Tag { name: String, words: Vec<String> },
}

impl fmt::Display for DocLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Tag { name, words } => {
                write!(f, "@{name}")?;
                for word in words {
                    write!(f, " {word}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocBlock {
    pub lines: Vec<DocLine>,
    /// Written on a single line in the source.
    pub inline: bool,
}

impl DocBlock {
    /// Render the block. Every line after the first is prefixed with
    /// `indent`; the result has no trailing newline.
    #[must_use]
    pub fn render(&self, indent: &str) -> String {
        if self.lines.is_empty() {
            return "/** */".to_string();
        }
        if self.inline && self.lines.len() == 1 {
            return format!("/** {} */", self.lines[0]);
        }
        let mut out = String::from("/**");
        for line in &self.lines {
            let text = line.to_string();
            out.push('\n');
            out.push_str(indent);
            out.push_str(" *");
            if !text.is_empty() {
                out.push(' ');
                out.push_str(&text);
            }
        }
        out.push('\n');
        out.push_str(indent);
        out.push_str(" */");
        out
    }
}

/// Parse the text of a doc comment, delimiters included.
///
/// # Errors
///
/// Returns `DocError` if the delimiters are missing or a typed tag has no
/// type.
pub fn parse(text: &str) -> Result<DocBlock, DocError> {
    let body = text
        .strip_prefix("/**")
        .and_then(|rest| rest.strip_suffix("*/"))
        .ok_or(DocError {
            kind: DocErrorKind::NotDocComment,
            pos: Position::new(1, 1),
        })?;

    let raw_lines: Vec<&str> = body.split('\n').collect();
    let last = raw_lines.len() - 1;
    let mut lines = Vec::new();
    for (i, raw) in raw_lines.iter().enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        // "/**" occupies columns 1-3 of the first line.
        let base = if i == 0 { 4 } else { 1 };
        let mut col = base;
        let mut content = raw.trim_start_matches([' ', '\t']);
        col += raw.len() - content.len();
        if i > 0 {
            if let Some(rest) = content.strip_prefix('*') {
                content = rest;
                col += 1;
                if let Some(rest) = content.strip_prefix(' ') {
                    content = rest;
                    col += 1;
                }
            }
        }
        let content = content.trim_end();
        let line = i + 1;

        let Some(tag) = content.strip_prefix('@') else {
            lines.push(DocLine::Text(content.to_string()));
            continue;
        };
        let name_len = tag.find(char::is_whitespace).unwrap_or(tag.len());
        let name = &tag[..name_len];
        let args = &tag[name_len..];
        let words: Vec<String> = args.split_whitespace().map(str::to_string).collect();

        if TYPED_TAGS.contains(&name) && !words.first().is_some_and(|w| is_type(w)) {
            let (found, column) = match words.first() {
                Some(word) => {
                    let leading = args.len() - args.trim_start().len();
                    let offset = 1 + name.chars().count() + args[..leading].chars().count();
                    (word.clone(), col + offset)
                }
                None if i == last => ("*/".to_string(), base + raw.chars().count()),
                None => ("newline".to_string(), base + raw.chars().count()),
            };
            return Err(DocError {
                kind: DocErrorKind::ExpectedType { found },
                pos: Position::new(line, column),
            });
        }
        lines.push(DocLine::Tag {
            name: name.to_string(),
            words,
        });
    }

    while lines.first().is_some_and(is_blank_line) {
        lines.remove(0);
    }
    while lines.last().is_some_and(is_blank_line) {
        lines.pop();
    }

    Ok(DocBlock {
        lines,
        inline: last == 0,
    })
}

fn is_blank_line(line: &DocLine) -> bool {
    matches!(line, DocLine::Text(text) if text.is_empty())
}

fn is_type(word: &str) -> bool {
    word.chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || matches!(c, '_' | '\\' | '?' | '('))
}
