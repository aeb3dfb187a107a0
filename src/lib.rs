//! PHP lexer, parser, and formatter.
//!
//! The parser models the parts of a PHP file whose layout the formatter
//! controls: file headers, declarations, class members, and control
//! statements. Everything else is kept as raw tokens and written back
//! unchanged, so formatting never alters what it does not understand.
//!
//! # Quick start
//!
//! ## Format a source string
//!
//! ```
//! let input = "<?php\nif($x){echo 1;}";
//! let output = phpfmt_rs::format_str(input).unwrap();
//! assert_eq!(output, "<?php\n\nif ($x) {\n\techo 1;\n}\n");
//! ```
//!
//! ## Parse, inspect, and print
//!
//! ```
//! use phpfmt_rs::{Stmt, format, parse};
//!
//! let file = parse("<?php\nnamespace App;\nfunction f() {}\n").unwrap();
//! assert_eq!(file.namespace.as_ref().unwrap().parts, ["App"]);
//! assert!(matches!(file.stmts[0], Stmt::Decl(_)));
//!
//! let output = format(&file).unwrap();
//! assert!(output.contains("function f()\n{\n}"));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod align;
pub mod ast;
pub mod docblock;
pub mod formatter;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod trimmer;

use std::io::{self, Read};

pub use ast::{Decl, DeclKind, Elem, Expr, File, Member, Stmt, UnknownExpr};
pub use docblock::{DocBlock, DocError, DocErrorKind};
pub use formatter::{PrintError, format, fprint};
pub use lexer::{LexError, LexErrorKind, Lexer, tokenize};
pub use parser::{ParseError, ParseErrorKind, parse};
pub use token::{Position, Token, TokenKind};

/// Unified error type covering scanning, parsing, printing, and I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A lexer error from [`tokenize`].
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A parser error, including scan errors met while parsing.
    #[error("{0}")]
    Parse(#[from] ParseError),
    /// A printer error.
    #[error("{0}")]
    Print(#[from] PrintError),
    #[error("{0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Source position of the error, if it has one.
    #[must_use]
    pub const fn position(&self) -> Option<Position> {
        match self {
            Self::Lex(err) => Some(err.pos),
            Self::Parse(err) => Some(err.pos),
            Self::Print(_) | Self::Io(_) => None,
        }
    }

    /// The error message without its position.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Lex(err) => err.kind.to_string(),
            Self::Parse(err) => err.kind.to_string(),
            Self::Print(err) => err.to_string(),
            Self::Io(err) => err.to_string(),
        }
    }
}

/// Parse and format a source string in one step.
pub fn format_str(input: &str) -> Result<String, Error> {
    let file = parse(input)?;
    Ok(format(&file)?)
}

/// Read all of `reader` and format it.
pub fn format_reader<R: Read>(mut reader: R) -> Result<String, Error> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    format_str(&input)
}
