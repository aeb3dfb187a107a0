use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace};

use crate::token::{Position, SYMBOLS, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// End of input inside a `/* ... */` comment.
    UnterminatedComment,
    /// End of input inside a quoted string.
    UnterminatedString,
    /// Escape other than `\\` or `\'` in a single-quoted string.
    IllegalEscape(char),
    /// Digit outside the literal's base, e.g. `8` in `0789`.
    InvalidDigit { digit: char, base: &'static str },
    /// `0x` or `0b` prefix without digits.
    MissingDigits { base: &'static str },
    /// `<<<` at end of input.
    MissingHeredocLabel,
    /// `<<<` followed by something that cannot start an identifier.
    InvalidHeredocLabel,
    /// `<<<"LABEL` without the closing quote.
    UnterminatedHeredocLabel,
    /// Text between the heredoc label and the line break.
    HeredocLabelNotAlone,
    /// End of input before the closing heredoc label.
    UnterminatedHeredoc,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedComment => write!(f, "unterminated block comment"),
            Self::UnterminatedString => write!(f, "string not terminated"),
            Self::IllegalEscape(ch) => {
                write!(f, "illegal escape sequence \\{ch} in single-quoted string")
            }
            Self::InvalidDigit { digit, base } => {
                write!(f, "invalid digit '{digit}' in {base} literal")
            }
            Self::MissingDigits { base } => write!(f, "{base} literal has no digits"),
            Self::MissingHeredocLabel => write!(f, "missing opening heredoc identifier"),
            Self::InvalidHeredocLabel => write!(f, "invalid opening heredoc identifier"),
            Self::UnterminatedHeredocLabel => {
                write!(f, "quoted heredoc identifier not terminated")
            }
            Self::HeredocLabelNotAlone => {
                write!(f, "no newline after identifier in heredoc")
            }
            Self::UnterminatedHeredoc => write!(f, "heredoc not terminated"),
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", pos.line, pos.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub pos: Position,
}

/// Tokenize a complete source string. The last token is always `Eof`.
///
/// # Errors
///
/// Returns the first `LexError` encountered; tokens scanned before it
/// are discarded.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let tok = lexer.next_token();
        let done = tok.kind == TokenKind::Eof;
        tokens.push(tok);
        if done {
            break;
        }
    }
    match lexer.take_error() {
        Some(err) => Err(err),
        None => Ok(tokens),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Raw text outside of `<?php`.
    Markup,
    Code,
}

/// Pull-based scanner. Call [`Lexer::next_token`] until it returns `Eof`,
/// then check [`Lexer::error`].
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    last_line_len: usize,
    mode: Mode,
    pending: VecDeque<Token>,
    err: Option<LexError>,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
            last_line_len: 0,
            mode: Mode::Markup,
            pending: VecDeque::new(),
            err: None,
        }
    }

    /// The first scan error, if any. Once set, the lexer only yields `Eof`.
    #[must_use]
    pub const fn error(&self) -> Option<&LexError> {
        self.err.as_ref()
    }

    pub const fn take_error(&mut self) -> Option<LexError> {
        self.err.take()
    }

    /// Current scan position.
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::new(self.line, self.col)
    }

    /// Scan the next token.
    pub fn next_token(&mut self) -> Token {
        if let Some(tok) = self.pending.pop_front() {
            return tok;
        }
        if self.err.is_some() {
            return self.eof();
        }
        let result = match self.mode {
            Mode::Markup => self.scan_markup(),
            Mode::Code => self.scan_code(),
        };
        match result {
            Ok(tok) => {
                trace!(token = %tok, pos = %tok.pos, "scanned");
                tok
            }
            Err(kind) => {
                let err = LexError {
                    kind,
                    pos: self.position(),
                };
                debug!(%err, "scan failed");
                self.err = Some(err);
                self.pending.clear();
                self.eof()
            }
        }
    }

    fn eof(&self) -> Token {
        Token::new(TokenKind::Eof, "", self.position())
    }

    fn rest(&self) -> &'a str {
        let input = self.input;
        &input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.last_line_len = self.col;
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    /// Step back over `ch`, which must be the character just read.
    /// Only one step back across a line break is supported.
    fn unread(&mut self, ch: char) {
        self.pos -= ch.len_utf8();
        if self.col == 1 {
            self.line -= 1;
            self.col = self.last_line_len;
        } else {
            self.col -= 1;
        }
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
    }

    fn text_from(&self, start: usize) -> &'a str {
        let input = self.input;
        &input[start..self.pos]
    }

    fn at_open_tag(&self) -> bool {
        self.rest()
            .strip_prefix("<?php")
            .is_some_and(|after| after.chars().next().is_none_or(is_whitespace))
    }

    fn scan_markup(&mut self) -> Result<Token, LexErrorKind> {
        let pos = self.position();
        let start = self.pos;
        loop {
            if self.at_open_tag() {
                if self.pos > start {
                    break;
                }
                for _ in 0.."<?php".len() {
                    self.advance();
                }
                self.mode = Mode::Code;
                trace!("entering code");
                return Ok(Token::fixed(TokenKind::OpenTag, pos));
            }
            if self.advance().is_none() {
                break;
            }
        }
        if self.pos == start {
            return Ok(self.eof());
        }
        Ok(Token::new(TokenKind::InlineHtml, self.text_from(start), pos))
    }

    fn scan_code(&mut self) -> Result<Token, LexErrorKind> {
        let pos = self.position();
        let start = self.pos;
        let Some(ch) = self.advance() else {
            return Ok(self.eof());
        };
        let tok = match ch {
            c if is_whitespace(c) => {
                self.advance_while(is_whitespace);
                Token::new(TokenKind::Whitespace, self.text_from(start), pos)
            }
            '#' => self.scan_line_comment(start, pos),
            '/' => match self.advance() {
                Some('/') => self.scan_line_comment(start, pos),
                Some('*') => self.scan_block_comment(start, pos)?,
                Some(next) => {
                    self.unread(next);
                    self.scan_symbol(start, pos)
                }
                None => self.scan_symbol(start, pos),
            },
            '$' if self.peek().is_some_and(is_ident_start) => {
                self.advance_while(is_ident_char);
                Token::new(TokenKind::Var, self.text_from(start), pos)
            }
            '\'' => self.scan_single_quoted(start, pos)?,
            '"' => self.scan_double_quoted(start, pos)?,
            '?' if self.peek() == Some('>') => {
                self.advance();
                self.mode = Mode::Markup;
                trace!("leaving code");
                Token::fixed(TokenKind::CloseTag, pos)
            }
            '<' if self.rest().starts_with("<<") => {
                self.advance();
                self.advance();
                self.scan_heredoc(start, pos)?
            }
            '0'..='9' => self.scan_number(ch, start, pos)?,
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_number(ch, start, pos)?
            }
            '.' if self.peek() == Some('.') && self.peek_at(1) != Some('.') => {
                self.advance();
                Token::new(TokenKind::Illegal, "..", pos)
            }
            c if is_ident_start(c) => self.scan_word(start, pos),
            _ => self.scan_symbol(start, pos),
        };
        Ok(tok)
    }

    /// Match the longest symbol starting at `start`; the first character
    /// has already been consumed.
    fn scan_symbol(&mut self, start: usize, pos: Position) -> Token {
        let text = &self.input[start..];
        match SYMBOLS.iter().find(|(sym, _)| text.starts_with(sym)) {
            Some(&(sym, kind)) => {
                for _ in 1..sym.chars().count() {
                    self.advance();
                }
                Token::fixed(kind, pos)
            }
            None => Token::new(TokenKind::Illegal, self.text_from(start), pos),
        }
    }

    fn scan_word(&mut self, start: usize, pos: Position) -> Token {
        self.advance_while(is_ident_char);
        let word = self.text_from(start);
        if word == "elseif" {
            let if_pos = Position::new(self.line, self.col - 2);
            self.pending.push_back(Token::fixed(TokenKind::If, if_pos));
            return Token::fixed(TokenKind::Else, pos);
        }
        match TokenKind::keyword(word) {
            Some(kind) => Token::fixed(kind, pos),
            None => Token::new(TokenKind::Ident, word, pos),
        }
    }

    /// `//` or `#` up to the end of the line. An embedded `?>` ends the
    /// comment and the code section.
    fn scan_line_comment(&mut self, start: usize, pos: Position) -> Token {
        loop {
            match self.peek() {
                None | Some('\n') => break,
                Some('\r') if self.peek_at(1) == Some('\n') => break,
                Some('?') if self.peek_at(1) == Some('>') => {
                    let text = self.text_from(start);
                    let close = self.position();
                    self.advance();
                    self.advance();
                    self.mode = Mode::Markup;
                    self.pending.push_back(Token::fixed(TokenKind::CloseTag, close));
                    return Token::new(TokenKind::LineComment, text, pos);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        Token::new(TokenKind::LineComment, self.text_from(start), pos)
    }

    fn scan_block_comment(&mut self, start: usize, pos: Position) -> Result<Token, LexErrorKind> {
        loop {
            match self.advance() {
                None => return Err(LexErrorKind::UnterminatedComment),
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    break;
                }
                Some(_) => {}
            }
        }
        let text = self.text_from(start);
        let is_doc = text
            .strip_prefix("/**")
            .and_then(|rest| rest.chars().next())
            .is_some_and(is_whitespace);
        let kind = if is_doc {
            TokenKind::DocComment
        } else {
            TokenKind::BlockComment
        };
        Ok(Token::new(kind, text, pos))
    }

    fn scan_single_quoted(&mut self, start: usize, pos: Position) -> Result<Token, LexErrorKind> {
        loop {
            match self.advance() {
                None => return Err(LexErrorKind::UnterminatedString),
                Some('\'') => break,
                Some('\\') => match self.peek() {
                    Some('\\' | '\'') => {
                        self.advance();
                    }
                    Some(ch) => return Err(LexErrorKind::IllegalEscape(ch)),
                    None => return Err(LexErrorKind::UnterminatedString),
                },
                Some(_) => {}
            }
        }
        Ok(Token::new(TokenKind::String, self.text_from(start), pos))
    }

    fn scan_double_quoted(&mut self, start: usize, pos: Position) -> Result<Token, LexErrorKind> {
        loop {
            match self.advance() {
                None => return Err(LexErrorKind::UnterminatedString),
                Some('"') => break,
                Some('\\') => {
                    if self.advance().is_none() {
                        return Err(LexErrorKind::UnterminatedString);
                    }
                }
                Some(_) => {}
            }
        }
        Ok(Token::new(TokenKind::String, self.text_from(start), pos))
    }

    /// Heredoc or nowdoc; `<<<` has been consumed. The token ends with the
    /// closing label, anything after it is scanned as ordinary tokens.
    fn scan_heredoc(&mut self, start: usize, pos: Position) -> Result<Token, LexErrorKind> {
        self.advance_while(is_blank);
        let label = match self.peek() {
            None => return Err(LexErrorKind::MissingHeredocLabel),
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                if !self.peek().is_some_and(is_ident_start) {
                    return Err(LexErrorKind::InvalidHeredocLabel);
                }
                let label = self.scan_ident();
                if self.advance() != Some(quote) {
                    return Err(LexErrorKind::UnterminatedHeredocLabel);
                }
                label
            }
            Some(ch) if is_ident_start(ch) => self.scan_ident(),
            Some(_) => return Err(LexErrorKind::InvalidHeredocLabel),
        };
        self.advance_while(is_blank);
        match (self.peek(), self.peek_at(1)) {
            (Some('\n'), _) => {}
            (Some('\r'), Some('\n')) => {
                self.advance();
            }
            _ => return Err(LexErrorKind::HeredocLabelNotAlone),
        }
        self.advance();

        loop {
            if self.peek().is_none() {
                return Err(LexErrorKind::UnterminatedHeredoc);
            }
            let word = self.scan_ident();
            if word == label && closes_heredoc(self.rest()) {
                break;
            }
            self.advance_while(|c| c != '\n');
            self.advance();
        }
        trace!(label, "heredoc closed");
        Ok(Token::new(TokenKind::String, self.text_from(start), pos))
    }

    fn scan_ident(&mut self) -> &'a str {
        let start = self.pos;
        if self.peek().is_some_and(is_ident_start) {
            self.advance_while(is_ident_char);
        }
        self.text_from(start)
    }

    fn scan_number(&mut self, first: char, start: usize, pos: Position) -> Result<Token, LexErrorKind> {
        if first == '.' {
            self.scan_digits(|c| c.is_ascii_digit());
            self.scan_exponent();
            return Ok(Token::new(TokenKind::Float, self.text_from(start), pos));
        }
        if first == '0' {
            match self.peek() {
                Some('x' | 'X') => {
                    self.advance();
                    return self.scan_prefixed(start, pos, "hexadecimal", |c| c.is_ascii_hexdigit());
                }
                Some('b' | 'B') => {
                    self.advance();
                    return self.scan_prefixed(start, pos, "binary", |c| matches!(c, '0' | '1'));
                }
                Some('o' | 'O') => {
                    self.advance();
                    return self.scan_prefixed(start, pos, "octal", |c| matches!(c, '0'..='7'));
                }
                _ => {}
            }
        }

        self.scan_digits(|c| c.is_ascii_digit());
        let mut float = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.scan_digits(|c| c.is_ascii_digit());
            float = true;
        }
        float |= self.scan_exponent();
        let text = self.text_from(start);
        if float {
            return Ok(Token::new(TokenKind::Float, text, pos));
        }
        if first == '0' {
            if let Some(digit) = text.chars().find(|c| matches!(c, '8' | '9')) {
                return Err(LexErrorKind::InvalidDigit {
                    digit,
                    base: "octal",
                });
            }
        }
        Ok(Token::new(TokenKind::Int, text, pos))
    }

    fn scan_prefixed(
        &mut self,
        start: usize,
        pos: Position,
        base: &'static str,
        valid: fn(char) -> bool,
    ) -> Result<Token, LexErrorKind> {
        if !self.peek().is_some_and(valid) {
            return Err(LexErrorKind::MissingDigits { base });
        }
        self.scan_digits(valid);
        if let Some(digit) = self.peek().filter(char::is_ascii_digit) {
            return Err(LexErrorKind::InvalidDigit { digit, base });
        }
        Ok(Token::new(TokenKind::Int, self.text_from(start), pos))
    }

    /// Digits with `_` separators allowed between them.
    fn scan_digits(&mut self, valid: fn(char) -> bool) {
        loop {
            match self.peek() {
                Some(c) if valid(c) => {
                    self.advance();
                }
                Some('_') if self.peek_at(1).is_some_and(valid) => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn scan_exponent(&mut self) -> bool {
        let digit_at = |offset| self.peek_at(offset).is_some_and(|c: char| c.is_ascii_digit());
        if !matches!(self.peek(), Some('e' | 'E')) {
            return false;
        }
        let skip = match self.peek_at(1) {
            Some('+' | '-') if digit_at(2) => 2,
            _ if digit_at(1) => 1,
            _ => return false,
        };
        for _ in 0..skip {
            self.advance();
        }
        self.scan_digits(|c| c.is_ascii_digit());
        true
    }
}

/// The rest of a line after a heredoc label: an optional `;` or `,`,
/// optional blanks, then a line break or end of input.
fn closes_heredoc(rest: &str) -> bool {
    let rest = rest.strip_prefix([';', ',']).unwrap_or(rest);
    let rest = rest.trim_start_matches(is_blank);
    rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n")
}

const fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t')
}

const fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

const fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic() || !ch.is_ascii()
}

const fn is_ident_char(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}
