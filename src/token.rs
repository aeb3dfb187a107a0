use std::fmt;

/// Source location for error reporting, 1-based.
///
/// Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Token kinds produced by the lexer.
///
/// Symbols and keywords carry their canonical spelling, see
/// [`TokenKind::spelling`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,

    Whitespace,
    /// `// ...` or `# ...`.
    LineComment,
    /// `/* ... */`.
    BlockComment,
    /// `/** ... */`.
    DocComment,

    Ident,
    Int,
    Float,
    /// Single-quoted, double-quoted, heredoc or nowdoc string.
    String,
    /// `$name`.
    Var,
    /// Text outside of `<?php ... ?>`.
    InlineHtml,

    OpenTag,
    CloseTag,
    Dollar,
    Backslash,
    Qmark,
    Lparen,
    Rparen,
    Lbrack,
    Rbrack,
    Lbrace,
    Rbrace,
    Add,
    Sub,
    Mul,
    Pow,
    Quo,
    Rem,
    Assign,
    Lt,
    Gt,
    Leq,
    Geq,
    Spaceship,
    Eql,
    NotEql,
    Identical,
    NotIdentical,
    Period,
    Comma,
    Colon,
    DoubleColon,
    Semicolon,
    Ellipsis,
    Or,
    And,
    Xor,
    Tilde,
    Not,
    At,
    LogicalOr,
    LogicalAnd,
    Coalesce,
    Shl,
    Shr,
    Inc,
    Dec,
    Arrow,
    NullsafeArrow,
    DoubleArrow,
    AddAssign,
    SubAssign,
    MulAssign,
    PowAssign,
    QuoAssign,
    ConcatAssign,
    RemAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    CoalesceAssign,

    Abstract,
    As,
    Break,
    Case,
    Catch,
    Class,
    Clone,
    Const,
    Continue,
    Declare,
    Default,
    Do,
    Else,
    Enum,
    Extends,
    Final,
    Finally,
    Fn,
    For,
    Foreach,
    From,
    Function,
    Global,
    Goto,
    If,
    Implements,
    Instanceof,
    Insteadof,
    Interface,
    Match,
    Namespace,
    New,
    Private,
    Protected,
    Public,
    Readonly,
    Return,
    Static,
    Switch,
    Throw,
    Trait,
    Try,
    Use,
    While,
    Yield,
}

/// Operator and punctuation spellings, longest first so that the lexer
/// can pick the first prefix match.
pub(crate) const SYMBOLS: &[(&str, TokenKind)] = &[
    ("**=", TokenKind::PowAssign),
    ("...", TokenKind::Ellipsis),
    ("<<=", TokenKind::ShlAssign),
    (">>=", TokenKind::ShrAssign),
    ("<=>", TokenKind::Spaceship),
    ("===", TokenKind::Identical),
    ("!==", TokenKind::NotIdentical),
    ("??=", TokenKind::CoalesceAssign),
    ("?->", TokenKind::NullsafeArrow),
    ("::", TokenKind::DoubleColon),
    ("->", TokenKind::Arrow),
    ("=>", TokenKind::DoubleArrow),
    ("**", TokenKind::Pow),
    ("<<", TokenKind::Shl),
    (">>", TokenKind::Shr),
    ("<=", TokenKind::Leq),
    (">=", TokenKind::Geq),
    ("==", TokenKind::Eql),
    ("!=", TokenKind::NotEql),
    ("&&", TokenKind::LogicalAnd),
    ("||", TokenKind::LogicalOr),
    ("??", TokenKind::Coalesce),
    ("++", TokenKind::Inc),
    ("--", TokenKind::Dec),
    ("+=", TokenKind::AddAssign),
    ("-=", TokenKind::SubAssign),
    ("*=", TokenKind::MulAssign),
    ("/=", TokenKind::QuoAssign),
    (".=", TokenKind::ConcatAssign),
    ("%=", TokenKind::RemAssign),
    ("&=", TokenKind::AndAssign),
    ("|=", TokenKind::OrAssign),
    ("^=", TokenKind::XorAssign),
    ("$", TokenKind::Dollar),
    ("\\", TokenKind::Backslash),
    ("?", TokenKind::Qmark),
    ("(", TokenKind::Lparen),
    (")", TokenKind::Rparen),
    ("[", TokenKind::Lbrack),
    ("]", TokenKind::Rbrack),
    ("{", TokenKind::Lbrace),
    ("}", TokenKind::Rbrace),
    ("+", TokenKind::Add),
    ("-", TokenKind::Sub),
    ("*", TokenKind::Mul),
    ("/", TokenKind::Quo),
    ("%", TokenKind::Rem),
    ("=", TokenKind::Assign),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    (".", TokenKind::Period),
    (",", TokenKind::Comma),
    (":", TokenKind::Colon),
    (";", TokenKind::Semicolon),
    ("|", TokenKind::Or),
    ("&", TokenKind::And),
    ("^", TokenKind::Xor),
    ("~", TokenKind::Tilde),
    ("!", TokenKind::Not),
    ("@", TokenKind::At),
];

impl TokenKind {
    /// Look up a reserved word. Only the lower-case spelling is a
    /// keyword; anything else stays an identifier.
    #[must_use]
    pub fn keyword(word: &str) -> Option<Self> {
        let kind = match word {
            "abstract" => Self::Abstract,
            "as" => Self::As,
            "break" => Self::Break,
            "case" => Self::Case,
            "catch" => Self::Catch,
            "class" => Self::Class,
            "clone" => Self::Clone,
            "const" => Self::Const,
            "continue" => Self::Continue,
            "declare" => Self::Declare,
            "default" => Self::Default,
            "do" => Self::Do,
            "else" => Self::Else,
            "enum" => Self::Enum,
            "extends" => Self::Extends,
            "final" => Self::Final,
            "finally" => Self::Finally,
            "fn" => Self::Fn,
            "for" => Self::For,
            "foreach" => Self::Foreach,
            "from" => Self::From,
            "function" => Self::Function,
            "global" => Self::Global,
            "goto" => Self::Goto,
            "if" => Self::If,
            "implements" => Self::Implements,
            "instanceof" => Self::Instanceof,
            "insteadof" => Self::Insteadof,
            "interface" => Self::Interface,
            "match" => Self::Match,
            "namespace" => Self::Namespace,
            "new" => Self::New,
            "private" => Self::Private,
            "protected" => Self::Protected,
            "public" => Self::Public,
            "readonly" => Self::Readonly,
            "return" => Self::Return,
            "static" => Self::Static,
            "switch" => Self::Switch,
            "throw" => Self::Throw,
            "trait" => Self::Trait,
            "try" => Self::Try,
            "use" => Self::Use,
            "while" => Self::While,
            "yield" => Self::Yield,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical text of a symbol or keyword, `None` for kinds whose
    /// text comes from the source.
    #[must_use]
    pub const fn spelling(self) -> Option<&'static str> {
        let s = match self {
            Self::Illegal
            | Self::Eof
            | Self::Whitespace
            | Self::LineComment
            | Self::BlockComment
            | Self::DocComment
            | Self::Ident
            | Self::Int
            | Self::Float
            | Self::String
            | Self::Var
            | Self::InlineHtml => return None,

            Self::OpenTag => "<?php",
            Self::CloseTag => "?>",
            Self::Dollar => "$",
            Self::Backslash => "\\",
            Self::Qmark => "?",
            Self::Lparen => "(",
            Self::Rparen => ")",
            Self::Lbrack => "[",
            Self::Rbrack => "]",
            Self::Lbrace => "{",
            Self::Rbrace => "}",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Pow => "**",
            Self::Quo => "/",
            Self::Rem => "%",
            Self::Assign => "=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Leq => "<=",
            Self::Geq => ">=",
            Self::Spaceship => "<=>",
            Self::Eql => "==",
            Self::NotEql => "!=",
            Self::Identical => "===",
            Self::NotIdentical => "!==",
            Self::Period => ".",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::DoubleColon => "::",
            Self::Semicolon => ";",
            Self::Ellipsis => "...",
            Self::Or => "|",
            Self::And => "&",
            Self::Xor => "^",
            Self::Tilde => "~",
            Self::Not => "!",
            Self::At => "@",
            Self::LogicalOr => "||",
            Self::LogicalAnd => "&&",
            Self::Coalesce => "??",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Inc => "++",
            Self::Dec => "--",
            Self::Arrow => "->",
            Self::NullsafeArrow => "?->",
            Self::DoubleArrow => "=>",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::PowAssign => "**=",
            Self::QuoAssign => "/=",
            Self::ConcatAssign => ".=",
            Self::RemAssign => "%=",
            Self::AndAssign => "&=",
            Self::OrAssign => "|=",
            Self::XorAssign => "^=",
            Self::ShlAssign => "<<=",
            Self::ShrAssign => ">>=",
            Self::CoalesceAssign => "??=",

            Self::Abstract => "abstract",
            Self::As => "as",
            Self::Break => "break",
            Self::Case => "case",
            Self::Catch => "catch",
            Self::Class => "class",
            Self::Clone => "clone",
            Self::Const => "const",
            Self::Continue => "continue",
            Self::Declare => "declare",
            Self::Default => "default",
            Self::Do => "do",
            Self::Else => "else",
            Self::Enum => "enum",
            Self::Extends => "extends",
            Self::Final => "final",
            Self::Finally => "finally",
            Self::Fn => "fn",
            Self::For => "for",
            Self::Foreach => "foreach",
            Self::From => "from",
            Self::Function => "function",
            Self::Global => "global",
            Self::Goto => "goto",
            Self::If => "if",
            Self::Implements => "implements",
            Self::Instanceof => "instanceof",
            Self::Insteadof => "insteadof",
            Self::Interface => "interface",
            Self::Match => "match",
            Self::Namespace => "namespace",
            Self::New => "new",
            Self::Private => "private",
            Self::Protected => "protected",
            Self::Public => "public",
            Self::Readonly => "readonly",
            Self::Return => "return",
            Self::Static => "static",
            Self::Switch => "switch",
            Self::Throw => "throw",
            Self::Trait => "trait",
            Self::Try => "try",
            Self::Use => "use",
            Self::While => "while",
            Self::Yield => "yield",
        };
        Some(s)
    }

    #[must_use]
    pub const fn is_keyword(self) -> bool {
        self as u16 >= Self::Abstract as u16
    }

    #[must_use]
    pub const fn is_comment(self) -> bool {
        matches!(self, Self::LineComment | Self::BlockComment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.spelling() {
            Some(s) => f.write_str(s),
            None if *self == Self::Eof => f.write_str("EOF"),
            None => write!(f, "{self:?}"),
        }
    }
}

/// A single token with its kind, text, and source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: Position,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }

    /// Build a symbol or keyword token; its text is the canonical
    /// spelling of `kind`.
    #[must_use]
    pub fn fixed(kind: TokenKind, pos: Position) -> Self {
        Self::new(kind, kind.spelling().unwrap_or_default(), pos)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == TokenKind::Eof || self.kind.spelling().is_some() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{:?}({:?})", self.kind, self.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_is_exact() {
        assert_eq!(TokenKind::keyword("class"), Some(TokenKind::Class));
        assert_eq!(TokenKind::keyword("Class"), None);
        assert_eq!(TokenKind::keyword("callable"), None);
        assert_eq!(TokenKind::keyword("self"), None);
    }

    #[test]
    fn keywords_spell_themselves() {
        for word in ["abstract", "elseif", "function", "yield", "parent"] {
            if let Some(kind) = TokenKind::keyword(word) {
                assert!(kind.is_keyword());
                assert_eq!(kind.spelling(), Some(word));
            }
        }
    }

    #[test]
    fn symbols_are_longest_first() {
        for (i, (a, _)) in SYMBOLS.iter().enumerate() {
            for (b, _) in &SYMBOLS[i + 1..] {
                assert!(
                    !b.starts_with(a) || a == b,
                    "{a:?} shadows the longer symbol {b:?}"
                );
            }
        }
    }

    #[test]
    fn symbol_table_matches_spelling() {
        for (text, kind) in SYMBOLS {
            assert_eq!(kind.spelling(), Some(*text));
            assert!(!kind.is_keyword());
        }
    }

    #[test]
    fn display() {
        let pos = Position::new(1, 1);
        assert_eq!(Token::fixed(TokenKind::Arrow, pos).to_string(), "->");
        assert_eq!(Token::new(TokenKind::Eof, "", pos).to_string(), "EOF");
        assert_eq!(
            Token::new(TokenKind::InlineHtml, "   ", pos).to_string(),
            "InlineHtml(\"   \")"
        );
        assert_eq!(pos.to_string(), "1:1");
    }
}
