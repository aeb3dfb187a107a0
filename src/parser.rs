use std::fmt;
use std::mem;

use tracing::{debug, trace};

use crate::ast::{
    ArrayElem, ArrayLit, Block, CaseLabel, Catch, ClassDecl, ConstDecl, Decl, DeclKind, Elem, Expr,
    File, ForStmt, FuncDecl, FuncLit, IfStmt, Inheritance, InterfaceDecl, Markup, Member,
    MemberDecl, Modifiers, Name, Param, ParamList, Pragma, Stmt, SwitchStmt, TraitDecl, TryStmt,
    Type, UnknownExpr, UnknownStmt, UseKind, UseStmt, VarDecl, Visibility,
};
use crate::docblock::{self, DocBlock, DocErrorKind};
use crate::lexer::{LexErrorKind, Lexer};
use crate::token::{Position, Token, TokenKind};

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Scan error reported by the lexer.
    Lex(LexErrorKind),
    /// Malformed doc comment.
    Doc(DocErrorKind),
    Expected { expected: String, found: String },
    ExpectedType { found: String },
    ExpectedLiteral { found: String },
    ExpectedMember { found: String },
    /// A doc comment before a statement that cannot carry one.
    AfterDocComment { found: String },
    EmptyExpr,
    DuplicateModifier(TokenKind),
    ConflictingModifiers(TokenKind, TokenKind),
    ModifierNotAllowed {
        modifier: TokenKind,
        target: &'static str,
    },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(kind) => write!(f, "{kind}"),
            Self::Doc(kind) => write!(f, "parsing doc comment: {kind}"),
            Self::Expected { expected, found } => {
                write!(f, "expecting {expected}, found {found}")
            }
            Self::ExpectedType { found } => write!(f, "unexpected {found}, expecting type"),
            Self::ExpectedLiteral { found } => {
                write!(f, "unexpected {found}, expecting literal")
            }
            Self::ExpectedMember { found } => {
                write!(f, "unexpected {found}, expecting class member")
            }
            Self::AfterDocComment { found } => {
                write!(f, "unexpected {found} after doc comment")
            }
            Self::EmptyExpr => write!(f, "unexpected empty expression"),
            Self::DuplicateModifier(kind) => write!(f, "duplicate modifier {kind}"),
            Self::ConflictingModifiers(a, b) => {
                write!(f, "modifiers {a} and {b} cannot be combined")
            }
            Self::ModifierNotAllowed { modifier, target } => {
                write!(f, "modifier {modifier} not allowed on {target}")
            }
        }
    }
}

/// Error produced during parsing. Scan errors are reported through the
/// same type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", pos.line, pos.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub pos: Position,
}

impl ParseError {
    #[must_use]
    pub const fn line(&self) -> usize {
        self.pos.line
    }

    #[must_use]
    pub const fn column(&self) -> usize {
        self.pos.column
    }
}

type PResult<T> = Result<T, ParseError>;

/// Parse a complete source file.
///
/// # Errors
///
/// Returns the first scan or syntax error.
pub fn parse(input: &str) -> Result<File, ParseError> {
    let file = Parser::new(input).parse_file()?;
    debug!(
        pragmas = file.pragmas.len(),
        uses = file.uses.len(),
        stmts = file.stmts.len(),
        "parsed file"
    );
    Ok(file)
}

/// What precedes a statement or member.
enum LeadingDoc {
    None,
    Attached(DocBlock),
    /// Followed by another doc comment or the end of the body, kept as a
    /// plain comment.
    Detached(String),
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    tok: Token,
    prev: Token,
    /// Token pushed back by [`Parser::backup`].
    alt: Option<Token>,
    /// First error; later ones are ignored.
    err: Option<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let start = Token::new(TokenKind::Illegal, "", Position::default());
        Self {
            lexer: Lexer::new(input),
            tok: start.clone(),
            prev: start,
            alt: None,
            err: None,
        }
    }

    // --- token plumbing -------------------------------------------------

    /// Advance by one token, whitespace included.
    fn next0(&mut self) -> PResult<()> {
        if self.tok.kind == TokenKind::Eof {
            return Ok(());
        }
        if let Some(tok) = self.alt.take() {
            self.tok = tok;
            return Ok(());
        }
        self.tok = self.lexer.next_token();
        if self.tok.kind == TokenKind::Eof {
            if let Some(err) = self.lexer.take_error() {
                return Err(self.fail_at(ParseErrorKind::Lex(err.kind), err.pos));
            }
        }
        Ok(())
    }

    /// Advance to the next token, skipping whitespace.
    fn next(&mut self) -> PResult<()> {
        self.prev = self.tok.clone();
        self.next0()?;
        self.skip_whitespace()
    }

    /// Step back to the token before the last [`Parser::next`].
    fn backup(&mut self) {
        assert!(self.alt.is_none(), "cannot back up twice");
        let tok = mem::replace(&mut self.tok, self.prev.clone());
        self.alt = Some(tok);
    }

    fn skip_whitespace(&mut self) -> PResult<()> {
        if self.tok.kind == TokenKind::Whitespace {
            self.next0()?;
        }
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<String> {
        let text = self.expect0(kind)?;
        self.skip_whitespace()?;
        Ok(text)
    }

    /// Like [`Parser::expect`] but keeps the whitespace that follows.
    fn expect0(&mut self, kind: TokenKind) -> PResult<String> {
        if self.tok.kind != kind {
            return Err(self.expected(&kind.to_string()));
        }
        let text = self.take_text();
        self.next0()?;
        Ok(text)
    }

    fn got(&mut self, kind: TokenKind) -> PResult<bool> {
        if self.tok.kind == kind {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn until(&self, kind: TokenKind) -> bool {
        self.tok.kind != kind && self.tok.kind != TokenKind::Eof
    }

    fn take_text(&mut self) -> String {
        mem::take(&mut self.tok.text)
    }

    /// Identifier or reserved word used as a name, e.g. `function list()`.
    fn expect_word(&mut self) -> PResult<String> {
        if self.tok.kind.is_keyword() {
            let text = self.take_text();
            self.next()?;
            return Ok(text);
        }
        self.expect(TokenKind::Ident)
    }

    fn expected(&mut self, what: &str) -> ParseError {
        let kind = ParseErrorKind::Expected {
            expected: what.to_string(),
            found: self.tok.to_string(),
        };
        self.error(kind)
    }

    fn error(&mut self, kind: ParseErrorKind) -> ParseError {
        let pos = self.tok.pos;
        self.fail_at(kind, pos)
    }

    /// Record an error and force the current token to `Eof`.
    fn fail_at(&mut self, kind: ParseErrorKind, pos: Position) -> ParseError {
        let err = self
            .err
            .get_or_insert_with(|| ParseError { kind, pos })
            .clone();
        self.tok = Token::new(TokenKind::Eof, "", self.tok.pos);
        debug!(%err, "parse failed");
        err
    }

    // --- file level -----------------------------------------------------

    // File = "<?php" { Pragma } [ "namespace" Name ";" ] { UseStmt } { TopLevelStmt } .
    fn parse_file(mut self) -> PResult<File> {
        self.next0()?;
        self.expect(TokenKind::OpenTag)?;
        let pragmas = self.parse_pragmas()?;
        let namespace = if self.got(TokenKind::Namespace)? {
            let name = self.parse_name()?;
            self.expect(TokenKind::Semicolon)?;
            Some(name)
        } else {
            None
        };
        let mut uses = Vec::new();
        while self.tok.kind == TokenKind::Use {
            uses.push(self.parse_use_stmt()?);
        }
        let mut stmts = Vec::new();
        while !self.got(TokenKind::Eof)? {
            stmts.push(self.parse_top_level_stmt()?);
        }
        Ok(File {
            pragmas,
            namespace,
            uses,
            stmts,
        })
    }

    // Pragma = "declare" "(" ident "=" BasicLit ")" ";" .
    fn parse_pragmas(&mut self) -> PResult<Vec<Pragma>> {
        let mut pragmas = Vec::new();
        while self.got(TokenKind::Declare)? {
            self.expect(TokenKind::Lparen)?;
            let name = self.expect(TokenKind::Ident)?;
            self.expect(TokenKind::Assign)?;
            let value = self.parse_basic_lit()?;
            self.expect(TokenKind::Rparen)?;
            self.expect(TokenKind::Semicolon)?;
            pragmas.push(Pragma { name, value });
        }
        Ok(pragmas)
    }

    // UseStmt = "use" [ "function" | "const" ] Name [ "as" ident ] ";" [ comment ] .
    fn parse_use_stmt(&mut self) -> PResult<UseStmt> {
        self.expect(TokenKind::Use)?;
        let kind = if self.got(TokenKind::Function)? {
            UseKind::Function
        } else if self.got(TokenKind::Const)? {
            UseKind::Const
        } else {
            UseKind::Class
        };
        let name = self.parse_name()?;
        let alias = if self.got(TokenKind::As)? {
            Some(self.expect(TokenKind::Ident)?)
        } else {
            None
        };
        self.expect0(TokenKind::Semicolon)?;
        let comment = self.parse_opt_comment()?;
        Ok(UseStmt {
            kind,
            name,
            alias,
            comment,
        })
    }

    fn parse_top_level_stmt(&mut self) -> PResult<Stmt> {
        let doc = match self.parse_leading_doc()? {
            LeadingDoc::Detached(text) => return Ok(Stmt::Comment(text)),
            LeadingDoc::Attached(doc) => Some(doc),
            LeadingDoc::None => None,
        };
        trace!(token = %self.tok, "top-level statement");
        let kind = match self.tok.kind {
            TokenKind::Const => DeclKind::Const(self.parse_const_decl()?),
            TokenKind::Function => {
                // `function (` at statement level is a closure expression.
                self.next()?;
                let closure = self.tok.kind == TokenKind::Lparen;
                self.backup();
                if closure {
                    return self.parse_stmt(doc);
                }
                DeclKind::Func(self.parse_func_decl()?)
            }
            TokenKind::Class | TokenKind::Abstract | TokenKind::Final => {
                DeclKind::Class(self.parse_class_decl(false)?)
            }
            TokenKind::Interface => DeclKind::Interface(self.parse_interface_decl()?),
            TokenKind::Trait => DeclKind::Trait(self.parse_trait_decl()?),
            _ => return self.parse_stmt(doc),
        };
        Ok(Stmt::Decl(Decl { doc, kind }))
    }

    /// Trailing comment on the same line, after `;`.
    fn parse_opt_comment(&mut self) -> PResult<Option<String>> {
        if self.tok.kind == TokenKind::Whitespace {
            let newline = self.tok.text.contains('\n');
            self.next()?;
            if newline {
                return Ok(None);
            }
        }
        if self.tok.kind.is_comment() {
            let text = self.take_text();
            self.next()?;
            return Ok(Some(text));
        }
        Ok(None)
    }

    fn parse_leading_doc(&mut self) -> PResult<LeadingDoc> {
        if self.tok.kind != TokenKind::DocComment {
            return Ok(LeadingDoc::None);
        }
        let doc = match docblock::parse(&self.tok.text) {
            Ok(doc) => doc,
            Err(err) => {
                let at = self.tok.pos;
                let pos = if err.pos.line == 1 {
                    Position::new(at.line, at.column + err.pos.column - 1)
                } else {
                    Position::new(at.line + err.pos.line - 1, err.pos.column)
                };
                return Err(self.fail_at(ParseErrorKind::Doc(err.kind), pos));
            }
        };
        let text = self.take_text();
        self.next()?;
        if matches!(
            self.tok.kind,
            TokenKind::DocComment
                | TokenKind::Rbrace
                | TokenKind::Eof
                | TokenKind::Case
                | TokenKind::Default
        ) {
            return Ok(LeadingDoc::Detached(text));
        }
        Ok(LeadingDoc::Attached(doc))
    }

    // --- declarations ---------------------------------------------------

    // ConstDecl = "const" name "=" Expr ";" [ comment ] .
    fn parse_const_decl(&mut self) -> PResult<ConstDecl> {
        self.expect(TokenKind::Const)?;
        let name = self.expect_word()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        self.expect0(TokenKind::Semicolon)?;
        let comment = self.parse_opt_comment()?;
        Ok(ConstDecl {
            name,
            value,
            comment,
        })
    }

    // VarDecl = [ Type ] var [ "=" Expr ] ";" [ comment ] .
    fn parse_var_decl(&mut self) -> PResult<VarDecl> {
        let ty = self.try_parse_type()?;
        let name = self.expect(TokenKind::Var)?;
        let value = if self.got(TokenKind::Assign)? {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect0(TokenKind::Semicolon)?;
        let comment = self.parse_opt_comment()?;
        Ok(VarDecl {
            ty,
            name,
            value,
            comment,
        })
    }

    // FuncDecl = "function" [ "&" ] name ParamList [ ":" Type ] ( BlockStmt | ";" ) .
    fn parse_func_decl(&mut self) -> PResult<FuncDecl> {
        self.expect(TokenKind::Function)?;
        let by_ref = self.got(TokenKind::And)?;
        let name = self.expect_word()?;
        let params = self.parse_param_list()?;
        let result = if self.got(TokenKind::Colon)? {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = if self.tok.kind == TokenKind::Lbrace {
            Some(self.parse_block()?)
        } else {
            // Abstract and interface methods.
            self.expect(TokenKind::Semicolon)?;
            None
        };
        Ok(FuncDecl {
            by_ref,
            name,
            params,
            result,
            body,
        })
    }

    // ParamList = "(" [ Param { "," Param } [ "," ] ] ")" .
    // Param     = { Modifier } [ Type ] [ "&" ] [ "..." ] var [ "=" ConstExpr ] .
    fn parse_param_list(&mut self) -> PResult<ParamList> {
        self.expect0(TokenKind::Lparen)?;
        let multiline = self.tok.kind == TokenKind::Whitespace && self.tok.text.contains('\n');
        self.skip_whitespace()?;
        let mut params = Vec::new();
        while self.until(TokenKind::Rparen) {
            params.push(self.parse_param()?);
            if self.tok.kind == TokenKind::Rparen {
                break;
            }
            self.expect(TokenKind::Comma)?;
        }
        self.expect(TokenKind::Rparen)?;
        Ok(ParamList {
            multiline: multiline && !params.is_empty(),
            params,
        })
    }

    fn parse_param(&mut self) -> PResult<Param> {
        let mut visibility = Visibility::Default;
        let mut readonly = false;
        loop {
            let kind = self.tok.kind;
            let vis = match kind {
                TokenKind::Public => Visibility::Public,
                TokenKind::Protected => Visibility::Protected,
                TokenKind::Private => Visibility::Private,
                TokenKind::Readonly if readonly => {
                    return Err(self.error(ParseErrorKind::DuplicateModifier(kind)));
                }
                TokenKind::Readonly => {
                    readonly = true;
                    self.next()?;
                    continue;
                }
                _ => break,
            };
            if visibility != Visibility::Default {
                return Err(self.error(ParseErrorKind::DuplicateModifier(kind)));
            }
            visibility = vis;
            self.next()?;
        }
        let ty = self.try_parse_type()?;
        let by_ref = self.got(TokenKind::And)?;
        let variadic = self.got(TokenKind::Ellipsis)?;
        let name = self.expect(TokenKind::Var)?;
        let default = if self.got(TokenKind::Assign)? {
            Some(self.parse_const_expr()?)
        } else {
            None
        };
        Ok(Param {
            visibility,
            readonly,
            ty,
            by_ref,
            variadic,
            name,
            default,
        })
    }

    // ClassDecl = [ "abstract" | "final" ] "class" ident [ "extends" Name ]
    //             [ "implements" Name { "," Name } ] "{" { TraitUse } { Member } "}" .
    // An anonymous class has an optional argument list instead of a name.
    fn parse_class_decl(&mut self, anonymous: bool) -> PResult<ClassDecl> {
        let inheritance = if self.got(TokenKind::Abstract)? {
            Some(Inheritance::Abstract)
        } else if self.got(TokenKind::Final)? {
            Some(Inheritance::Final)
        } else {
            None
        };
        self.expect(TokenKind::Class)?;
        let (name, args) = if anonymous {
            let args = if self.tok.kind == TokenKind::Lparen {
                let args = self.parse_paren()?;
                self.skip_whitespace()?;
                Some(args)
            } else {
                None
            };
            (None, args)
        } else {
            (Some(self.expect(TokenKind::Ident)?), None)
        };
        let extends = if self.got(TokenKind::Extends)? {
            Some(self.parse_name()?)
        } else {
            None
        };
        let implements = if self.got(TokenKind::Implements)? {
            self.parse_name_list()?
        } else {
            Vec::new()
        };
        self.expect(TokenKind::Lbrace)?;
        let traits = self.parse_trait_uses()?;
        let members = self.parse_members()?;
        Ok(ClassDecl {
            name,
            inheritance,
            args,
            extends,
            implements,
            traits,
            members,
        })
    }

    // InterfaceDecl = "interface" ident [ "extends" Name { "," Name } ] "{" { Member } "}" .
    fn parse_interface_decl(&mut self) -> PResult<InterfaceDecl> {
        self.expect(TokenKind::Interface)?;
        let name = self.expect(TokenKind::Ident)?;
        let extends = if self.got(TokenKind::Extends)? {
            self.parse_name_list()?
        } else {
            Vec::new()
        };
        self.expect(TokenKind::Lbrace)?;
        let members = self.parse_members()?;
        Ok(InterfaceDecl {
            name,
            extends,
            members,
        })
    }

    // TraitDecl = "trait" ident "{" { TraitUse } { Member } "}" .
    fn parse_trait_decl(&mut self) -> PResult<TraitDecl> {
        self.expect(TokenKind::Trait)?;
        let name = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::Lbrace)?;
        let traits = self.parse_trait_uses()?;
        let members = self.parse_members()?;
        Ok(TraitDecl {
            name,
            traits,
            members,
        })
    }

    fn parse_trait_uses(&mut self) -> PResult<Vec<UseStmt>> {
        let mut traits = Vec::new();
        while self.tok.kind == TokenKind::Use {
            traits.push(self.parse_use_stmt()?);
        }
        Ok(traits)
    }

    /// Members up to and including the closing `}`.
    fn parse_members(&mut self) -> PResult<Vec<Member>> {
        let mut members = Vec::new();
        while self.until(TokenKind::Rbrace) {
            members.push(self.parse_member()?);
        }
        self.expect(TokenKind::Rbrace)?;
        Ok(members)
    }

    // Member = comment | [ DocComment ] { Modifier } ( ConstDecl | VarDecl | FuncDecl ) .
    fn parse_member(&mut self) -> PResult<Member> {
        if self.tok.kind.is_comment() {
            let text = self.take_text();
            self.next()?;
            return Ok(Member::Comment(text));
        }
        let doc = match self.parse_leading_doc()? {
            LeadingDoc::Detached(text) => return Ok(Member::Comment(text)),
            LeadingDoc::Attached(doc) => Some(doc),
            LeadingDoc::None => None,
        };
        let modifiers = self.parse_modifiers()?;
        let kind = match self.tok.kind {
            TokenKind::Const => {
                self.check_modifiers(&modifiers, "constant")?;
                DeclKind::Const(self.parse_const_decl()?)
            }
            TokenKind::Var | TokenKind::Ident | TokenKind::Qmark | TokenKind::Backslash => {
                self.check_modifiers(&modifiers, "property")?;
                DeclKind::Var(self.parse_var_decl()?)
            }
            TokenKind::Function => {
                self.check_modifiers(&modifiers, "method")?;
                DeclKind::Func(self.parse_func_decl()?)
            }
            _ => {
                let found = self.tok.to_string();
                return Err(self.error(ParseErrorKind::ExpectedMember { found }));
            }
        };
        Ok(Member::Decl(MemberDecl {
            modifiers,
            decl: Decl { doc, kind },
        }))
    }

    /// Modifiers in any order; each may appear once.
    fn parse_modifiers(&mut self) -> PResult<Modifiers> {
        let mut m = Modifiers::default();
        let mut seen: Vec<TokenKind> = Vec::new();
        loop {
            let kind = self.tok.kind;
            if !matches!(
                kind,
                TokenKind::Public
                    | TokenKind::Protected
                    | TokenKind::Private
                    | TokenKind::Static
                    | TokenKind::Readonly
                    | TokenKind::Abstract
                    | TokenKind::Final
            ) {
                return Ok(m);
            }
            if seen.contains(&kind) {
                return Err(self.error(ParseErrorKind::DuplicateModifier(kind)));
            }
            let conflict = seen.iter().copied().find(|&other| {
                is_visibility(other) && is_visibility(kind)
                    || matches!(
                        (other, kind),
                        (TokenKind::Abstract, TokenKind::Final)
                            | (TokenKind::Final, TokenKind::Abstract)
                    )
            });
            if let Some(other) = conflict {
                return Err(self.error(ParseErrorKind::ConflictingModifiers(other, kind)));
            }
            match kind {
                TokenKind::Public => m.visibility = Visibility::Public,
                TokenKind::Protected => m.visibility = Visibility::Protected,
                TokenKind::Private => m.visibility = Visibility::Private,
                TokenKind::Static => m.is_static = true,
                TokenKind::Readonly => m.readonly = true,
                TokenKind::Abstract => m.inheritance = Some(Inheritance::Abstract),
                _ => m.inheritance = Some(Inheritance::Final),
            }
            seen.push(kind);
            self.next()?;
        }
    }

    fn check_modifiers(&mut self, m: &Modifiers, target: &'static str) -> PResult<()> {
        let not_allowed = match target {
            "constant" if m.is_static => Some(TokenKind::Static),
            "constant" | "method" if m.readonly => Some(TokenKind::Readonly),
            "constant" | "property" if m.inheritance == Some(Inheritance::Abstract) => {
                Some(TokenKind::Abstract)
            }
            "property" if m.inheritance == Some(Inheritance::Final) => Some(TokenKind::Final),
            _ => None,
        };
        match not_allowed {
            Some(modifier) => Err(self.error(ParseErrorKind::ModifierNotAllowed { modifier, target })),
            None => Ok(()),
        }
    }

    // --- statements -----------------------------------------------------

    // BlockStmt = "{" { Stmt } "}" .
    fn parse_block(&mut self) -> PResult<Block> {
        let block = self.parse_block0()?;
        self.skip_whitespace()?;
        Ok(block)
    }

    /// Like [`Parser::parse_block`] but keeps the whitespace after `}`.
    fn parse_block0(&mut self) -> PResult<Block> {
        self.expect(TokenKind::Lbrace)?;
        let mut stmts = Vec::new();
        while self.until(TokenKind::Rbrace) {
            stmts.push(self.parse_inner_stmt()?);
        }
        self.expect0(TokenKind::Rbrace)?;
        Ok(Block { stmts })
    }

    /// Statement inside a block, optionally documented.
    fn parse_inner_stmt(&mut self) -> PResult<Stmt> {
        match self.parse_leading_doc()? {
            LeadingDoc::Detached(text) => Ok(Stmt::Comment(text)),
            LeadingDoc::Attached(doc) => self.parse_stmt(Some(doc)),
            LeadingDoc::None => self.parse_stmt(None),
        }
    }

    // Stmt = comment | BlockStmt | IfStmt | SwitchStmt | ForStmt | TryStmt | Markup | UnknownStmt .
    fn parse_stmt(&mut self, doc: Option<DocBlock>) -> PResult<Stmt> {
        let kind = self.tok.kind;
        let undocumentable = kind.is_comment()
            || matches!(
                kind,
                TokenKind::Lbrace
                    | TokenKind::If
                    | TokenKind::Switch
                    | TokenKind::For
                    | TokenKind::Try
                    | TokenKind::CloseTag
            );
        if doc.is_some() && undocumentable {
            let found = self.tok.to_string();
            return Err(self.error(ParseErrorKind::AfterDocComment { found }));
        }
        match kind {
            TokenKind::LineComment | TokenKind::BlockComment => {
                let text = self.take_text();
                self.next()?;
                Ok(Stmt::Comment(text))
            }
            TokenKind::Lbrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::Switch => self.parse_switch_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Try => self.parse_try_stmt(),
            TokenKind::CloseTag => self.parse_markup(),
            _ => self.parse_unknown_stmt(doc),
        }
    }

    // IfStmt = "if" "(" Expr ")" Stmt [ "else" Stmt ] .
    fn parse_if_stmt(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::If)?;
        let cond = self.parse_cond()?;
        let then = Box::new(self.parse_stmt(None)?);
        let otherwise = if self.got(TokenKind::Else)? {
            Some(Box::new(self.parse_stmt(None)?))
        } else {
            None
        };
        Ok(Stmt::If(IfStmt {
            cond,
            then,
            otherwise,
        }))
    }

    /// `( Expr )` of a control statement.
    fn parse_cond(&mut self) -> PResult<Expr> {
        self.expect(TokenKind::Lparen)?;
        let cond = self.parse_nested_expr()?;
        self.expect(TokenKind::Rparen)?;
        Ok(cond)
    }

    // SwitchStmt = "switch" "(" Expr ")" "{" { CaseLabel | Stmt } "}" .
    fn parse_switch_stmt(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::Switch)?;
        let tag = self.parse_cond()?;
        self.expect(TokenKind::Lbrace)?;
        let mut stmts = Vec::new();
        while self.until(TokenKind::Rbrace) {
            let stmt = match self.tok.kind {
                TokenKind::Case => {
                    self.next()?;
                    let value = self.parse_expr()?;
                    self.parse_case_end()?;
                    Stmt::Case(CaseLabel { value: Some(value) })
                }
                TokenKind::Default => {
                    self.next()?;
                    self.parse_case_end()?;
                    Stmt::Case(CaseLabel { value: None })
                }
                _ => self.parse_inner_stmt()?,
            };
            stmts.push(stmt);
        }
        self.expect(TokenKind::Rbrace)?;
        Ok(Stmt::Switch(SwitchStmt {
            tag,
            body: Block { stmts },
        }))
    }

    /// A case label ends with `:` or, less commonly, `;`.
    fn parse_case_end(&mut self) -> PResult<()> {
        if !self.got(TokenKind::Semicolon)? {
            self.expect(TokenKind::Colon)?;
        }
        Ok(())
    }

    // ForStmt = "for" "(" [ Expr ] ";" [ Expr ] ";" [ Expr ] ")" Stmt .
    fn parse_for_stmt(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::Lparen)?;
        let init = if self.got(TokenKind::Semicolon)? {
            None
        } else {
            let init = self.parse_nested_expr()?;
            self.expect(TokenKind::Semicolon)?;
            Some(init)
        };
        let cond = if self.got(TokenKind::Semicolon)? {
            None
        } else {
            let cond = self.parse_nested_expr()?;
            self.expect(TokenKind::Semicolon)?;
            Some(cond)
        };
        let post = if self.got(TokenKind::Rparen)? {
            None
        } else {
            let post = self.parse_nested_expr()?;
            self.expect(TokenKind::Rparen)?;
            Some(post)
        };
        let body = Box::new(self.parse_stmt(None)?);
        Ok(Stmt::For(ForStmt {
            init,
            cond,
            post,
            body,
        }))
    }

    // TryStmt = "try" BlockStmt { "catch" "(" Expr ")" BlockStmt } [ "finally" BlockStmt ] .
    fn parse_try_stmt(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::Try)?;
        let body = self.parse_block()?;
        let mut catches = Vec::new();
        while self.got(TokenKind::Catch)? {
            let cond = self.parse_cond()?;
            let body = self.parse_block()?;
            catches.push(Catch { cond, body });
        }
        let finally = if self.got(TokenKind::Finally)? {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::Try(TryStmt {
            body,
            catches,
            finally,
        }))
    }

    // Markup = "?>" [ inlineHTML ] [ "<?php" ] .
    fn parse_markup(&mut self) -> PResult<Stmt> {
        self.expect0(TokenKind::CloseTag)?;
        let text = if self.tok.kind == TokenKind::InlineHtml {
            let text = self.take_text();
            self.next0()?;
            text
        } else {
            String::new()
        };
        let reopen = self.got(TokenKind::OpenTag)?;
        Ok(Stmt::Markup(Markup { text, reopen }))
    }

    // UnknownStmt = Expr ( ";" [ comment ] | BlockStmt | before "?>" ) .
    fn parse_unknown_stmt(&mut self, doc: Option<DocBlock>) -> PResult<Stmt> {
        let expr = self.parse_expr()?;
        let (body, comment) = match self.tok.kind {
            TokenKind::Semicolon => {
                self.next0()?;
                (None, self.parse_opt_comment()?)
            }
            TokenKind::Lbrace => (Some(self.parse_block()?), None),
            TokenKind::CloseTag => (None, None),
            _ => return Err(self.expected(";")),
        };
        Ok(Stmt::Unknown(UnknownStmt {
            doc,
            expr,
            body,
            comment,
        }))
    }

    // --- types and names ------------------------------------------------

    // Type = [ "?" ] TypeName { "|" TypeName } .
    fn parse_type(&mut self) -> PResult<Type> {
        match self.try_parse_type()? {
            Some(ty) => Ok(ty),
            None => {
                let found = self.tok.to_string();
                Err(self.error(ParseErrorKind::ExpectedType { found }))
            }
        }
    }

    fn try_parse_type(&mut self) -> PResult<Option<Type>> {
        let nullable = match self.tok.kind {
            TokenKind::Qmark => {
                self.next()?;
                true
            }
            TokenKind::Ident | TokenKind::Backslash | TokenKind::Static => false,
            _ => return Ok(None),
        };
        let mut names = vec![self.parse_type_name()?];
        while self.got(TokenKind::Or)? {
            names.push(self.parse_type_name()?);
        }
        Ok(Some(Type { nullable, names }))
    }

    /// `static` is only valid as a return type but is accepted anywhere.
    fn parse_type_name(&mut self) -> PResult<Name> {
        if self.got(TokenKind::Static)? {
            return Ok(Name {
                parts: vec!["static".to_string()],
                global: false,
            });
        }
        self.parse_name()
    }

    // Name = [ "\\" ] ident { "\\" ident } .
    fn parse_name(&mut self) -> PResult<Name> {
        let global = self.got(TokenKind::Backslash)?;
        let mut parts = vec![self.expect(TokenKind::Ident)?];
        while self.got(TokenKind::Backslash)? {
            parts.push(self.expect(TokenKind::Ident)?);
        }
        Ok(Name { parts, global })
    }

    fn parse_name_list(&mut self) -> PResult<Vec<Name>> {
        let mut names = vec![self.parse_name()?];
        while self.got(TokenKind::Comma)? {
            names.push(self.parse_name()?);
        }
        Ok(names)
    }

    // --- expressions ----------------------------------------------------

    fn parse_expr(&mut self) -> PResult<Expr> {
        Ok(Expr::Unknown(self.parse_unknown_expr(false)?))
    }

    /// Expression inside parentheses, where `:` cannot end a case label.
    fn parse_nested_expr(&mut self) -> PResult<Expr> {
        Ok(Expr::Unknown(self.parse_unknown_expr(true)?))
    }

    // ConstExpr = ArrayLit | Name [ "::" name ] | [ "-" | "+" ] BasicLit .
    fn parse_const_expr(&mut self) -> PResult<Expr> {
        match self.tok.kind {
            TokenKind::Lbrack => {
                self.next()?;
                self.parse_array_lit(TokenKind::Rbrack, false)
            }
            TokenKind::Ident if self.tok.text.eq_ignore_ascii_case("array") => {
                self.next()?;
                if self.got(TokenKind::Lparen)? {
                    return self.parse_array_lit(TokenKind::Rparen, true);
                }
                // A constant or class named `array`.
                self.backup();
                self.parse_selector()
            }
            TokenKind::Ident | TokenKind::Backslash => self.parse_selector(),
            TokenKind::Sub | TokenKind::Add => {
                let sign = self.tok.clone();
                self.next()?;
                let lit = self.parse_lit_token()?;
                Ok(Expr::Unknown(UnknownExpr {
                    elems: vec![Elem::Token(sign), Elem::Token(lit)],
                }))
            }
            _ => self.parse_basic_lit(),
        }
    }

    fn parse_selector(&mut self) -> PResult<Expr> {
        let class = self.parse_name()?;
        if self.got(TokenKind::DoubleColon)? {
            let member = self.expect_word()?;
            return Ok(Expr::StaticSelector { class, member });
        }
        Ok(Expr::Name(class))
    }

    // ArrayLit = ( "[" | "array" "(" ) [ Elem { "," Elem } [ "," ] ] ( "]" | ")" ) .
    // Elem     = [ ConstExpr "=>" ] ConstExpr .
    fn parse_array_lit(&mut self, close: TokenKind, long: bool) -> PResult<Expr> {
        let mut elems = Vec::new();
        while !self.got(close)? {
            let first = self.parse_const_expr()?;
            let elem = if self.got(TokenKind::DoubleArrow)? {
                ArrayElem {
                    key: Some(first),
                    value: self.parse_const_expr()?,
                }
            } else {
                ArrayElem {
                    key: None,
                    value: first,
                }
            };
            elems.push(elem);
            if self.got(close)? {
                break;
            }
            self.expect(TokenKind::Comma)?;
        }
        Ok(Expr::Array(ArrayLit { long, elems }))
    }

    // BasicLit = string | int | float | ident .
    fn parse_basic_lit(&mut self) -> PResult<Expr> {
        Ok(Expr::Lit(self.parse_lit_token()?))
    }

    fn parse_lit_token(&mut self) -> PResult<Token> {
        match self.tok.kind {
            TokenKind::String | TokenKind::Int | TokenKind::Float | TokenKind::Ident => {
                let lit = self.tok.clone();
                self.next()?;
                Ok(lit)
            }
            kind => Err(self.error(ParseErrorKind::ExpectedLiteral {
                found: kind.to_string(),
            })),
        }
    }

    // FuncLit = "function" [ "&" ] ParamList [ "use" ParamList ] [ ":" Type ] BlockStmt .
    fn parse_func_lit(&mut self) -> PResult<FuncLit> {
        self.expect(TokenKind::Function)?;
        let by_ref = self.got(TokenKind::And)?;
        let params = self.parse_param_list()?;
        let uses = if self.got(TokenKind::Use)? {
            Some(self.parse_param_list()?)
        } else {
            None
        };
        let result = if self.got(TokenKind::Colon)? {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = self.parse_block0()?;
        Ok(FuncLit {
            by_ref,
            params,
            uses,
            result,
            body,
        })
    }

    /// `( ... )` kept with its inner whitespace. The whitespace after `)`
    /// is left for the caller.
    fn parse_paren(&mut self) -> PResult<UnknownExpr> {
        self.expect0(TokenKind::Lparen)?;
        if self.tok.kind == TokenKind::Rparen {
            self.next0()?;
            return Ok(UnknownExpr::default());
        }
        let inner = self.parse_unknown_expr(true)?;
        self.expect0(TokenKind::Rparen)?;
        Ok(inner)
    }

    /// `{ ... }` after `->` or a `match` subject; the current token is `{`.
    fn parse_braced(&mut self) -> PResult<UnknownExpr> {
        self.next0()?;
        if self.tok.kind == TokenKind::Rbrace {
            self.next0()?;
            return Ok(UnknownExpr::default());
        }
        let inner = self.parse_unknown_expr(true)?;
        self.expect0(TokenKind::Rbrace)?;
        Ok(inner)
    }

    // UnknownExpr = ExprElem { ExprElem } .
    // ExprElem    = any token | "(" [ UnknownExpr ] ")" | "->" ( name | "{" UnknownExpr "}" )
    //             | "::" any token | AnonymousClass | FuncLit .
    fn parse_unknown_expr(&mut self, nested: bool) -> PResult<UnknownExpr> {
        // `?` allows one more `:`; a `:` beyond that ends a case label.
        let mut colons = 0usize;
        let mut elems = Vec::new();
        loop {
            match self.tok.kind {
                TokenKind::Eof => return Err(self.expected(";, {, } or )")),
                TokenKind::Semicolon
                | TokenKind::Lbrace
                | TokenKind::Rbrace
                | TokenKind::Rparen
                | TokenKind::CloseTag => break,
                TokenKind::Colon if colons == 0 && !nested => break,
                TokenKind::Colon => {
                    colons = colons.saturating_sub(1);
                    self.push_token(&mut elems)?;
                }
                TokenKind::Qmark => {
                    colons += 1;
                    self.push_token(&mut elems)?;
                }
                TokenKind::Arrow | TokenKind::NullsafeArrow => {
                    elems.push(Elem::Token(self.tok.clone()));
                    self.next()?;
                    // Any token is a valid member name, keywords included:
                    // `$x->class`, `$x->list()`.
                    match self.tok.kind {
                        TokenKind::Lbrace => elems.push(Elem::Braced(self.parse_braced()?)),
                        TokenKind::Eof => return Err(self.expected("member name")),
                        _ => self.push_token(&mut elems)?,
                    }
                }
                TokenKind::DoubleColon => {
                    elems.push(Elem::Token(self.tok.clone()));
                    self.next()?;
                    // `Foo::class`
                    if self.tok.kind == TokenKind::Eof {
                        return Err(self.expected("member name"));
                    }
                    self.push_token(&mut elems)?;
                }
                TokenKind::Lparen => elems.push(Elem::Paren(self.parse_paren()?)),
                TokenKind::Class => {
                    let class = self.parse_class_decl(true)?;
                    elems.push(Elem::Class(Box::new(class)));
                }
                TokenKind::Function => {
                    let func = self.parse_func_lit()?;
                    elems.push(Elem::Func(Box::new(func)));
                }
                TokenKind::Match => {
                    self.push_token(&mut elems)?;
                    self.parse_match_tail(&mut elems)?;
                }
                TokenKind::Fn => {
                    self.push_token(&mut elems)?;
                    self.parse_arrow_fn_tail(&mut elems)?;
                }
                _ => self.push_token(&mut elems)?,
            }
        }
        if elems.is_empty() {
            return Err(self.error(ParseErrorKind::EmptyExpr));
        }
        Ok(UnknownExpr { elems })
    }

    /// `(subject) { arms }` after `match`.
    fn parse_match_tail(&mut self, elems: &mut Vec<Elem>) -> PResult<()> {
        if self.tok.kind == TokenKind::Whitespace {
            self.push_token(elems)?;
        }
        if self.tok.kind != TokenKind::Lparen {
            return Ok(());
        }
        elems.push(Elem::Paren(self.parse_paren()?));
        if self.tok.kind == TokenKind::Whitespace {
            self.push_token(elems)?;
        }
        if self.tok.kind == TokenKind::Lbrace {
            elems.push(Elem::Braced(self.parse_braced()?));
        }
        Ok(())
    }

    /// `[&] (params) [: [?] type]` after `fn`. The return type colon is
    /// not a case label end.
    fn parse_arrow_fn_tail(&mut self, elems: &mut Vec<Elem>) -> PResult<()> {
        for kind in [TokenKind::Whitespace, TokenKind::And, TokenKind::Whitespace] {
            if self.tok.kind == kind {
                self.push_token(elems)?;
            }
        }
        if self.tok.kind != TokenKind::Lparen {
            return Ok(());
        }
        elems.push(Elem::Paren(self.parse_paren()?));
        if self.tok.kind == TokenKind::Whitespace {
            self.push_token(elems)?;
        }
        if self.tok.kind != TokenKind::Colon {
            return Ok(());
        }
        self.push_token(elems)?;
        for kind in [TokenKind::Whitespace, TokenKind::Qmark] {
            if self.tok.kind == kind {
                self.push_token(elems)?;
            }
        }
        Ok(())
    }

    fn push_token(&mut self, elems: &mut Vec<Elem>) -> PResult<()> {
        elems.push(Elem::Token(self.tok.clone()));
        self.next0()
    }
}

const fn is_visibility(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Public | TokenKind::Protected | TokenKind::Private
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> File {
        match parse(input) {
            Ok(file) => file,
            Err(err) => panic!("{input:?}: {err}"),
        }
    }

    fn parse_err(input: &str) -> ParseError {
        parse(input).unwrap_err()
    }

    fn unknown(stmt: &Stmt) -> &UnknownStmt {
        match stmt {
            Stmt::Unknown(u) => u,
            other => panic!("expected unknown statement, got {other:?}"),
        }
    }

    fn texts(expr: &Expr) -> Vec<String> {
        let Expr::Unknown(x) = expr else {
            panic!("expected unknown expression, got {expr:?}")
        };
        x.elems
            .iter()
            .map(|e| match e {
                Elem::Token(t) => t.text.clone(),
                Elem::Paren(_) => "(...)".into(),
                Elem::Braced(_) => "{...}".into(),
                Elem::Class(_) => "class".into(),
                Elem::Func(_) => "function".into(),
            })
            .collect()
    }

    #[test]
    fn header_sections() {
        let file = parse_ok(
            "<?php\ndeclare(strict_types=1);\nnamespace App\\Http;\nuse Foo\\Bar as Baz; // b\nuse function strlen;\necho 1;\n",
        );
        assert_eq!(file.pragmas.len(), 1);
        assert_eq!(file.pragmas[0].name, "strict_types");
        assert_eq!(file.namespace.unwrap().parts, vec!["App", "Http"]);
        assert_eq!(file.uses.len(), 2);
        assert_eq!(file.uses[0].alias.as_deref(), Some("Baz"));
        assert_eq!(file.uses[0].comment.as_deref(), Some("// b"));
        assert_eq!(file.uses[1].kind, UseKind::Function);
        assert_eq!(file.stmts.len(), 1);
    }

    #[test]
    fn spaced_names() {
        let file = parse_ok("<?php namespace Dubax\\     Asistent   \\Laboratory;");
        assert_eq!(
            file.namespace.unwrap().parts,
            vec!["Dubax", "Asistent", "Laboratory"]
        );
    }

    #[test]
    fn class_members() {
        let file = parse_ok(
            "<?php\nabstract class A extends B implements C, \\D {\n use T;\n const X = 1; // x\n protected static ?int $n = 0;\n /** @return static */\n abstract public function f(): static;\n}\n",
        );
        let Stmt::Decl(Decl {
            kind: DeclKind::Class(class),
            ..
        }) = &file.stmts[0]
        else {
            panic!("expected class");
        };
        assert_eq!(class.name.as_deref(), Some("A"));
        assert_eq!(class.inheritance, Some(Inheritance::Abstract));
        assert_eq!(class.implements.len(), 2);
        assert!(class.implements[1].global);
        assert_eq!(class.traits.len(), 1);
        assert_eq!(class.members.len(), 3);
        let Member::Decl(method) = &class.members[2] else {
            panic!("expected method");
        };
        assert!(method.decl.doc.is_some());
        assert_eq!(method.modifiers.visibility, Visibility::Public);
        assert_eq!(method.modifiers.inheritance, Some(Inheritance::Abstract));
        let DeclKind::Func(func) = &method.decl.kind else {
            panic!("expected function");
        };
        assert!(func.body.is_none());
    }

    #[test]
    fn default_visibility_is_kept() {
        let file = parse_ok("<?php class A { function f() {} }");
        let Stmt::Decl(Decl {
            kind: DeclKind::Class(class),
            ..
        }) = &file.stmts[0]
        else {
            panic!("expected class");
        };
        let Member::Decl(m) = &class.members[0] else {
            panic!("expected member");
        };
        assert_eq!(m.modifiers.visibility, Visibility::Default);
    }

    #[test]
    fn modifier_errors() {
        let err = parse_err("<?php class A { public public $x; }");
        assert_eq!(err.kind, ParseErrorKind::DuplicateModifier(TokenKind::Public));
        let err = parse_err("<?php class A { public private $x; }");
        assert_eq!(
            err.kind,
            ParseErrorKind::ConflictingModifiers(TokenKind::Public, TokenKind::Private)
        );
        let err = parse_err("<?php class A { static const X = 1; }");
        assert_eq!(
            err.kind,
            ParseErrorKind::ModifierNotAllowed {
                modifier: TokenKind::Static,
                target: "constant"
            }
        );
        let err = parse_err("<?php class A { final abstract function f(); }");
        assert_eq!(
            err.kind,
            ParseErrorKind::ConflictingModifiers(TokenKind::Final, TokenKind::Abstract)
        );
    }

    #[test]
    fn case_and_ternary_colons() {
        let file = parse_ok("<?php switch ($x) { case $a ? 1 : 2: foo(); default: bar(); }");
        let Stmt::Switch(sw) = &file.stmts[0] else {
            panic!("expected switch");
        };
        assert_eq!(sw.body.stmts.len(), 4);
        let Stmt::Case(label) = &sw.body.stmts[0] else {
            panic!("expected case label");
        };
        let value = label.value.as_ref().unwrap();
        assert_eq!(texts(value), vec!["$a", " ", "?", " ", "1", " ", ":", " ", "2"]);
        assert!(matches!(&sw.body.stmts[2], Stmt::Case(CaseLabel { value: None })));
    }

    #[test]
    fn arrow_takes_keywords() {
        let file = parse_ok("<?php $x->class->list(); Foo::class;");
        assert_eq!(
            texts(&unknown(&file.stmts[0]).expr),
            vec!["$x", "->", "class", "->", "list", "(...)"]
        );
        assert_eq!(texts(&unknown(&file.stmts[1]).expr), vec!["Foo", "::", "class"]);
    }

    #[test]
    fn computed_member_access() {
        let file = parse_ok("<?php $x->{$name}();");
        let texts = texts(&unknown(&file.stmts[0]).expr);
        assert_eq!(texts, vec!["$x", "->", "{...}", "(...)"]);
    }

    #[test]
    fn closures_and_anonymous_classes() {
        let file = parse_ok(
            "<?php $f = function ($a) use (&$b): int { return 1; }; $o = new class($a) extends B { };",
        );
        assert!(texts(&unknown(&file.stmts[0]).expr).contains(&"function".to_string()));
        let Expr::Unknown(x) = &unknown(&file.stmts[1]).expr else {
            panic!()
        };
        let Some(Elem::Class(class)) = x.elems.last() else {
            panic!("expected anonymous class");
        };
        assert!(class.name.is_none());
        assert!(class.args.is_some());
    }

    #[test]
    fn statement_level_closure() {
        let file = parse_ok("<?php function () {};\nfunction named() {}\n");
        assert!(matches!(&file.stmts[0], Stmt::Unknown(_)));
        assert!(matches!(
            &file.stmts[1],
            Stmt::Decl(Decl {
                kind: DeclKind::Func(_),
                ..
            })
        ));
    }

    #[test]
    fn match_expression() {
        let file = parse_ok("<?php $x = match ($y) { 1, 2 => 'a', default => 'b' };");
        let texts = texts(&unknown(&file.stmts[0]).expr);
        assert_eq!(texts[texts.len() - 3..], ["(...)", " ", "{...}"]);
    }

    #[test]
    fn named_arguments() {
        parse_ok("<?php foo(name: $x, other: $y ? 1 : 2);");
    }

    #[test]
    fn trailing_comments() {
        let file = parse_ok("<?php foo(); // same line\nbar();\n// own line\n");
        assert_eq!(unknown(&file.stmts[0]).comment.as_deref(), Some("// same line"));
        assert_eq!(unknown(&file.stmts[1]).comment, None);
        assert_eq!(file.stmts[2], Stmt::Comment("// own line".into()));
    }

    #[test]
    fn markup_sections() {
        let file = parse_ok("<?php if ($x) { ?><b>hi</b><?php } ?>\n");
        let Stmt::If(stmt) = &file.stmts[0] else {
            panic!("expected if");
        };
        let Stmt::Block(block) = stmt.then.as_ref() else {
            panic!("expected block");
        };
        assert_eq!(
            block.stmts[0],
            Stmt::Markup(Markup {
                text: "<b>hi</b>".into(),
                reopen: true
            })
        );
        assert_eq!(
            file.stmts[1],
            Stmt::Markup(Markup {
                text: "\n".into(),
                reopen: false
            })
        );
    }

    #[test]
    fn try_catch_finally() {
        let file = parse_ok("<?php try { a(); } catch (A | B $e) { b(); } finally { c(); }");
        let Stmt::Try(t) = &file.stmts[0] else {
            panic!("expected try");
        };
        assert_eq!(t.catches.len(), 1);
        assert!(t.finally.is_some());
    }

    #[test]
    fn param_lists() {
        let file = parse_ok(
            "<?php function f(\n\t?Foo $a = null,\n\tint|string &...$b,\n\tprivate readonly array $c = ['k' => -1, array(X::Y)],\n) {}",
        );
        let Stmt::Decl(Decl {
            kind: DeclKind::Func(func),
            ..
        }) = &file.stmts[0]
        else {
            panic!("expected function");
        };
        assert!(func.params.multiline);
        let params = &func.params.params;
        assert_eq!(params.len(), 3);
        assert!(params[0].ty.as_ref().unwrap().nullable);
        assert_eq!(params[1].ty.as_ref().unwrap().names.len(), 2);
        assert!(params[1].by_ref && params[1].variadic);
        assert_eq!(params[2].visibility, Visibility::Private);
        assert!(params[2].readonly);
        let Some(Expr::Array(arr)) = &params[2].default else {
            panic!("expected array default");
        };
        assert!(!arr.long);
        assert_eq!(arr.elems.len(), 2);
        assert!(matches!(arr.elems[1].value, Expr::Array(ArrayLit { long: true, .. })));
    }

    #[test]
    fn doc_comment_placement() {
        let file = parse_ok("<?php\n/** @var int */\n$x = 1;\n/** file */\n\n/** f */\nfunction f() {}\n");
        assert!(unknown(&file.stmts[0]).doc.is_some());
        assert_eq!(file.stmts[1], Stmt::Comment("/** file */".into()));
        assert!(matches!(&file.stmts[2], Stmt::Decl(Decl { doc: Some(_), .. })));

        let err = parse_err("<?php /** x */ if ($a) {}");
        assert_eq!(
            err.kind,
            ParseErrorKind::AfterDocComment {
                found: "if".into()
            }
        );
    }

    #[test]
    fn backup_restores_previous_token() {
        let mut p = Parser::new("<?php a  b");
        p.next0().unwrap();
        p.next().unwrap();
        assert_eq!(p.tok.text, "a");
        p.next().unwrap();
        assert_eq!(p.tok.text, "b");
        p.backup();
        assert_eq!(p.tok.text, "a");
        p.next0().unwrap();
        assert_eq!(p.tok.text, "b");
    }

    #[test]
    #[should_panic(expected = "cannot back up twice")]
    fn double_backup_panics() {
        let mut p = Parser::new("<?php a b");
        p.next0().unwrap();
        p.next().unwrap();
        p.next().unwrap();
        p.backup();
        p.backup();
    }

    #[test]
    fn first_error_wins() {
        let mut p = Parser::new("<?php");
        let first = p.error(ParseErrorKind::EmptyExpr);
        let second = p.error(ParseErrorKind::ExpectedLiteral { found: "x".into() });
        assert_eq!(first, second);
        assert_eq!(p.tok.kind, TokenKind::Eof);
    }
    #[test]
    fn error_messages() {
        let cases = [
            ("   ", "expecting <?php, found InlineHtml(\"   \")", 1, 1),
            ("<?php function a(", "expecting ), found EOF", 1, 18),
            ("<?php class a{", "expecting }, found EOF", 1, 15),
            ("<?php function a($x=,", "unexpected ,, expecting literal", 1, 21),
            ("<?php foo()", "expecting ;, {, } or ), found EOF", 1, 12),
            ("<?php ;", "unexpected empty expression", 1, 7),
            ("<?php class A { $x }", "expecting ;, found }", 1, 20),
        ];
        for (input, message, line, column) in cases {
            let err = parse_err(input);
            assert_eq!(err.kind.to_string(), message, "{input:?}");
            assert_eq!((err.line(), err.column()), (line, column), "{input:?}");
        }
    }

    #[test]
    fn doc_error_positions_are_absolute() {
        let err = parse_err("<?php\n   /** @var */");
        assert_eq!(err.to_string(), "parsing doc comment: expecting type, found */ at line 2, column 13");

        let err = parse_err("<?php\n  /**\n   * @param\n   */\nfunction f() {}");
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn scan_errors_surface() {
        let err = parse_err("<?php $x = 'open");
        assert!(matches!(err.kind, ParseErrorKind::Lex(_)));
    }

    #[test]
    fn doc_before_case_label_is_a_comment() {
        let file = parse_ok("<?php switch ($a) { case 1: f(); /** fall through */ default: break; }");
        let Stmt::Switch(sw) = &file.stmts[0] else {
            panic!("expected switch");
        };
        assert!(matches!(&sw.body.stmts[2], Stmt::Comment(c) if c == "/** fall through */"));
        assert!(matches!(&sw.body.stmts[3], Stmt::Case(CaseLabel { value: None })));
    }

    #[test]
    fn arrow_fn_return_type() {
        let file = parse_ok("<?php $f = fn($x): ?int => $x;");
        assert_eq!(
            texts(&unknown(&file.stmts[0]).expr),
            vec!["$f", " ", "=", " ", "fn", "(...)", ":", " ", "?", "int", " ", "=>", " ", "$x"]
        );
        let file = parse_ok("<?php switch ($a) { case fn(): int => 1: break; }");
        let Stmt::Switch(sw) = &file.stmts[0] else {
            panic!("expected switch");
        };
        assert!(matches!(&sw.body.stmts[0], Stmt::Case(_)));
    }

    #[test]
    fn closure_keeps_following_whitespace() {
        let file = parse_ok("<?php $x = $y ? function () { return 1; } : null;");
        let texts = texts(&unknown(&file.stmts[0]).expr);
        assert_eq!(texts[texts.len() - 5..], ["function", " ", ":", " ", "null"]);
    }
}
